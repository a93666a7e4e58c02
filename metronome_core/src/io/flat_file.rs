//! Parser for KEGG style flat-file records
//!
//! A record line holds the field name in its first 12 columns and the value after them.
//! Lines starting with a space continue the current field.
use indexmap::IndexMap;

const VALUE_COLUMN: usize = 12;

/// A parsed flat-file record, {field name: value lines}
pub type FlatFileEntry = IndexMap<String, Vec<String>>;

/// Parse a flat-file record into its fields
///
/// # Examples
/// ```rust
/// use metronome_core::io::flat_file::parse_flat_file;
/// let entry = parse_flat_file("ENTRY       C00001                      Compound\nNAME        H2O;\n            Water\n///\n");
/// assert_eq!(entry["NAME"], vec!["H2O;", "Water"]);
/// ```
pub fn parse_flat_file(text: &str) -> FlatFileEntry {
    let mut entry = FlatFileEntry::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(' ') {
            // Continuation of the current field
            if let Some(field) = current.as_ref().and_then(|f| entry.get_mut(f)) {
                field.push(value_of(line));
            }
            continue;
        }
        let field = line.split(' ').next().unwrap_or_default().to_string();
        entry.insert(field.clone(), vec![value_of(line)]);
        current = Some(field);
    }
    entry
}

/// First line of a field, if the record has it
pub fn first_value<'e>(entry: &'e FlatFileEntry, field: &str) -> Option<&'e str> {
    entry
        .get(field)
        .and_then(|lines| lines.first())
        .map(String::as_str)
}

fn value_of(line: &str) -> String {
    line.get(VALUE_COLUMN..)
        .unwrap_or_default()
        .trim_end()
        .to_string()
}
