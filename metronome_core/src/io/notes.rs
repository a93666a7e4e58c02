//! Encoding of reaction and metabolite metadata as `KEY: VALUE` note paragraphs
use indexmap::IndexMap;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

pub const ENZYME: &str = "ENZYME";
pub const GENE_ASSOCIATION: &str = "GENE_ASSOCIATION";
pub const PATHWAY: &str = "PATHWAY";
pub const SUBSYSTEM: &str = "SUBSYSTEM";
pub const CHARGE: &str = "CHARGE";
pub const FORMULA: &str = "FORMULA";
pub const INCHI: &str = "INCHI";
pub const INCHIKEY: &str = "INCHIKEY";
pub const SMILES: &str = "SMILES";

/// Separator between the values of a multi-valued note
pub const LIST_SEPARATOR: &str = ", ";

/// Collect note paragraphs into a {key: value} map
///
/// Each paragraph is split at its first `:` and both parts are trimmed, so a note with an
/// empty value keeps its key; paragraphs without a `:` are ignored.
///
/// # Examples
/// ```rust
/// use metronome_core::io::notes::notes_to_map;
/// let notes = notes_to_map(["ENZYME: 1.1.1.1, 1.1.1.2", "KEGG: R00001", "GENE_ASSOCIATION:", "free text"]);
/// assert_eq!(notes["KEGG"], "R00001");
/// assert_eq!(notes["GENE_ASSOCIATION"], "");
/// assert_eq!(notes.len(), 3);
/// ```
pub fn notes_to_map<I, S>(paragraphs: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut notes = IndexMap::new();
    for paragraph in paragraphs {
        if let Some((key, value)) = paragraph.as_ref().split_once(':') {
            notes.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    notes
}

/// Split a multi-valued note back into its values
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Note paragraphs describing a metabolite, unknown values are left out
pub fn metabolite_notes(metabolite: &Metabolite) -> Vec<String> {
    let mut notes = Vec::new();
    let known = [
        (CHARGE, &metabolite.charge),
        (FORMULA, &metabolite.formula),
        (INCHI, &metabolite.inchi),
        (INCHIKEY, &metabolite.inchikey),
        (SMILES, &metabolite.smiles),
    ];
    for (key, value) in known {
        if let Some(value) = value {
            notes.push(format!("{}: {}", key, value));
        }
    }
    for (db, link) in &metabolite.db_links {
        notes.push(format!("{}: {}", db, link));
    }
    notes
}

/// Note paragraphs describing a reaction
pub fn reaction_notes(reaction: &Reaction) -> Vec<String> {
    let mut notes = vec![format!("{}: {}", ENZYME, reaction.enzymes.join(LIST_SEPARATOR))];
    if !reaction.pathways.is_empty() {
        notes.push(format!("{}: {}", PATHWAY, reaction.pathways.join(LIST_SEPARATOR)));
    }
    notes.push(format!(
        "{}: {}",
        GENE_ASSOCIATION,
        reaction.genes.join(LIST_SEPARATOR)
    ));
    for (db, link) in &reaction.db_links {
        notes.push(format!("{}: {}", db, link));
    }
    notes
}

/// Whether a reaction note key carries metadata rather than a database link
pub fn is_reaction_metadata(key: &str) -> bool {
    matches!(key, ENZYME | GENE_ASSOCIATION | PATHWAY | SUBSYSTEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metabolite_fields_are_suppressed() {
        let met = Metabolite::builder()
            .id("C00001")
            .name(vec!["H2O".to_string()])
            .formula(Some("H2O".to_string()))
            .db_links(IndexMap::from([("KEGG".to_string(), "C00001".to_string())]))
            .build()
            .unwrap();
        assert_eq!(metabolite_notes(&met), vec!["FORMULA: H2O", "KEGG: C00001"]);
    }

    #[test]
    fn reaction_notes_round_trip() {
        let reaction = Reaction::builder()
            .id("R00001")
            .name(vec!["R00001".to_string()])
            .enzymes(vec!["3.6.1.10".to_string(), "3.6.1.11".to_string()])
            .genes(vec!["g1".to_string(), "g2".to_string()])
            .db_links(IndexMap::from([
                ("KEGG".to_string(), "R00001".to_string()),
                ("RHEA".to_string(), "24578".to_string()),
            ]))
            .build()
            .unwrap();
        let paragraphs = reaction_notes(&reaction);
        assert_eq!(paragraphs[0], "ENZYME: 3.6.1.10, 3.6.1.11");
        assert_eq!(paragraphs[1], "GENE_ASSOCIATION: g1, g2");
        let notes = notes_to_map(&paragraphs);
        assert_eq!(split_list(&notes[ENZYME]), reaction.enzymes);
        assert_eq!(notes["RHEA"], "24578");
        assert!(!notes.contains_key(PATHWAY));
        let links: Vec<&String> = notes.keys().filter(|k| !is_reaction_metadata(k)).collect();
        assert_eq!(links, vec!["KEGG", "RHEA"]);
    }

    #[test]
    fn empty_gene_association() {
        // XML text is trimmed on read, so the separator's space is gone
        let notes = notes_to_map(["GENE_ASSOCIATION:", "ENZYME: "]);
        assert_eq!(notes[GENE_ASSOCIATION], "");
        assert_eq!(notes[ENZYME], "");
        assert!(split_list(&notes[GENE_ASSOCIATION]).is_empty());
    }

    #[test]
    fn values_may_contain_colons() {
        let notes = notes_to_map(["INCHI: InChI=1S/H2O/h1H2", "SMILES: [O:1]"]);
        assert_eq!(notes[SMILES], "[O:1]");
        assert_eq!(notes[INCHI], "InChI=1S/H2O/h1H2");
    }
}
