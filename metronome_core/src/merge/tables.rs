//! The MetaNetX cross-reference and property tables
//!
//! All four tables are tab separated, `#` starts a comment line.
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use log::{info, warn};

use crate::configuration::Configuration;
use crate::io::rest::RestClient;
use crate::merge::MergeError;

/// Where a database-local id points to
#[derive(Clone, Debug, PartialEq)]
pub struct CrossReference {
    /// Canonical (MetaNetX) id
    pub canonical: String,
    /// Database tag the local id came with, e.g. `kegg`
    pub db: String,
}

/// Mapping of database-local ids to canonical ids
#[derive(Clone, Debug, Default)]
pub struct XrefTable {
    entries: IndexMap<String, CrossReference>,
    by_canonical: IndexMap<String, Vec<String>>,
}

impl XrefTable {
    /// Parse an xref table
    ///
    /// Rows mentioning `deprecated`, rows whose first field has no `db:` prefix and rows with
    /// fewer than two fields are skipped. A local id listed twice keeps its last row.
    ///
    /// # Examples
    /// ```rust
    /// use metronome_core::merge::tables::XrefTable;
    /// let xref = XrefTable::parse("#source\tid\nkegg:C00001\tMNXM1\nMNXM1\tMNXM1\n");
    /// let water = xref.get("C00001").unwrap();
    /// assert_eq!(water.canonical, "MNXM1");
    /// assert_eq!(water.db, "kegg");
    /// assert_eq!(xref.len(), 1);
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut table = XrefTable::default();
        for record in rows(text) {
            if record.iter().any(|f| f.contains("deprecated")) {
                continue;
            }
            let (Some(source), Some(canonical)) = (record.get(0), record.get(1)) else {
                continue;
            };
            let Some((db, local)) = source.trim().split_once(':') else {
                continue;
            };
            let canonical = canonical.trim();
            if local.is_empty() || canonical.is_empty() {
                continue;
            }
            table.insert(local, canonical, db);
        }
        table
    }

    fn insert(&mut self, local: &str, canonical: &str, db: &str) {
        self.entries.insert(
            local.to_string(),
            CrossReference {
                canonical: canonical.to_string(),
                db: db.to_string(),
            },
        );
        self.by_canonical
            .entry(canonical.to_string())
            .or_default()
            .push(local.to_string());
    }

    pub fn get(&self, local_id: &str) -> Option<&CrossReference> {
        self.entries.get(local_id)
    }

    /// Canonical id of a local id
    pub fn canonical(&self, local_id: &str) -> Option<&str> {
        self.get(local_id).map(|x| x.canonical.as_str())
    }

    /// Links of a canonical id, {upper-cased database tag: local id}
    pub fn db_links(&self, canonical: &str) -> IndexMap<String, String> {
        let mut links = IndexMap::new();
        for local in self.by_canonical.get(canonical).into_iter().flatten() {
            // Skip local ids that were later remapped to another canonical id
            if let Some(xref) = self.entries.get(local).filter(|x| x.canonical == canonical) {
                links.insert(xref.db.to_uppercase(), local.clone());
            }
        }
        links
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A row of the reaction property table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReactionProperties {
    pub equation: Option<String>,
    pub description: Option<String>,
    pub balance: Option<String>,
    pub ec: Option<String>,
    pub source: Option<String>,
}

/// A row of the chemical property table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChemicalProperties {
    pub description: Option<String>,
    pub formula: Option<String>,
    pub charge: Option<String>,
    pub mass: Option<String>,
    pub inchi: Option<String>,
    pub smiles: Option<String>,
    pub source: Option<String>,
    pub inchikey: Option<String>,
}

/// Parse the reaction property table, {canonical id: properties}
pub fn parse_reaction_properties(text: &str) -> IndexMap<String, ReactionProperties> {
    property_rows(text)
        .map(|(id, record)| {
            let properties = ReactionProperties {
                equation: column(&record, 1),
                description: column(&record, 2),
                balance: column(&record, 3),
                ec: column(&record, 4),
                source: column(&record, 5),
            };
            (id, properties)
        })
        .collect()
}

/// Parse the chemical property table, {canonical id: properties}
pub fn parse_chemical_properties(text: &str) -> IndexMap<String, ChemicalProperties> {
    property_rows(text)
        .map(|(id, record)| {
            let properties = ChemicalProperties {
                description: column(&record, 1),
                formula: column(&record, 2),
                charge: column(&record, 3),
                mass: column(&record, 4),
                inchi: column(&record, 5),
                smiles: column(&record, 6),
                source: column(&record, 7),
                inchikey: column(&record, 8),
            };
            (id, properties)
        })
        .collect()
}

/// The four tables a merge resolves identities with
#[derive(Clone, Debug, Default)]
pub struct CanonicalTables {
    pub reaction_xref: XrefTable,
    pub reaction_properties: IndexMap<String, ReactionProperties>,
    pub chemical_xref: XrefTable,
    pub chemical_properties: IndexMap<String, ChemicalProperties>,
}

impl CanonicalTables {
    /// Fetch and parse every table from the urls in `configuration`
    pub fn load(client: &dyn RestClient, configuration: &Configuration) -> Result<Self, MergeError> {
        let fetch = |table: &'static str, url: &str| {
            info!("Loading {} from {}", table, url);
            client
                .get_text(url)
                .map_err(|source| MergeError::UnableToLoad { table, source })
        };
        let tables = CanonicalTables {
            reaction_xref: XrefTable::parse(&fetch(
                "reaction xrefs",
                &configuration.metanetx_reaction_xref_url,
            )?),
            reaction_properties: parse_reaction_properties(&fetch(
                "reaction properties",
                &configuration.metanetx_reaction_properties_url,
            )?),
            chemical_xref: XrefTable::parse(&fetch(
                "chemical xrefs",
                &configuration.metanetx_chemical_xref_url,
            )?),
            chemical_properties: parse_chemical_properties(&fetch(
                "chemical properties",
                &configuration.metanetx_chemical_properties_url,
            )?),
        };
        info!(
            "Loaded {} reaction xrefs, {} reactions, {} chemical xrefs and {} chemicals",
            tables.reaction_xref.len(),
            tables.reaction_properties.len(),
            tables.chemical_xref.len(),
            tables.chemical_properties.len()
        );
        Ok(tables)
    }
}

fn rows(text: &str) -> impl Iterator<Item = StringRecord> + '_ {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes())
        .into_records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                None
            }
        })
}

/// Rows with an id and at least the first property column
fn property_rows(text: &str) -> impl Iterator<Item = (String, StringRecord)> + '_ {
    rows(text).filter_map(|record| {
        let id = record.get(0)?.trim().to_string();
        if id.is_empty() || record.len() < 2 {
            return None;
        }
        Some((id, record))
    })
}

fn column(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
