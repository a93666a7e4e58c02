//! This module provides the AssignedEnzymeMap, the handoff between enzyme assignment and
//! database extraction
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pattern a valid enzyme (E.C.) number must match
pub static EC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("valid enzyme number regex"));

/// Unanchored version of [`EC_PATTERN`] for finding enzyme numbers inside free text
pub static EC_SEARCH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid enzyme number regex"));

/// Check whether a string is a complete enzyme number, e.g. `1.1.1.1`
pub fn is_enzyme_number(candidate: &str) -> bool {
    EC_PATTERN.is_match(candidate)
}

/// Mapping of enzyme numbers to the genes (or proteins) they were assigned to
///
/// Keys are always validated against [`EC_PATTERN`] and values are never empty. Once the
/// enzyme assignment stage has finished, the map is handed to the extraction stage behind an
/// `Rc` and is never mutated again.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, Vec<String>>", into = "IndexMap<String, Vec<String>>")]
pub struct AssignedEnzymeMap {
    store: IndexMap<String, Vec<String>>,
}

impl AssignedEnzymeMap {
    /// Create a new, empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an enzyme number with its gene ids, replacing any previous entry
    ///
    /// # Examples
    /// ```rust
    /// use metronome_core::metabolic_model::enzyme::AssignedEnzymeMap;
    /// let mut enzymes = AssignedEnzymeMap::new();
    /// enzymes.insert("1.1.1.1", vec!["Rv0001".to_string()]).unwrap();
    /// assert_eq!(enzymes.get("1.1.1.1").unwrap(), &vec!["Rv0001".to_string()]);
    /// assert!(enzymes.insert("1.1.1", vec!["Rv0001".to_string()]).is_err());
    /// ```
    pub fn insert(&mut self, enzyme: &str, genes: Vec<String>) -> Result<(), EnzymeMapError> {
        Self::validate_enzyme(enzyme)?;
        Self::validate_genes(enzyme, &genes)?;
        self.store.insert(enzyme.to_string(), genes);
        Ok(())
    }

    /// Add a single gene to an enzyme number, creating the entry if it doesn't exist yet
    pub fn append_gene(&mut self, enzyme: &str, gene: &str) -> Result<(), EnzymeMapError> {
        Self::validate_enzyme(enzyme)?;
        Self::validate_genes(enzyme, std::slice::from_ref(&gene.to_string()))?;
        match self.store.get_mut(enzyme) {
            Some(genes) => genes.push(gene.to_string()),
            None => {
                self.store.insert(enzyme.to_string(), vec![gene.to_string()]);
            }
        }
        Ok(())
    }

    /// Get the genes assigned to an enzyme number
    pub fn get(&self, enzyme: &str) -> Option<&Vec<String>> {
        self.store.get(enzyme)
    }

    pub fn contains(&self, enzyme: &str) -> bool {
        self.store.contains_key(enzyme)
    }

    /// Iterate over the enzyme numbers in assignment order
    pub fn enzymes(&self) -> impl Iterator<Item = &String> {
        self.store.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn validate_enzyme(enzyme: &str) -> Result<(), EnzymeMapError> {
        if is_enzyme_number(enzyme) {
            Ok(())
        } else {
            Err(EnzymeMapError::InvalidEnzymeNumber(enzyme.to_string()))
        }
    }

    fn validate_genes(enzyme: &str, genes: &[String]) -> Result<(), EnzymeMapError> {
        if genes.is_empty() || genes.iter().any(|g| g.is_empty()) {
            return Err(EnzymeMapError::InvalidGenes(enzyme.to_string()));
        }
        Ok(())
    }
}

impl TryFrom<IndexMap<String, Vec<String>>> for AssignedEnzymeMap {
    type Error = EnzymeMapError;

    fn try_from(value: IndexMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        let mut enzymes = AssignedEnzymeMap::new();
        for (enzyme, genes) in value {
            enzymes.insert(&enzyme, genes)?;
        }
        Ok(enzymes)
    }
}

impl From<AssignedEnzymeMap> for IndexMap<String, Vec<String>> {
    fn from(value: AssignedEnzymeMap) -> Self {
        value.store
    }
}

/// Errors raised when building an AssignedEnzymeMap
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EnzymeMapError {
    #[error("Keys of the assigned enzyme map must be valid E.C. numbers, found {0:?}")]
    InvalidEnzymeNumber(String),
    #[error("Genes assigned to {0} must be a non-empty list of non-empty ids")]
    InvalidGenes(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_read_back() {
        let mut enzymes = AssignedEnzymeMap::new();
        let genes = vec!["Rv0001".to_string(), "Rv0002".to_string()];
        enzymes.insert("2.7.1.1", genes.clone()).unwrap();
        assert_eq!(enzymes.get("2.7.1.1"), Some(&genes));
        assert_eq!(enzymes.len(), 1);
    }

    #[test]
    fn reject_bad_enzyme_numbers() {
        let mut enzymes = AssignedEnzymeMap::new();
        for bad in ["1.1.1", "1.1.1.-", "EC 1.1.1.1", "1.1.1.1a", ""] {
            match enzymes.insert(bad, vec!["g".to_string()]) {
                Err(EnzymeMapError::InvalidEnzymeNumber(key)) => assert_eq!(key, bad),
                _ => panic!("Invalid enzyme number {bad:?} accepted"),
            }
        }
        assert!(enzymes.is_empty());
    }

    #[test]
    fn reject_empty_gene_lists() {
        let mut enzymes = AssignedEnzymeMap::new();
        assert_eq!(
            enzymes.insert("1.1.1.1", vec![]),
            Err(EnzymeMapError::InvalidGenes("1.1.1.1".to_string()))
        );
        assert!(enzymes.insert("1.1.1.1", vec![String::new()]).is_err());
    }

    #[test]
    fn append_gene_creates_then_extends() {
        let mut enzymes = AssignedEnzymeMap::new();
        enzymes.append_gene("1.1.1.1", "p1").unwrap();
        enzymes.append_gene("1.1.1.1", "p2").unwrap();
        enzymes.append_gene("4.2.1.11", "p1").unwrap();
        assert_eq!(enzymes.get("1.1.1.1").unwrap(), &vec!["p1".to_string(), "p2".to_string()]);
        let order: Vec<&String> = enzymes.enzymes().collect();
        assert_eq!(order, vec!["1.1.1.1", "4.2.1.11"]);
    }

    #[test]
    fn json_loading_validates_keys() {
        let good = r#"{"1.1.1.1": ["p1"], "2.7.1.1": ["p2", "p3"]}"#;
        let enzymes: AssignedEnzymeMap = serde_json::from_str(good).unwrap();
        assert_eq!(enzymes.len(), 2);
        let written = serde_json::to_string(&enzymes).unwrap();
        assert_eq!(written, r#"{"1.1.1.1":["p1"],"2.7.1.1":["p2","p3"]}"#);

        let bad = r#"{"not-an-ec": ["p1"]}"#;
        assert!(serde_json::from_str::<AssignedEnzymeMap>(bad).is_err());
    }
}
