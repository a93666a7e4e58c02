//! This module provides the metabolite struct representing a metabolite

use std::hash::Hash;

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::default_compartment;

/// Represents a metabolite extracted from one source
///
/// Unknown chemistry is represented by `None` rather than a placeholder string.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Metabolite {
    /// Source-local id of the metabolite (must be non-empty)
    #[builder(setter(into))]
    pub id: String,
    /// Display names, the first one is used as the primary name
    pub name: Vec<String>,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Electrical charge of the Metabolite, as reported by the source
    #[builder(default = "None")]
    pub charge: Option<String>,
    #[builder(default = "None")]
    pub inchi: Option<String>,
    #[builder(default = "None")]
    pub inchikey: Option<String>,
    #[builder(default = "None")]
    pub smiles: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(setter(into), default = "default_compartment()")]
    pub compartment: String,
    /// Links to other databases, {database name: external id}
    #[builder(default = "IndexMap::new()")]
    pub db_links: IndexMap<String, String>,
}

impl Metabolite {
    /// Start building a new metabolite
    ///
    /// # Examples
    /// ```rust
    /// use metronome_core::metabolic_model::metabolite::Metabolite;
    /// let water = Metabolite::builder()
    ///     .id("C00001")
    ///     .name(vec!["H2O".to_string()])
    ///     .formula(Some("H2O".to_string()))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(water.compartment, "Intracellular");
    /// ```
    pub fn builder() -> MetaboliteBuilder {
        MetaboliteBuilder::default()
    }

    /// Primary display name
    pub fn primary_name(&self) -> &str {
        self.name.first().map(String::as_str).unwrap_or(&self.id)
    }
}

impl MetaboliteBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref id) = self.id {
            if id.is_empty() {
                return Err("Metabolite ID must be a non-empty string".to_string());
            }
        }
        if let Some(ref name) = self.name {
            if name.is_empty() || name.iter().any(String::is_empty) {
                return Err("Metabolite name must be a non-empty list of non-empty strings".to_string());
            }
        }
        if let Some(ref compartment) = self.compartment {
            if compartment.is_empty() {
                return Err("Metabolite compartment must be a non-empty string".to_string());
            }
        }
        Ok(())
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // Hash by id
        self.compartment.hash(state)
    }
}
