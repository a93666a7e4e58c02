//! This module provides a struct for representing reactions
use std::rc::Rc;

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::metabolic_model::metabolite::Metabolite;

/// Represents a reaction extracted from one source
///
/// A reaction only ever grows after it is created: when another enzyme number turns out to
/// catalyse the same reaction, the enzyme and its genes are appended with
/// [`Reaction::merge_enzyme_association`].
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Reaction {
    /// Source-local id of the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Human-readable reaction names
    pub name: Vec<String>,
    /// Substrates keyed by metabolite id
    #[builder(default = "IndexMap::new()")]
    pub substrates: IndexMap<String, Rc<Metabolite>>,
    /// Products keyed by metabolite id
    #[builder(default = "IndexMap::new()")]
    pub products: IndexMap<String, Rc<Metabolite>>,
    #[builder(default = "false")]
    pub reversible: bool,
    /// Enzyme numbers catalysing the reaction, in discovery order
    #[builder(default = "Vec::new()")]
    pub enzymes: Vec<String>,
    /// Genes associated with the reaction through its enzymes
    #[builder(default = "Vec::new()")]
    pub genes: Vec<String>,
    /// Links to other databases, {database name: external id}
    #[builder(default = "IndexMap::new()")]
    pub db_links: IndexMap<String, String>,
    /// Metabolite stoichiometry of the reaction, all coefficients are positive
    #[builder(default = "IndexMap::new()")]
    pub stoichiometry: IndexMap<String, u32>,
    /// Pathways or subsystems the reaction belongs to
    #[builder(default = "Vec::new()")]
    pub pathways: Vec<String>,
}

impl Reaction {
    /// Start building a new reaction
    pub fn builder() -> ReactionBuilder {
        ReactionBuilder::default()
    }

    /// Record that another enzyme number (and the genes assigned to it) catalyses this reaction
    ///
    /// # Examples
    /// ```rust
    /// use metronome_core::metabolic_model::reaction::Reaction;
    /// let mut reaction = Reaction::builder()
    ///     .id("R00001")
    ///     .name(vec!["polyphosphate polyphosphohydrolase".to_string()])
    ///     .build()
    ///     .unwrap();
    /// reaction.merge_enzyme_association("3.6.1.10", &["Rv0001".to_string()]);
    /// reaction.merge_enzyme_association("3.6.1.11", &["Rv0002".to_string()]);
    /// assert_eq!(reaction.enzymes, vec!["3.6.1.10", "3.6.1.11"]);
    /// assert_eq!(reaction.genes, vec!["Rv0001", "Rv0002"]);
    /// ```
    pub fn merge_enzyme_association(&mut self, enzyme: &str, genes: &[String]) {
        self.enzymes.push(enzyme.to_string());
        self.genes.extend_from_slice(genes);
    }

    /// Coefficient of a metabolite, defaulting to 1 if it wasn't recorded
    pub fn coefficient(&self, metabolite_id: &str) -> u32 {
        self.stoichiometry.get(metabolite_id).copied().unwrap_or(1)
    }

    /// Primary display name
    pub fn primary_name(&self) -> &str {
        self.name.first().map(String::as_str).unwrap_or(&self.id)
    }

    /// Iterate over every metabolite taking part in the reaction
    pub fn metabolites(&self) -> impl Iterator<Item = &Rc<Metabolite>> {
        self.substrates.values().chain(self.products.values())
    }
}

impl ReactionBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref id) = self.id {
            if id.is_empty() {
                return Err("Reaction ID must be a non-empty string".to_string());
            }
        }
        if let Some(ref name) = self.name {
            if name.is_empty() {
                return Err("Reaction name must be a non-empty list".to_string());
            }
        }
        for side in [&self.substrates, &self.products].into_iter().flatten() {
            if let Some((key, met)) = side.iter().find(|(key, met)| **key != met.id) {
                return Err(format!(
                    "Reaction metabolite key {} does not match metabolite {}",
                    key, met.id
                ));
            }
        }
        if let Some(ref stoichiometry) = self.stoichiometry {
            for (met_id, coefficient) in stoichiometry {
                if *coefficient == 0 {
                    return Err(format!("Stoichiometry of {} must be positive", met_id));
                }
                let known = [&self.substrates, &self.products]
                    .into_iter()
                    .flatten()
                    .any(|side| side.contains_key(met_id));
                if !known {
                    return Err(format!(
                        "Stoichiometry given for {}, which is neither a substrate nor a product",
                        met_id
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metabolite(id: &str) -> Rc<Metabolite> {
        Rc::new(
            Metabolite::builder()
                .id(id)
                .name(vec![id.to_string()])
                .build()
                .unwrap(),
        )
    }

    fn side(ids: &[&str]) -> IndexMap<String, Rc<Metabolite>> {
        ids.iter().map(|id| (id.to_string(), metabolite(id))).collect()
    }

    #[test]
    fn build_reaction() {
        let reaction = Reaction::builder()
            .id("R00299")
            .name(vec!["ATP:D-glucose 6-phosphotransferase".to_string()])
            .substrates(side(&["C00002", "C00031"]))
            .products(side(&["C00008", "C00092"]))
            .stoichiometry(IndexMap::from([("C00002".to_string(), 1), ("C00092".to_string(), 1)]))
            .enzymes(vec!["2.7.1.1".to_string()])
            .genes(vec!["Rv0001".to_string()])
            .build()
            .unwrap();
        assert_eq!(reaction.metabolites().count(), 4);
        assert_eq!(reaction.coefficient("C00031"), 1);
        assert!(!reaction.reversible);
        assert!(reaction.pathways.is_empty());
    }

    #[test]
    fn accumulate_enzymes() {
        let mut reaction = Reaction::builder()
            .id("R1")
            .name(vec!["R1".to_string()])
            .enzymes(vec!["1.1.1.1".to_string()])
            .genes(vec!["g1".to_string(), "g2".to_string()])
            .build()
            .unwrap();
        reaction.merge_enzyme_association("1.1.1.2", &["g2".to_string(), "g3".to_string()]);
        assert_eq!(reaction.enzymes, vec!["1.1.1.1", "1.1.1.2"]);
        // Duplicates are kept, in discovery order
        assert_eq!(reaction.genes, vec!["g1", "g2", "g2", "g3"]);
    }

    #[test]
    fn invalid_reactions_are_rejected() {
        match Reaction::builder().id("R1").name(vec![]).build() {
            Err(ReactionBuilderError::ValidationError(_)) => {}
            _ => panic!("Empty name not caught"),
        }
        let mismatched = IndexMap::from([("C1".to_string(), metabolite("C2"))]);
        assert!(Reaction::builder()
            .id("R1")
            .name(vec!["R1".to_string()])
            .substrates(mismatched)
            .build()
            .is_err());
        assert!(Reaction::builder()
            .id("R1")
            .name(vec!["R1".to_string()])
            .substrates(side(&["C1"]))
            .stoichiometry(IndexMap::from([("C1".to_string(), 0)]))
            .build()
            .is_err());
        assert!(Reaction::builder()
            .id("R1")
            .name(vec!["R1".to_string()])
            .substrates(side(&["C1"]))
            .stoichiometry(IndexMap::from([("C9".to_string(), 2)]))
            .build()
            .is_err());
    }
}
