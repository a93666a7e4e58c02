//! This module provides the Model struct, the reaction and metabolite tables built by one
//! extraction source
use std::rc::Rc;

use indexmap::IndexMap;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

/// Represents a (draft) metabolic network
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of metabolite ids to Metabolite Objects (shared with the reactions using them)
    pub metabolites: IndexMap<String, Rc<Metabolite>>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model::default()
    }

    /// Add a reaction to the model, replacing any reaction with the same id
    ///
    /// # Examples
    /// ```rust
    /// use metronome_core::metabolic_model::model::Model;
    /// use metronome_core::metabolic_model::reaction::Reaction;
    /// let mut model = Model::new_empty();
    /// let new_reaction = Reaction::builder().id("R00001").name(vec!["R00001".to_string()]).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.contains_reaction("R00001"));
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model, returning the shared handle stored in the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) -> Rc<Metabolite> {
        let metabolite = Rc::new(metabolite);
        self.metabolites
            .insert(metabolite.id.clone(), Rc::clone(&metabolite));
        metabolite
    }

    pub fn contains_reaction(&self, id: &str) -> bool {
        self.reactions.contains_key(id)
    }

    /// Get a cached metabolite
    pub fn metabolite(&self, id: &str) -> Option<Rc<Metabolite>> {
        self.metabolites.get(id).cloned()
    }

    /// Append an enzyme association to an existing reaction
    ///
    /// # Returns
    /// `true` if the reaction was present (and updated), `false` if it has not been seen yet
    pub fn merge_enzyme_association(&mut self, reaction_id: &str, enzyme: &str, genes: &[String]) -> bool {
        match self.reactions.get_mut(reaction_id) {
            Some(reaction) => {
                reaction.merge_enzyme_association(enzyme, genes);
                true
            }
            None => false,
        }
    }

    /// Unique compartments of the metabolites, in first-seen order
    pub fn compartments(&self) -> Vec<String> {
        let mut compartments: Vec<String> = Vec::new();
        for met in self.metabolites.values() {
            if !compartments.contains(&met.compartment) {
                compartments.push(met.compartment.clone());
            }
        }
        compartments
    }
}
