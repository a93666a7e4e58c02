//! Capability contracts every database extraction source implements
//!
//! A source plugin implements two traits:
//! - [`DatabaseExtraction`], the object safe part the orchestrator (and the plugin registry)
//!   works with
//! - [`ExtractionHooks`], the per-field hooks turning a raw upstream record into the fields of
//!   a [`Metabolite`] or [`Reaction`]. Its provided methods assemble and cache the validated
//!   entities, so plugins only decide how to read their own records.
pub mod sbml;

use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;

use crate::io::rest::{RestClient, RestError};
use crate::io::sbml::SbmlError;
use crate::metabolic_model::enzyme::AssignedEnzymeMap;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::EntityError;

/// Reaction and metabolite extraction from one upstream source
pub trait DatabaseExtraction {
    /// Short name of the source, used to name output files and as a cross-link key
    fn database_name(&self) -> &str;

    /// Enzymes assigned to the organism being reconstructed
    fn enzymes(&self) -> &AssignedEnzymeMap;

    /// Reactions and metabolites extracted so far
    fn model(&self) -> &Model;

    /// Find the reactions linked to every assigned enzyme and add them to the model
    fn populate_reactions(&mut self) -> Result<(), ExtractionError>;

    /// Get a metabolite, extracting and caching it on first access
    ///
    /// Repeated calls with the same id return the cached value without querying the source
    /// again.
    fn resolve_metabolite(&mut self, metabolite_id: &str) -> Result<Rc<Metabolite>, ExtractionError>;

    fn reactions(&self) -> &IndexMap<String, Reaction> {
        &self.model().reactions
    }

    fn metabolites(&self) -> &IndexMap<String, Rc<Metabolite>> {
        &self.model().metabolites
    }
}

/// Field level extraction hooks
///
/// Each hook receives the raw upstream record and returns the value of one field. A hook
/// with nothing to report returns `None`, an empty collection, or (for names) a fallback
/// derived from the id; it never fails.
pub trait ExtractionHooks: DatabaseExtraction {
    /// Raw upstream record a metabolite is extracted from
    type MetaboliteRecord;
    /// Raw upstream record a reaction is extracted from
    type ReactionRecord;

    fn model_mut(&mut self) -> &mut Model;

    fn metabolite_name(&self, metabolite_id: &str, record: &Self::MetaboliteRecord) -> Vec<String>;
    fn metabolite_formula(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    fn metabolite_charge(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    fn metabolite_inchi(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    fn metabolite_inchi_key(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    fn metabolite_smiles(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    /// `None` places the metabolite in the default compartment
    fn metabolite_compartment(&self, record: &Self::MetaboliteRecord) -> Option<String>;
    fn metabolite_dblinks(
        &self,
        metabolite_id: &str,
        record: &Self::MetaboliteRecord,
    ) -> IndexMap<String, String>;

    fn reaction_name(&self, reaction_id: &str, record: &Self::ReactionRecord) -> Vec<String>;
    fn reaction_substrates(
        &mut self,
        reaction_id: &str,
        record: &Self::ReactionRecord,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError>;
    fn reaction_products(
        &mut self,
        reaction_id: &str,
        record: &Self::ReactionRecord,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError>;
    fn reaction_reversibility(&self, record: &Self::ReactionRecord) -> bool;
    fn reaction_dblinks(&self, reaction_id: &str, record: &Self::ReactionRecord) -> IndexMap<String, String>;
    fn reaction_stoichiometry(
        &self,
        record: &Self::ReactionRecord,
        substrates: &IndexMap<String, Rc<Metabolite>>,
        products: &IndexMap<String, Rc<Metabolite>>,
    ) -> IndexMap<String, u32>;
    fn reaction_pathways(&self, record: &Self::ReactionRecord) -> Vec<String>;

    /// Build a validated metabolite by calling every metabolite hook
    fn assemble_metabolite(
        &self,
        metabolite_id: &str,
        record: &Self::MetaboliteRecord,
    ) -> Result<Metabolite, ExtractionError> {
        let mut builder = Metabolite::builder();
        builder
            .id(metabolite_id)
            .name(self.metabolite_name(metabolite_id, record))
            .formula(self.metabolite_formula(record))
            .charge(self.metabolite_charge(record))
            .inchi(self.metabolite_inchi(record))
            .inchikey(self.metabolite_inchi_key(record))
            .smiles(self.metabolite_smiles(record))
            .db_links(self.metabolite_dblinks(metabolite_id, record));
        if let Some(compartment) = self.metabolite_compartment(record) {
            builder.compartment(compartment);
        }
        builder.build().map_err(|source| {
            EntityError::InvalidMetabolite {
                id: metabolite_id.to_string(),
                source,
            }
            .into()
        })
    }

    /// Build a validated reaction (without enzyme associations) by calling every reaction hook
    fn assemble_reaction(
        &mut self,
        reaction_id: &str,
        record: &Self::ReactionRecord,
    ) -> Result<Reaction, ExtractionError> {
        let name = self.reaction_name(reaction_id, record);
        let reversible = self.reaction_reversibility(record);
        let db_links = self.reaction_dblinks(reaction_id, record);
        let substrates = self.reaction_substrates(reaction_id, record)?;
        let products = self.reaction_products(reaction_id, record)?;
        let stoichiometry = self.reaction_stoichiometry(record, &substrates, &products);
        let pathways = self.reaction_pathways(record);
        Reaction::builder()
            .id(reaction_id)
            .name(name)
            .substrates(substrates)
            .products(products)
            .reversible(reversible)
            .db_links(db_links)
            .stoichiometry(stoichiometry)
            .pathways(pathways)
            .build()
            .map_err(|source| {
                EntityError::InvalidReaction {
                    id: reaction_id.to_string(),
                    source,
                }
                .into()
            })
    }

    /// Return the cached metabolite, or fetch its record, assemble and cache it
    fn resolve_with<F>(&mut self, metabolite_id: &str, fetch: F) -> Result<Rc<Metabolite>, ExtractionError>
    where
        F: FnOnce(&Self) -> Self::MetaboliteRecord,
        Self: Sized,
    {
        if let Some(metabolite) = self.model().metabolite(metabolite_id) {
            debug!(
                "Compound {} already extracted from {}",
                metabolite_id,
                self.database_name()
            );
            return Ok(metabolite);
        }
        let record = fetch(self);
        let metabolite = self.assemble_metabolite(metabolite_id, &record)?;
        Ok(self.model_mut().add_metabolite(metabolite))
    }

    /// Add a reaction catalysed by `enzyme`
    ///
    /// If the reaction was already extracted, only the enzyme and its genes are appended and
    /// `fetch` is never called. A record failing entity validation is logged and skipped.
    fn record_reaction<F>(&mut self, reaction_id: &str, enzyme: &str, fetch: F) -> Result<(), ExtractionError>
    where
        F: FnOnce(&Self) -> Self::ReactionRecord,
        Self: Sized,
    {
        let genes = self.enzymes().get(enzyme).cloned().unwrap_or_default();
        if self
            .model_mut()
            .merge_enzyme_association(reaction_id, enzyme, &genes)
        {
            info!(
                "Reaction {} already extracted from {}, appending {} and its genes",
                reaction_id,
                self.database_name(),
                enzyme
            );
            return Ok(());
        }
        let record = fetch(self);
        let assembled = self.assemble_reaction(reaction_id, &record);
        let Some(mut reaction) = skip_invalid(reaction_id, assembled)? else {
            return Ok(());
        };
        reaction.merge_enzyme_association(enzyme, &genes);
        self.model_mut().add_reaction(reaction);
        Ok(())
    }
}

/// Arguments every extraction plugin is constructed from
#[derive(Clone)]
pub struct ExtractionArgs {
    /// Enzymes assigned by the enzyme assignment stage, shared read-only
    pub enzymes: Rc<AssignedEnzymeMap>,
    /// Transport used for upstream requests
    pub client: Rc<dyn RestClient>,
    /// Model file backing an SBML based source
    pub model_file: Option<PathBuf>,
}

impl ExtractionArgs {
    pub fn new(enzymes: Rc<AssignedEnzymeMap>, client: Rc<dyn RestClient>) -> Self {
        ExtractionArgs {
            enzymes,
            client,
            model_file: None,
        }
    }

    pub fn with_model_file(mut self, model_file: impl Into<PathBuf>) -> Self {
        self.model_file = Some(model_file.into());
        self
    }
}

/// Check the assigned enzymes a plugin is constructed with
pub fn require_enzymes(enzymes: &Rc<AssignedEnzymeMap>) -> Result<Rc<AssignedEnzymeMap>, ExtractionError> {
    if enzymes.is_empty() {
        return Err(ExtractionError::NoAssignedEnzymes);
    }
    Ok(Rc::clone(enzymes))
}

/// Degrade an entity validation failure of one reaction to a skipped reaction
///
/// Any other error is passed on.
pub fn skip_invalid<T>(reaction_id: &str, assembled: Result<T, ExtractionError>) -> Result<Option<T>, ExtractionError> {
    match assembled {
        Ok(value) => Ok(Some(value)),
        Err(ExtractionError::Entity(e)) => {
            warn!("Skipping reaction {}: {}", reaction_id, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Assigned enzymes must be a non-empty AssignedEnzymeMap")]
    NoAssignedEnzymes,
    #[error("Missing construction argument: {0}")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Sbml(#[from] SbmlError),
    #[error(transparent)]
    Rest(#[from] RestError),
}
