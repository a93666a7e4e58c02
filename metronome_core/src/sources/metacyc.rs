//! Extraction of reactions and compounds from a MetaCyc SBML export
use std::rc::Rc;

use indexmap::IndexMap;
use log::info;

use crate::extraction::sbml::{is_enzyme_note, load_document, SbmlExtraction};
use crate::extraction::{require_enzymes, DatabaseExtraction, ExtractionArgs, ExtractionError, ExtractionHooks};
use crate::io::notes::{self, is_reaction_metadata, split_list};
use crate::io::sbml::{SbmlDocument, SbmlReaction, SbmlSpecies};
use crate::metabolic_model::enzyme::AssignedEnzymeMap;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;

const DATABASE_NAME: &str = "MetaCyc";

/// Species notes holding chemistry rather than links to other databases
const CHEMISTRY_NOTES: [&str; 5] = [
    notes::CHARGE,
    notes::FORMULA,
    notes::INCHI,
    notes::INCHIKEY,
    notes::SMILES,
];

/// Extracts the reactions of every assigned enzyme from a MetaCyc model file
///
/// Reactions are linked to enzymes through their `EC Number` notes.
pub struct MetaCycExtraction {
    enzymes: Rc<AssignedEnzymeMap>,
    document: SbmlDocument,
    model: Model,
}

impl MetaCycExtraction {
    pub fn new(args: &ExtractionArgs) -> Result<Self, ExtractionError> {
        let enzymes = require_enzymes(&args.enzymes)?;
        let model_file = args
            .model_file
            .as_ref()
            .ok_or(ExtractionError::MissingArgument("model_file"))?;
        Ok(MetaCycExtraction {
            enzymes,
            document: load_document(model_file)?,
            model: Model::new_empty(),
        })
    }

    fn side_metabolites(
        &mut self,
        references: Vec<String>,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        let mut side = IndexMap::new();
        for species in references {
            let metabolite = self.resolve_metabolite(&species)?;
            side.insert(species, metabolite);
        }
        Ok(side)
    }
}

fn species_note(record: &Option<SbmlSpecies>, key: &str) -> Option<String> {
    record
        .as_ref()
        .and_then(|s| s.notes_map().get(key).cloned())
        .filter(|v| !v.is_empty())
}

impl DatabaseExtraction for MetaCycExtraction {
    fn database_name(&self) -> &str {
        DATABASE_NAME
    }

    fn enzymes(&self) -> &AssignedEnzymeMap {
        &self.enzymes
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn populate_reactions(&mut self) -> Result<(), ExtractionError> {
        info!("Executing MetaCyc SBML Extractor");
        let by_enzyme = self.reactions_by_enzyme();
        let enzymes: Vec<String> = self.enzymes.enzymes().cloned().collect();
        for enzyme in enzymes {
            info!("Extracting reactions linked to {}", enzyme);
            for reaction_id in by_enzyme.get(&enzyme).into_iter().flatten() {
                let Some(reaction) = self.sbml_reaction(reaction_id).cloned() else {
                    continue;
                };
                self.record_reaction(reaction_id, &enzyme, |_| reaction)?;
            }
        }
        Ok(())
    }

    fn resolve_metabolite(&mut self, metabolite_id: &str) -> Result<Rc<Metabolite>, ExtractionError> {
        self.resolve_with(metabolite_id, |metacyc| metacyc.species(metabolite_id).cloned())
    }
}

impl SbmlExtraction for MetaCycExtraction {
    fn document(&self) -> &SbmlDocument {
        &self.document
    }
}

impl ExtractionHooks for MetaCycExtraction {
    /// `None` for species referenced by a reaction but missing from the document
    type MetaboliteRecord = Option<SbmlSpecies>;
    type ReactionRecord = SbmlReaction;

    fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    fn metabolite_name(&self, metabolite_id: &str, record: &Option<SbmlSpecies>) -> Vec<String> {
        let name = record
            .as_ref()
            .and_then(|s| s.name.clone())
            .filter(|n| !n.is_empty());
        vec![name.unwrap_or_else(|| metabolite_id.to_string())]
    }

    fn metabolite_formula(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        record
            .as_ref()
            .and_then(|s| s.fbc_formula.clone())
            .or_else(|| species_note(record, notes::FORMULA))
    }

    fn metabolite_charge(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        record
            .as_ref()
            .and_then(|s| s.fbc_charge.clone())
            .or_else(|| species_note(record, notes::CHARGE))
    }

    fn metabolite_inchi(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        species_note(record, notes::INCHI)
    }

    fn metabolite_inchi_key(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        species_note(record, notes::INCHIKEY)
    }

    fn metabolite_smiles(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        species_note(record, notes::SMILES)
    }

    fn metabolite_compartment(&self, record: &Option<SbmlSpecies>) -> Option<String> {
        record
            .as_ref()
            .and_then(|s| s.compartment.clone())
            .filter(|c| !c.is_empty())
    }

    fn metabolite_dblinks(&self, metabolite_id: &str, record: &Option<SbmlSpecies>) -> IndexMap<String, String> {
        let mut links = IndexMap::from([(DATABASE_NAME.to_string(), metabolite_id.to_string())]);
        if let Some(species) = record {
            links.extend(
                species
                    .notes_map()
                    .into_iter()
                    .filter(|(key, _)| !CHEMISTRY_NOTES.contains(&key.as_str())),
            );
        }
        links
    }

    fn reaction_name(&self, _: &str, record: &SbmlReaction) -> Vec<String> {
        self.sbml_reaction_name(record)
    }

    fn reaction_substrates(
        &mut self,
        _: &str,
        record: &SbmlReaction,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        let species = record.reactant_references().iter().map(|r| r.species.clone()).collect();
        self.side_metabolites(species)
    }

    fn reaction_products(
        &mut self,
        _: &str,
        record: &SbmlReaction,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        let species = record.product_references().iter().map(|r| r.species.clone()).collect();
        self.side_metabolites(species)
    }

    fn reaction_reversibility(&self, record: &SbmlReaction) -> bool {
        self.sbml_reaction_reversibility(record)
    }

    fn reaction_dblinks(&self, reaction_id: &str, record: &SbmlReaction) -> IndexMap<String, String> {
        let mut links = IndexMap::from([(DATABASE_NAME.to_string(), reaction_id.to_string())]);
        links.extend(
            record
                .notes_map()
                .into_iter()
                .filter(|(key, _)| !is_reaction_metadata(key) && !is_enzyme_note(key)),
        );
        links
    }

    fn reaction_stoichiometry(
        &self,
        record: &SbmlReaction,
        _: &IndexMap<String, Rc<Metabolite>>,
        _: &IndexMap<String, Rc<Metabolite>>,
    ) -> IndexMap<String, u32> {
        self.sbml_reaction_stoichiometry(record)
    }

    fn reaction_pathways(&self, record: &SbmlReaction) -> Vec<String> {
        let notes = record.notes_map();
        notes
            .get(notes::SUBSYSTEM)
            .or_else(|| notes.get(notes::PATHWAY))
            .map(|value| split_list(value))
            .unwrap_or_default()
    }
}
