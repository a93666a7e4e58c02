//! Default extraction strategies for sources backed by an SBML model file
use indexmap::IndexMap;

use crate::extraction::{DatabaseExtraction, ExtractionError};
use crate::io::sbml::{read_sbml, SbmlDocument, SbmlReaction, SbmlSpecies};
use crate::metabolic_model::enzyme::EC_SEARCH_PATTERN;

/// Note keys that carry the enzyme numbers of a reaction, compared after normalisation
const ENZYME_NOTE_KEYS: [&str; 2] = ["EC_NUMBER", "ENZYME"];

/// Extraction from a parsed SBML document
///
/// Implementors only provide access to the document, every other method has a default
/// reading the standard SBML attributes and notes.
pub trait SbmlExtraction: DatabaseExtraction {
    fn document(&self) -> &SbmlDocument;

    /// Look up a species of the document
    fn species(&self, species_id: &str) -> Option<&SbmlSpecies> {
        self.document().find_species(species_id)
    }

    /// Look up a reaction of the document
    fn sbml_reaction(&self, reaction_id: &str) -> Option<&SbmlReaction> {
        self.document().reactions().iter().find(|r| r.id == reaction_id)
    }

    /// The reaction name, or its id if it has none
    fn sbml_reaction_name(&self, reaction: &SbmlReaction) -> Vec<String> {
        vec![reaction.name.clone().unwrap_or_else(|| reaction.id.clone())]
    }

    /// The reversible attribute, `true` when absent
    fn sbml_reaction_reversibility(&self, reaction: &SbmlReaction) -> bool {
        reaction.reversible.unwrap_or(true)
    }

    /// Coefficients of the species references rounded to positive integers
    fn sbml_reaction_stoichiometry(&self, reaction: &SbmlReaction) -> IndexMap<String, u32> {
        reaction
            .reactant_references()
            .iter()
            .chain(reaction.product_references())
            .map(|r| (r.species.clone(), sbml_coefficient(r.stoichiometry)))
            .collect()
    }

    /// Enzyme numbers found in the notes of a reaction
    fn sbml_reaction_enzymes(&self, reaction: &SbmlReaction) -> Vec<String> {
        enzyme_numbers_from_notes(&reaction.notes_map())
    }

    /// Ids of the reactions annotated with each enzyme number, in document order
    fn reactions_by_enzyme(&self) -> IndexMap<String, Vec<String>> {
        let mut index: IndexMap<String, Vec<String>> = IndexMap::new();
        for reaction in self.document().reactions() {
            for enzyme in self.sbml_reaction_enzymes(reaction) {
                index.entry(enzyme).or_default().push(reaction.id.clone());
            }
        }
        index
    }
}

/// Load the document an SBML backed source is constructed from
pub fn load_document(path: &std::path::Path) -> Result<SbmlDocument, ExtractionError> {
    Ok(read_sbml(path)?)
}

/// Round an SBML stoichiometry to a positive integer coefficient, missing values are 1
pub fn sbml_coefficient(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v.round() >= 1.0 => v.round() as u32,
        _ => 1,
    }
}

/// Enzyme numbers in the `EC Number`, `EC-NUMBER` or `ENZYME` notes, without `EC-` prefixes
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use metronome_core::extraction::sbml::enzyme_numbers_from_notes;
/// let notes = IndexMap::from([("EC Number".to_string(), "EC-2.7.1.2, EC-2.7.1.1".to_string())]);
/// assert_eq!(enzyme_numbers_from_notes(&notes), vec!["2.7.1.2", "2.7.1.1"]);
/// ```
pub fn enzyme_numbers_from_notes(notes: &IndexMap<String, String>) -> Vec<String> {
    let mut enzymes: Vec<String> = Vec::new();
    for (key, value) in notes {
        if !is_enzyme_note(key) {
            continue;
        }
        for found in EC_SEARCH_PATTERN.find_iter(value) {
            let enzyme = found.as_str().to_string();
            if !enzymes.contains(&enzyme) {
                enzymes.push(enzyme);
            }
        }
    }
    enzymes
}

/// Whether a note key holds enzyme numbers
pub fn is_enzyme_note(key: &str) -> bool {
    let normalised = key.trim().to_uppercase().replace([' ', '-'], "_");
    ENZYME_NOTE_KEYS.contains(&normalised.as_str())
}
