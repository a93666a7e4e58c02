//! Merging of the networks extracted from every source into one MetaNetX based network
//!
//! The models written by the extraction stage are scanned for reactions that can be mapped
//! to a canonical MetaNetX reaction, through any of their database links or their id. Every
//! canonical reaction found is then rebuilt from the MetaNetX property tables, so reactions
//! extracted from several sources end up as a single reaction.
pub mod tables;

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::{info, warn};
use regex::Regex;
use thiserror::Error;

use crate::configuration::Configuration;
use crate::extraction::{require_enzymes, skip_invalid, DatabaseExtraction, ExtractionError, ExtractionHooks};
use crate::io::equation::{metabolite_ids, split_sides, stoichiometry};
use crate::io::notes::{is_reaction_metadata, split_list, ENZYME};
use crate::io::rest::RestError;
use crate::io::sbml::{read_sbml, SbmlDocument, SbmlReaction};
use crate::merge::tables::{CanonicalTables, ChemicalProperties, ReactionProperties, XrefTable};
use crate::metabolic_model::enzyme::AssignedEnzymeMap;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;

static MNX_METABOLITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MNXM[0-9]+").expect("valid MetaNetX metabolite regex"));

const EQUATION_MARKER: &str = "=";

// region Canonical reaction set
/// Canonical reactions found in a set of models, with the enzyme numbers recorded on the
/// reactions mapped to each of them
#[derive(Clone, Debug, Default)]
pub struct CanonicalReactionSet {
    reactions: IndexMap<String, Vec<String>>,
    unmapped: usize,
}

impl CanonicalReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the canonical reactions of every model file in `directory`
    ///
    /// Only files with one of the configured model extensions are read, in file name order.
    /// Files that can't be parsed are logged and skipped.
    pub fn discover(directory: &Path, xref: &XrefTable) -> Result<Self, MergeError> {
        let extensions = Configuration::current().model_extensions;
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x == e));
            if path.is_file() && matches {
                files.push(path);
            }
        }
        files.sort();

        let mut set = CanonicalReactionSet::new();
        for file in files {
            match read_sbml(&file) {
                Ok(document) => {
                    let (mapped, unmapped) = set.add_document(&document, xref);
                    info!(
                        "{}: {} unique reaction MetaNetX ids, {} reactions with no MetaNetX id",
                        file.display(),
                        mapped,
                        unmapped
                    );
                }
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }
        Ok(set)
    }

    /// Add the reactions of one model
    ///
    /// # Returns
    /// The number of distinct canonical ids in the model and the number of reactions which
    /// couldn't be mapped
    pub fn add_document(&mut self, document: &SbmlDocument, xref: &XrefTable) -> (usize, usize) {
        let mut mapped: Vec<&str> = Vec::new();
        let mut unmapped = 0;
        for reaction in document.reactions() {
            match canonical_reaction(reaction, xref) {
                Some(canonical) => {
                    let enzymes = self.reactions.entry(canonical.to_string()).or_default();
                    let notes = reaction.notes_map();
                    for enzyme in notes.get(ENZYME).map(|e| split_list(e)).unwrap_or_default() {
                        if !enzymes.contains(&enzyme) {
                            enzymes.push(enzyme);
                        }
                    }
                    if !mapped.contains(&canonical) {
                        mapped.push(canonical);
                    }
                }
                None => unmapped += 1,
            }
        }
        self.unmapped += unmapped;
        (mapped.len(), unmapped)
    }

    /// Canonical ids with their enzyme numbers, in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.reactions.iter()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.reactions.contains_key(canonical)
    }

    pub fn enzymes(&self, canonical: &str) -> Option<&Vec<String>> {
        self.reactions.get(canonical)
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Reactions seen so far that couldn't be mapped
    pub fn unmapped(&self) -> usize {
        self.unmapped
    }
}

/// Canonical id of a reaction, from the first mapped note value or else its own id
fn canonical_reaction<'x>(reaction: &SbmlReaction, xref: &'x XrefTable) -> Option<&'x str> {
    reaction
        .notes_map()
        .iter()
        .filter(|(key, _)| !is_reaction_metadata(key))
        .find_map(|(_, value)| xref.canonical(value))
        .or_else(|| xref.canonical(&reaction.id))
}
// endregion Canonical reaction set

// region Network merger
/// Rebuilds the canonical reactions found in a directory of extracted models
pub struct NetworkMerger {
    enzymes: Rc<AssignedEnzymeMap>,
    tables: CanonicalTables,
    canonical_reactions: CanonicalReactionSet,
    model: Model,
}

impl NetworkMerger {
    /// Create a merger for the models in `directory`, discovering their canonical reactions
    pub fn new(
        enzymes: &Rc<AssignedEnzymeMap>,
        tables: CanonicalTables,
        directory: &Path,
    ) -> Result<Self, MergeError> {
        let enzymes = require_enzymes(enzymes)?;
        info!("Looking for MetaNetX reactions in {}", directory.display());
        let canonical_reactions = CanonicalReactionSet::discover(directory, &tables.reaction_xref)?;
        info!(
            "Found {} MetaNetX reactions, {} reactions couldn't be mapped",
            canonical_reactions.len(),
            canonical_reactions.unmapped()
        );
        Ok(NetworkMerger {
            enzymes,
            tables,
            canonical_reactions,
            model: Model::new_empty(),
        })
    }

    pub fn canonical_reactions(&self) -> &CanonicalReactionSet {
        &self.canonical_reactions
    }

    fn side_metabolites(
        &mut self,
        record: &ReactionProperties,
        substrates: bool,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        let mut side = IndexMap::new();
        let Some((left, right)) = record
            .equation
            .as_deref()
            .and_then(|e| split_sides(e, EQUATION_MARKER))
        else {
            return Ok(side);
        };
        for id in metabolite_ids(if substrates { left } else { right }, &MNX_METABOLITE) {
            let metabolite = self.resolve_metabolite(&id)?;
            side.insert(id, metabolite);
        }
        Ok(side)
    }
}

impl DatabaseExtraction for NetworkMerger {
    fn database_name(&self) -> &str {
        "MetaNetX"
    }

    fn enzymes(&self) -> &AssignedEnzymeMap {
        &self.enzymes
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn populate_reactions(&mut self) -> Result<(), ExtractionError> {
        let canonical: Vec<(String, Vec<String>)> = self
            .canonical_reactions
            .iter()
            .map(|(id, enzymes)| (id.clone(), enzymes.clone()))
            .collect();
        for (reaction_id, enzymes) in canonical {
            let Some(properties) = self
                .tables
                .reaction_properties
                .get(&reaction_id)
                .filter(|p| p.equation.is_some())
                .cloned()
            else {
                warn!("No equation known for {}, skipping it", reaction_id);
                continue;
            };
            if enzymes.is_empty() {
                let assembled = self.assemble_reaction(&reaction_id, &properties);
                if let Some(reaction) = skip_invalid(&reaction_id, assembled)? {
                    self.model.add_reaction(reaction);
                }
                continue;
            }
            for enzyme in &enzymes {
                self.record_reaction(&reaction_id, enzyme, |_| properties.clone())?;
            }
        }
        info!("Merged network holds {} reactions", self.model.reactions.len());
        Ok(())
    }

    fn resolve_metabolite(&mut self, metabolite_id: &str) -> Result<Rc<Metabolite>, ExtractionError> {
        self.resolve_with(metabolite_id, |merger| {
            merger.tables.chemical_properties.get(metabolite_id).cloned()
        })
    }
}

impl ExtractionHooks for NetworkMerger {
    type MetaboliteRecord = Option<ChemicalProperties>;
    type ReactionRecord = ReactionProperties;

    fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    fn metabolite_name(&self, metabolite_id: &str, record: &Option<ChemicalProperties>) -> Vec<String> {
        let description = record.as_ref().and_then(|c| c.description.clone());
        vec![description.unwrap_or_else(|| metabolite_id.to_string())]
    }

    fn metabolite_formula(&self, record: &Option<ChemicalProperties>) -> Option<String> {
        record.as_ref().and_then(|c| c.formula.clone())
    }

    fn metabolite_charge(&self, record: &Option<ChemicalProperties>) -> Option<String> {
        record.as_ref().and_then(|c| c.charge.clone())
    }

    fn metabolite_inchi(&self, record: &Option<ChemicalProperties>) -> Option<String> {
        record.as_ref().and_then(|c| c.inchi.clone())
    }

    fn metabolite_inchi_key(&self, record: &Option<ChemicalProperties>) -> Option<String> {
        record.as_ref().and_then(|c| c.inchikey.clone())
    }

    fn metabolite_smiles(&self, record: &Option<ChemicalProperties>) -> Option<String> {
        record.as_ref().and_then(|c| c.smiles.clone())
    }

    fn metabolite_compartment(&self, _: &Option<ChemicalProperties>) -> Option<String> {
        None
    }

    fn metabolite_dblinks(&self, metabolite_id: &str, _: &Option<ChemicalProperties>) -> IndexMap<String, String> {
        self.tables.chemical_xref.db_links(metabolite_id)
    }

    fn reaction_name(&self, reaction_id: &str, record: &ReactionProperties) -> Vec<String> {
        vec![record
            .description
            .clone()
            .unwrap_or_else(|| reaction_id.to_string())]
    }

    fn reaction_substrates(
        &mut self,
        _: &str,
        record: &ReactionProperties,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        self.side_metabolites(record, true)
    }

    fn reaction_products(
        &mut self,
        _: &str,
        record: &ReactionProperties,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        self.side_metabolites(record, false)
    }

    fn reaction_reversibility(&self, _: &ReactionProperties) -> bool {
        true
    }

    fn reaction_dblinks(&self, reaction_id: &str, _: &ReactionProperties) -> IndexMap<String, String> {
        self.tables.reaction_xref.db_links(reaction_id)
    }

    fn reaction_stoichiometry(
        &self,
        record: &ReactionProperties,
        substrates: &IndexMap<String, Rc<Metabolite>>,
        products: &IndexMap<String, Rc<Metabolite>>,
    ) -> IndexMap<String, u32> {
        let Some(equation) = record.equation.as_deref() else {
            return IndexMap::new();
        };
        let ids: Vec<String> = substrates.keys().chain(products.keys()).cloned().collect();
        stoichiometry(equation, &ids)
    }

    fn reaction_pathways(&self, _: &ReactionProperties) -> Vec<String> {
        Vec::new()
    }
}
// endregion Network merger

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Unable to load MetaNetX {table}: {source}")]
    UnableToLoad {
        table: &'static str,
        source: RestError,
    },
    #[error("Unable to read model directory: {0}")]
    UnableToReadDirectory(#[from] std::io::Error),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::io::sbml::write_model;
    use crate::merge::tables::{parse_chemical_properties, parse_reaction_properties};
    use crate::metabolic_model::reaction::Reaction;

    fn tables() -> CanonicalTables {
        CanonicalTables {
            reaction_xref: XrefTable::parse(
                "kegg:R00004\tMNXR999\nmetacyc:INORGPYROPHOSPHAT-RXN\tMNXR999\nrhea:24576\tMNXR999\n\
                 kegg:R00299\tMNXR100\nrhea:17825\tMNXR101\n",
            ),
            reaction_properties: parse_reaction_properties(
                "MNXR999\t1 MNXM13@MNXD1 + 1 MNXM2@MNXD1 = 2 MNXM9@MNXD1\tdiphosphate phosphohydrolase\n\
                 MNXR100\t1 MNXM3 + 1 MNXM41 = 1 MNXM7 + 1 MNXM215\n",
            ),
            chemical_xref: XrefTable::parse("kegg:C00001\tMNXM2\nchebi:15377\tMNXM2\n"),
            chemical_properties: parse_chemical_properties(
                "MNXM2\tH2O\tH2O\t0\t18.011\tInChI=1S/H2O/h1H2\tO\tkegg:C00001\tXLYOFNOQVPJJNP-UHFFFAOYSA-N\n\
                 MNXM9\tphosphate\tHO4P\t-2\n",
            ),
        }
    }

    fn reaction(id: &str, enzymes: &[&str], links: &[(&str, &str)]) -> Reaction {
        Reaction::builder()
            .id(id)
            .name(vec![id.to_string()])
            .enzymes(enzymes.iter().map(|e| e.to_string()).collect())
            .genes(vec!["Rv0001".to_string()])
            .db_links(
                links
                    .iter()
                    .map(|(db, id)| (db.to_string(), id.to_string()))
                    .collect(),
            )
            .build()
            .unwrap()
    }

    fn enzymes() -> Rc<AssignedEnzymeMap> {
        let mut enzymes = AssignedEnzymeMap::new();
        enzymes.insert("3.6.1.1", vec!["Rv3628".to_string()]).unwrap();
        enzymes.insert("2.7.1.2", vec!["Rv0650".to_string()]).unwrap();
        Rc::new(enzymes)
    }

    /// Two extracted models sharing MNXR999, an unreadable model and an unrelated file
    fn model_directory() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut kegg = Model::new_empty();
        kegg.add_reaction(reaction("R00004", &["3.6.1.1"], &[("KEGG", "R00004")]));
        kegg.add_reaction(reaction("R00299", &["2.7.1.2"], &[("KEGG", "R00299")]));
        kegg.add_reaction(reaction("R99999", &["2.7.1.2"], &[("KEGG", "R99999")]));
        write_model(&kegg, dir.path(), "mtb", "KEGG").unwrap();

        let mut metacyc = Model::new_empty();
        metacyc.add_reaction(reaction(
            "INORGPYROPHOSPHAT-RXN",
            &["3.6.1.1", "3.6.1.25"],
            &[("MetaCyc", "INORGPYROPHOSPHAT-RXN")],
        ));
        write_model(&metacyc, dir.path(), "mtb", "MetaCyc").unwrap();

        let mut broken = fs::File::create(dir.path().join("broken.sbml")).unwrap();
        write!(broken, "<sbml><model>").unwrap();
        fs::write(dir.path().join("notes.txt"), "KEGG: R00004").unwrap();
        dir
    }

    #[test]
    fn canonical_reactions_are_deduplicated() {
        let dir = model_directory();
        let set = CanonicalReactionSet::discover(dir.path(), &tables().reaction_xref).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), vec!["MNXR999", "MNXR100"]);
        assert_eq!(
            set.enzymes("MNXR999").unwrap(),
            &vec!["3.6.1.1".to_string(), "3.6.1.25".to_string()]
        );
        assert_eq!(set.unmapped(), 1);
    }

    #[test]
    fn first_mapped_link_wins() {
        let document = SbmlDocument::from_xml(
            r#"<sbml level="3" version="2"><model><listOfReactions>
                <reaction id="R00299">
                  <notes><body xmlns="http://www.w3.org/1999/xhtml">
                    <p>ENZYME: 2.7.1.2</p>
                    <p>UNKNOWN: nothing</p>
                    <p>RHEA: 17825</p>
                    <p>KEGG: R00299</p>
                  </body></notes>
                </reaction>
                <reaction id="R00004"/>
              </listOfReactions></model></sbml>"#,
        )
        .unwrap();
        let mut set = CanonicalReactionSet::new();
        // The reaction id is only used when no link maps
        assert_eq!(set.add_document(&document, &tables().reaction_xref), (2, 0));
        assert!(set.contains("MNXR101"));
        assert!(!set.contains("MNXR100"));
        assert!(set.contains("MNXR999"));
        assert!(set.enzymes("MNXR999").unwrap().is_empty());
    }

    #[test]
    fn merge_rebuilds_canonical_reactions() {
        let dir = model_directory();
        let mut merger = NetworkMerger::new(&enzymes(), tables(), dir.path()).unwrap();
        assert_eq!(merger.database_name(), "MetaNetX");
        merger.populate_reactions().unwrap();

        assert_eq!(merger.reactions().len(), 2);
        let reaction = &merger.reactions()["MNXR999"];
        assert_eq!(reaction.name, vec!["diphosphate phosphohydrolase"]);
        assert!(reaction.reversible);
        assert_eq!(reaction.enzymes, vec!["3.6.1.1", "3.6.1.25"]);
        // 3.6.1.25 was never assigned, so it brings no genes
        assert_eq!(reaction.genes, vec!["Rv3628"]);
        assert_eq!(
            reaction.substrates.keys().collect::<Vec<_>>(),
            vec!["MNXM13", "MNXM2"]
        );
        assert_eq!(reaction.products.keys().collect::<Vec<_>>(), vec!["MNXM9"]);
        assert_eq!(reaction.coefficient("MNXM9"), 2);
        assert_eq!(reaction.coefficient("MNXM2"), 1);
        assert_eq!(
            reaction.db_links,
            IndexMap::from([
                ("KEGG".to_string(), "R00004".to_string()),
                ("METACYC".to_string(), "INORGPYROPHOSPHAT-RXN".to_string()),
                ("RHEA".to_string(), "24576".to_string()),
            ])
        );

        let water = &reaction.substrates["MNXM2"];
        assert_eq!(water.name, vec!["H2O"]);
        assert_eq!(water.inchikey.as_deref(), Some("XLYOFNOQVPJJNP-UHFFFAOYSA-N"));
        assert_eq!(water.db_links["CHEBI"], "15377");
        // Metabolites missing from the property table are named after their id
        assert_eq!(reaction.substrates["MNXM13"].name, vec!["MNXM13"]);
        let phosphate = Rc::clone(&reaction.products["MNXM9"]);
        assert!(Rc::ptr_eq(&merger.resolve_metabolite("MNXM9").unwrap(), &phosphate));
    }

    #[test]
    fn reactions_without_equation_are_skipped() {
        let dir = model_directory();
        let mut tables = tables();
        tables.reaction_properties.shift_remove("MNXR100");
        let mut merger = NetworkMerger::new(&enzymes(), tables, dir.path()).unwrap();
        merger.populate_reactions().unwrap();
        assert_eq!(merger.reactions().keys().collect::<Vec<_>>(), vec!["MNXR999"]);
    }

    #[test]
    fn missing_directory() {
        match NetworkMerger::new(&enzymes(), tables(), Path::new("/nonexistent/models")) {
            Err(MergeError::UnableToReadDirectory(_)) => {}
            _ => panic!("Merger created for a missing directory"),
        }
    }
}
