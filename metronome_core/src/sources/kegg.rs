//! Extraction of reactions and compounds from the KEGG REST service
use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::{info, warn};
use regex::Regex;

use crate::configuration::{fill_template, Configuration};
use crate::extraction::{require_enzymes, DatabaseExtraction, ExtractionArgs, ExtractionError, ExtractionHooks};
use crate::io::equation::{metabolite_ids, split_sides, stoichiometry};
use crate::io::flat_file::{first_value, parse_flat_file, FlatFileEntry};
use crate::io::rest::RestClient;
use crate::metabolic_model::enzyme::AssignedEnzymeMap;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;

static KEGG_REACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^R\d{5}").expect("valid KEGG reaction regex"));
static KEGG_COMPOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[CG]\d{5}").expect("valid KEGG compound regex"));

const EQUATION_MARKER: &str = "<=>";

/// Extracts the reactions of every assigned enzyme from KEGG
///
/// Every entry (enzyme, reaction or compound) is fetched with the `get` operation and parsed
/// as a flat-file record. A failed fetch is logged and treated as an empty record.
pub struct KeggExtraction {
    enzymes: Rc<AssignedEnzymeMap>,
    client: Rc<dyn RestClient>,
    model: Model,
}

impl KeggExtraction {
    pub fn new(args: &ExtractionArgs) -> Result<Self, ExtractionError> {
        Ok(KeggExtraction {
            enzymes: require_enzymes(&args.enzymes)?,
            client: Rc::clone(&args.client),
            model: Model::new_empty(),
        })
    }

    fn fetch_entry(&self, entry_id: &str) -> FlatFileEntry {
        info!("Calling KEGG REST service: {}", entry_id);
        let url = fill_template(&Configuration::current().kegg_url, entry_id);
        match self.client.get_text(&url) {
            Ok(text) => parse_flat_file(&text),
            Err(e) => {
                warn!("Unable to fetch KEGG entry {}: {}", entry_id, e);
                FlatFileEntry::new()
            }
        }
    }

    fn side_metabolites(
        &mut self,
        reaction_id: &str,
        record: &FlatFileEntry,
        substrates: bool,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        let mut side = IndexMap::new();
        let Some((left, right)) = first_value(record, "EQUATION").and_then(|e| split_sides(e, EQUATION_MARKER)) else {
            return Ok(side);
        };
        let ids = metabolite_ids(if substrates { left } else { right }, &KEGG_COMPOUND);
        for id in ids {
            let metabolite = self.resolve_metabolite(&id)?;
            info!(
                "Adding {} as {} to {}",
                id,
                if substrates { "substrate" } else { "product" },
                reaction_id
            );
            side.insert(id, metabolite);
        }
        Ok(side)
    }
}

/// Reaction ids listed in the `ALL_REAC` field of an enzyme entry, without duplicates
fn linked_reactions(enzyme_entry: &FlatFileEntry) -> Vec<String> {
    let mut reactions: Vec<String> = Vec::new();
    let lines = enzyme_entry.get("ALL_REAC").map(Vec::as_slice).unwrap_or_default();
    for token in lines.iter().flat_map(|l| l.split(' ')) {
        if let Some(found) = KEGG_REACTION.find(token) {
            let id = found.as_str().to_string();
            if !reactions.contains(&id) {
                reactions.push(id);
            }
        }
    }
    reactions
}

/// `NAME` lines with their trailing `;` removed
fn names(record: &FlatFileEntry) -> Vec<String> {
    record
        .get("NAME")
        .map(|lines| {
            lines
                .iter()
                .map(|l| l.trim().trim_end_matches(';').to_string())
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// The KEGG self link followed by every `DB: id` line of `DBLINKS`
fn db_links(entry_id: &str, record: &FlatFileEntry) -> IndexMap<String, String> {
    let mut links = IndexMap::from([("KEGG".to_string(), entry_id.to_string())]);
    for line in record.get("DBLINKS").into_iter().flatten() {
        if let Some((db, id)) = line.split_once(": ") {
            links.insert(db.trim().to_string(), id.trim().to_string());
        }
    }
    links
}

impl DatabaseExtraction for KeggExtraction {
    fn database_name(&self) -> &str {
        "KEGG"
    }

    fn enzymes(&self) -> &AssignedEnzymeMap {
        &self.enzymes
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn populate_reactions(&mut self) -> Result<(), ExtractionError> {
        info!("Executing KEGG Extractor");
        let enzymes: Vec<String> = self.enzymes.enzymes().cloned().collect();
        for enzyme in enzymes {
            let enzyme_entry = self.fetch_entry(&enzyme);
            for reaction_id in linked_reactions(&enzyme_entry) {
                self.record_reaction(&reaction_id, &enzyme, |kegg| kegg.fetch_entry(&reaction_id))?;
            }
        }
        Ok(())
    }

    fn resolve_metabolite(&mut self, metabolite_id: &str) -> Result<Rc<Metabolite>, ExtractionError> {
        self.resolve_with(metabolite_id, |kegg| kegg.fetch_entry(metabolite_id))
    }
}

impl ExtractionHooks for KeggExtraction {
    type MetaboliteRecord = FlatFileEntry;
    type ReactionRecord = FlatFileEntry;

    fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    fn metabolite_name(&self, metabolite_id: &str, record: &FlatFileEntry) -> Vec<String> {
        let names = names(record);
        if names.is_empty() {
            vec![metabolite_id.to_string()]
        } else {
            names
        }
    }

    fn metabolite_formula(&self, record: &FlatFileEntry) -> Option<String> {
        first_value(record, "FORMULA").map(|f| f.trim().to_string())
    }

    fn metabolite_charge(&self, _: &FlatFileEntry) -> Option<String> {
        None
    }

    fn metabolite_inchi(&self, _: &FlatFileEntry) -> Option<String> {
        None
    }

    fn metabolite_inchi_key(&self, _: &FlatFileEntry) -> Option<String> {
        None
    }

    fn metabolite_smiles(&self, _: &FlatFileEntry) -> Option<String> {
        None
    }

    fn metabolite_compartment(&self, _: &FlatFileEntry) -> Option<String> {
        None
    }

    fn metabolite_dblinks(&self, metabolite_id: &str, record: &FlatFileEntry) -> IndexMap<String, String> {
        db_links(metabolite_id, record)
    }

    fn reaction_name(&self, reaction_id: &str, record: &FlatFileEntry) -> Vec<String> {
        let names = names(record);
        if names.is_empty() {
            vec![reaction_id.to_string()]
        } else {
            names
        }
    }

    fn reaction_substrates(
        &mut self,
        reaction_id: &str,
        record: &FlatFileEntry,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        self.side_metabolites(reaction_id, record, true)
    }

    fn reaction_products(
        &mut self,
        reaction_id: &str,
        record: &FlatFileEntry,
    ) -> Result<IndexMap<String, Rc<Metabolite>>, ExtractionError> {
        self.side_metabolites(reaction_id, record, false)
    }

    fn reaction_reversibility(&self, record: &FlatFileEntry) -> bool {
        first_value(record, "EQUATION").is_some_and(|e| e.contains(EQUATION_MARKER))
    }

    fn reaction_dblinks(&self, reaction_id: &str, record: &FlatFileEntry) -> IndexMap<String, String> {
        db_links(reaction_id, record)
    }

    fn reaction_stoichiometry(
        &self,
        record: &FlatFileEntry,
        substrates: &IndexMap<String, Rc<Metabolite>>,
        products: &IndexMap<String, Rc<Metabolite>>,
    ) -> IndexMap<String, u32> {
        let Some(equation) = first_value(record, "EQUATION") else {
            return IndexMap::new();
        };
        let ids: Vec<String> = substrates.keys().chain(products.keys()).cloned().collect();
        stoichiometry(equation, &ids)
    }

    fn reaction_pathways(&self, record: &FlatFileEntry) -> Vec<String> {
        record
            .get("PATHWAY")
            .into_iter()
            .flatten()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::mock::MockClient;

    fn kegg_url(id: &str) -> String {
        fill_template(&Configuration::default().kegg_url, id)
    }

    const ENZYME_1: &str = "\
ENTRY       EC 3.6.1.1                  Enzyme
NAME        inorganic diphosphatase;
ALL_REAC    R00004;
            (other) R00004
///
";

    const ENZYME_2: &str = "\
ENTRY       EC 3.6.1.25                 Enzyme
ALL_REAC    R00004 > R09999
///
";

    const REACTION: &str = "\
ENTRY       R00004                      Reaction
NAME        diphosphate phosphohydrolase
EQUATION    C00013 + C00001 <=> 2 C00009
PATHWAY     rn00190  Oxidative phosphorylation
DBLINKS     RHEA: 24576
///
";

    const DIPHOSPHATE: &str = "\
ENTRY       C00013                      Compound
NAME        Diphosphate;
            Pyrophosphate
FORMULA     H4P2O7
DBLINKS     CAS: 2466-09-3
            ChEBI: 29888
///
";

    const WATER: &str = "\
ENTRY       C00001                      Compound
NAME        H2O;
            Water
FORMULA     H2O
///
";

    fn client() -> Rc<MockClient> {
        Rc::new(
            MockClient::default()
                .with(&kegg_url("3.6.1.1"), ENZYME_1)
                .with(&kegg_url("3.6.1.25"), ENZYME_2)
                .with(&kegg_url("R00004"), REACTION)
                .with(&kegg_url("C00013"), DIPHOSPHATE)
                .with(&kegg_url("C00001"), WATER),
        )
    }

    fn enzymes() -> Rc<AssignedEnzymeMap> {
        let mut enzymes = AssignedEnzymeMap::new();
        enzymes.insert("3.6.1.1", vec!["Rv3628".to_string()]).unwrap();
        enzymes
            .insert("3.6.1.25", vec!["Rv0001".to_string(), "Rv0002".to_string()])
            .unwrap();
        Rc::new(enzymes)
    }

    #[test]
    fn reactions_shared_by_enzymes() {
        let client = client();
        let mut kegg = KeggExtraction::new(&ExtractionArgs::new(enzymes(), client.clone())).unwrap();
        kegg.populate_reactions().unwrap();

        // R09999 can't be fetched and degrades to a reaction without metabolites
        assert_eq!(kegg.reactions().len(), 2);
        let reaction = &kegg.reactions()["R00004"];
        assert_eq!(reaction.enzymes, vec!["3.6.1.1", "3.6.1.25"]);
        assert_eq!(reaction.genes, vec!["Rv3628", "Rv0001", "Rv0002"]);
        assert_eq!(reaction.name, vec!["diphosphate phosphohydrolase"]);
        assert!(reaction.reversible);
        assert_eq!(reaction.pathways, vec!["rn00190"]);
        assert_eq!(reaction.db_links["KEGG"], "R00004");
        assert_eq!(reaction.db_links["RHEA"], "24576");
        assert_eq!(
            reaction.substrates.keys().collect::<Vec<_>>(),
            vec!["C00013", "C00001"]
        );
        assert_eq!(reaction.coefficient("C00009"), 2);
        assert_eq!(reaction.coefficient("C00001"), 1);
        assert_eq!(client.count(&kegg_url("R00004")), 1);

        let missing = &kegg.reactions()["R09999"];
        assert_eq!(missing.name, vec!["R09999"]);
        assert!(missing.substrates.is_empty());
        assert!(!missing.reversible);
    }

    #[test]
    fn compounds_are_fetched_once() {
        let client = client();
        let mut kegg = KeggExtraction::new(&ExtractionArgs::new(enzymes(), client.clone())).unwrap();
        let first = kegg.resolve_metabolite("C00013").unwrap();
        let second = kegg.resolve_metabolite("C00013").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(client.count(&kegg_url("C00013")), 1);
        assert_eq!(first.name, vec!["Diphosphate", "Pyrophosphate"]);
        assert_eq!(first.formula.as_deref(), Some("H4P2O7"));
        assert_eq!(first.charge, None);
        assert_eq!(
            first.db_links.keys().collect::<Vec<_>>(),
            vec!["KEGG", "CAS", "ChEBI"]
        );

        // Unknown compounds are named after their id
        let unknown = kegg.resolve_metabolite("C99999").unwrap();
        assert_eq!(unknown.name, vec!["C99999"]);
        assert_eq!(unknown.db_links["KEGG"], "C99999");
    }

    #[test]
    fn enzyme_reaction_links() {
        let entry = parse_flat_file(ENZYME_1);
        assert_eq!(linked_reactions(&entry), vec!["R00004"]);
        let entry = parse_flat_file(ENZYME_2);
        assert_eq!(linked_reactions(&entry), vec!["R00004", "R09999"]);
    }

    #[test]
    fn requires_enzymes() {
        let args = ExtractionArgs::new(Rc::new(AssignedEnzymeMap::new()), client());
        match KeggExtraction::new(&args) {
            Err(ExtractionError::NoAssignedEnzymes) => {}
            _ => panic!("Extraction constructed without enzymes"),
        }
    }
}
