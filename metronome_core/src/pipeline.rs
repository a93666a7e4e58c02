//! The three stages of a reconstruction: enzyme assignment, data mining and merging
//!
//! Stages communicate through files, so they can be run as separate invocations: the
//! assigned enzymes are stored as JSON and every extracted network as an SBML model in the
//! output directory.
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;
use thiserror::Error;

use crate::assignment::AssignmentError;
use crate::configuration::Configuration;
use crate::extraction::{DatabaseExtraction, ExtractionArgs, ExtractionError};
use crate::io::rest::RestClient;
use crate::io::sbml::{write_model, SbmlError};
use crate::merge::tables::CanonicalTables;
use crate::merge::{MergeError, NetworkMerger};
use crate::metabolic_model::enzyme::AssignedEnzymeMap;
use crate::plugins::{assignment_registry, extraction_registry, PluginError, DATABASE_NAMESPACE};

/// Assign enzymes with the named assignment method
pub fn assign_enzymes(
    method: &str,
    input: &Path,
    client: Rc<dyn RestClient>,
) -> Result<AssignedEnzymeMap, PipelineError> {
    let mut assignment = assignment_registry()?.discover_one(method, &client)?;
    info!("Assigning enzymes with {}", assignment.name());
    assignment.assign_enzymes(input)?;
    Ok(assignment.into_assigned_enzymes())
}

/// Store assigned enzymes as a JSON object, {enzyme number: [genes]}
pub fn save_enzymes(enzymes: &AssignedEnzymeMap, path: &Path) -> Result<(), PipelineError> {
    fs::write(path, serde_json::to_string_pretty(enzymes)?)?;
    Ok(())
}

/// Read assigned enzymes stored by [`save_enzymes`], validating every entry
pub fn load_enzymes(path: &Path) -> Result<AssignedEnzymeMap, PipelineError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Extract the reactions of the assigned enzymes and write one model per source
///
/// `databases` names the web service sources to query, every one of them if empty and no
/// model file is given. `model_files` pairs a model file source with the file to read.
///
/// # Returns
/// The paths of the written models
pub fn mine_reactions(
    args: &ExtractionArgs,
    databases: &[String],
    model_files: &[(String, PathBuf)],
    output: &Path,
    model_name: &str,
) -> Result<Vec<PathBuf>, PipelineError> {
    let registry = extraction_registry()?;
    let mut extractors: Vec<Box<dyn DatabaseExtraction>> = Vec::new();
    if databases.is_empty() && model_files.is_empty() {
        extractors.extend(registry.discover(DATABASE_NAMESPACE, args));
    }
    for database in databases {
        extractors.push(registry.discover_one(database, args)?);
    }
    for (unit, file) in model_files {
        let file_args = args.clone().with_model_file(file);
        extractors.push(registry.discover_one(unit, &file_args)?);
    }

    fs::create_dir_all(output)?;
    let mut written = Vec::new();
    for mut extractor in extractors {
        info!("Mining reactions from {}", extractor.database_name());
        extractor.populate_reactions()?;
        info!(
            "{}: {} reactions and {} metabolites",
            extractor.database_name(),
            extractor.reactions().len(),
            extractor.metabolites().len()
        );
        written.push(write_model(
            extractor.model(),
            output,
            model_name,
            extractor.database_name(),
        )?);
    }
    Ok(written)
}

/// Merge every model in `directory` into a MetaNetX network written to the same directory
pub fn merge_networks(
    enzymes: &Rc<AssignedEnzymeMap>,
    client: &dyn RestClient,
    directory: &Path,
    model_name: &str,
) -> Result<PathBuf, PipelineError> {
    let tables = CanonicalTables::load(client, &Configuration::current())?;
    let mut merger = NetworkMerger::new(enzymes, tables, directory)?;
    merger.populate_reactions()?;
    Ok(write_model(
        merger.model(),
        directory,
        model_name,
        merger.database_name(),
    )?)
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Sbml(#[from] SbmlError),
    #[error("Unable to access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid enzyme file: {0}")]
    InvalidEnzymes(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::mock::MockClient;
    use crate::io::sbml::read_sbml;

    const METACYC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml level="2" version="1">
  <model id="MetaCyc">
    <listOfSpecies>
      <species id="WATER" name="H2O" compartment="CCO-CYTOSOL"/>
      <species id="PPI" name="diphosphate" compartment="CCO-CYTOSOL"/>
      <species id="Pi" name="phosphate" compartment="CCO-CYTOSOL"/>
    </listOfSpecies>
    <listOfReactions>
      <reaction id="INORGPYROPHOSPHAT-RXN" reversible="false">
        <notes>
          <html xmlns="http://www.w3.org/1999/xhtml">
            <p>EC Number: EC-3.6.1.1</p>
          </html>
        </notes>
        <listOfReactants>
          <speciesReference species="PPI"/>
          <speciesReference species="WATER"/>
        </listOfReactants>
        <listOfProducts>
          <speciesReference species="Pi" stoichiometry="2"/>
        </listOfProducts>
      </reaction>
    </listOfReactions>
  </model>
</sbml>"#;

    fn enzymes() -> Rc<AssignedEnzymeMap> {
        let mut enzymes = AssignedEnzymeMap::new();
        enzymes.insert("3.6.1.1", vec!["Rv3628".to_string()]).unwrap();
        Rc::new(enzymes)
    }

    #[test]
    fn enzymes_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enzymes.json");
        save_enzymes(&enzymes(), &path).unwrap();
        assert_eq!(load_enzymes(&path).unwrap(), *enzymes());

        fs::write(&path, r#"{"3.6.1": ["Rv3628"]}"#).unwrap();
        match load_enzymes(&path) {
            Err(PipelineError::InvalidEnzymes(_)) => {}
            _ => panic!("Invalid enzyme number accepted"),
        }
    }

    #[test]
    fn unknown_method_or_source() {
        let client: Rc<dyn RestClient> = Rc::new(MockClient::default());
        match assign_enzymes("blast", Path::new("groups.tsv"), client.clone()) {
            Err(PipelineError::Plugin(PluginError::NotFound(name))) => assert_eq!(name, "blast"),
            _ => panic!("Unknown assignment method found"),
        }
        let dir = tempfile::tempdir().unwrap();
        let args = ExtractionArgs::new(enzymes(), client);
        match mine_reactions(&args, &["brenda".to_string()], &[], dir.path(), "mtb") {
            Err(PipelineError::Plugin(PluginError::NotFound(name))) => assert_eq!(name, "brenda"),
            _ => panic!("Unknown source found"),
        }
    }

    #[test]
    fn mine_then_merge() {
        let dir = tempfile::tempdir().unwrap();
        let model_file = dir.path().join("metacyc.sbml.in");
        fs::write(&model_file, METACYC).unwrap();
        let output = dir.path().join("models");

        let config = Configuration::default();
        let client = Rc::new(
            MockClient::default()
                .with(
                    &config.metanetx_reaction_xref_url,
                    "metacyc:INORGPYROPHOSPHAT-RXN\tMNXR999\n",
                )
                .with(
                    &config.metanetx_reaction_properties_url,
                    "MNXR999\t1 MNXM13 + 1 MNXM2 = 2 MNXM9\tdiphosphate phosphohydrolase\n",
                )
                .with(&config.metanetx_chemical_xref_url, "kegg:C00001\tMNXM2\n")
                .with(&config.metanetx_chemical_properties_url, "MNXM2\tH2O\tH2O\n"),
        );
        let args = ExtractionArgs::new(enzymes(), client.clone());
        let written = mine_reactions(
            &args,
            &[],
            &[("metacyc".to_string(), model_file)],
            &output,
            "mtb",
        )
        .unwrap();
        assert_eq!(written, vec![output.join("mtb_MetaCyc.xml")]);

        let merged = merge_networks(&enzymes(), &*client, &output, "mtb").unwrap();
        assert_eq!(merged, output.join("mtb_MetaNetX.xml"));
        let document = read_sbml(&merged).unwrap();
        assert_eq!(document.reactions().len(), 1);
        let reaction = &document.reactions()[0];
        assert_eq!(reaction.id, "MNXR999");
        assert_eq!(reaction.notes_map()["GENE_ASSOCIATION"], "Rv3628");
        assert_eq!(reaction.notes_map()["METACYC"], "INORGPYROPHOSPHAT-RXN");
        assert_eq!(document.species().len(), 3);
    }
}
