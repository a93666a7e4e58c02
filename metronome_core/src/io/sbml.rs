//! Module providing SBML IO for metronome Models
//!
//! Only the parts of SBML the pipeline needs are modelled: compartments, species, reactions,
//! their species references and XHTML notes. Anything else in a file being read is ignored.
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::notes::{metabolite_notes, notes_to_map, reaction_notes};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

const SBML_NAMESPACE: &str = "http://www.sbml.org/sbml/level3/version2/core";
const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

// region SBML Document
/// Represents an SBML document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename = "sbml")]
pub struct SbmlDocument {
    #[serde(rename = "@xmlns", default = "sbml_namespace")]
    pub xmlns: String,
    #[serde(rename = "@level", default = "default_level")]
    pub level: u32,
    #[serde(rename = "@version", default = "default_version")]
    pub version: u32,
    pub model: SbmlModel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SbmlModel {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "listOfCompartments", default)]
    pub list_of_compartments: ListOfCompartments,
    #[serde(rename = "listOfSpecies", default)]
    pub list_of_species: ListOfSpecies,
    #[serde(rename = "listOfReactions", default)]
    pub list_of_reactions: ListOfReactions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOfCompartments {
    #[serde(rename = "compartment", default)]
    pub compartments: Vec<SbmlCompartment>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOfSpecies {
    #[serde(rename = "species", default)]
    pub species: Vec<SbmlSpecies>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOfReactions {
    #[serde(rename = "reaction", default)]
    pub reactions: Vec<SbmlReaction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SbmlCompartment {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@constant", default = "default_true")]
    pub constant: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SbmlSpecies {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@compartment", default, skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
    #[serde(rename = "@hasOnlySubstanceUnits", default)]
    pub has_only_substance_units: bool,
    #[serde(rename = "@boundaryCondition", default)]
    pub boundary_condition: bool,
    #[serde(rename = "@constant", default)]
    pub constant: bool,
    /// Charge from the flux balance constraints package, only read
    #[serde(rename = "@fbc:charge", alias = "@charge", default, skip_serializing)]
    pub fbc_charge: Option<String>,
    /// Formula from the flux balance constraints package, only read
    #[serde(rename = "@fbc:chemicalFormula", alias = "@chemicalFormula", default, skip_serializing)]
    pub fbc_formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<SbmlNotes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SbmlReaction {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@reversible", default, skip_serializing_if = "Option::is_none")]
    pub reversible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<SbmlNotes>,
    #[serde(rename = "listOfReactants", default, skip_serializing_if = "Option::is_none")]
    pub reactants: Option<ListOfSpeciesReferences>,
    #[serde(rename = "listOfProducts", default, skip_serializing_if = "Option::is_none")]
    pub products: Option<ListOfSpeciesReferences>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOfSpeciesReferences {
    #[serde(rename = "speciesReference", default)]
    pub references: Vec<SpeciesReference>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesReference {
    #[serde(rename = "@species")]
    pub species: String,
    #[serde(rename = "@stoichiometry", default, skip_serializing_if = "Option::is_none")]
    pub stoichiometry: Option<f64>,
    #[serde(rename = "@constant", default = "default_true")]
    pub constant: bool,
}

/// XHTML notes attached to a species or reaction
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SbmlNotes {
    #[serde(alias = "html")]
    pub body: NotesBody,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesBody {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "p", default)]
    pub paragraphs: Vec<String>,
}

fn sbml_namespace() -> String {
    SBML_NAMESPACE.to_string()
}

fn default_level() -> u32 {
    3
}

fn default_version() -> u32 {
    2
}

fn default_true() -> bool {
    true
}
// endregion SBML Document

// region Conversions
impl From<Vec<String>> for SbmlNotes {
    fn from(paragraphs: Vec<String>) -> Self {
        SbmlNotes {
            body: NotesBody {
                xmlns: Some(XHTML_NAMESPACE.to_string()),
                paragraphs,
            },
        }
    }
}

impl From<&Metabolite> for SbmlSpecies {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: Some(m.primary_name().to_string()),
            compartment: Some(m.compartment.clone()),
            has_only_substance_units: false,
            boundary_condition: false,
            constant: false,
            fbc_charge: None,
            fbc_formula: None,
            notes: Some(metabolite_notes(m).into()),
        }
    }
}

impl From<&Reaction> for SbmlReaction {
    fn from(r: &Reaction) -> Self {
        let references = |side: &IndexMap<String, Rc<Metabolite>>| ListOfSpeciesReferences {
            references: side
                .keys()
                .map(|met_id| SpeciesReference {
                    species: met_id.clone(),
                    stoichiometry: Some(f64::from(r.coefficient(met_id))),
                    constant: true,
                })
                .collect(),
        };
        Self {
            id: r.id.clone(),
            name: Some(r.primary_name().to_string()),
            reversible: Some(r.reversible),
            notes: Some(reaction_notes(r).into()),
            reactants: Some(references(&r.substrates)),
            products: Some(references(&r.products)),
        }
    }
}

impl SbmlDocument {
    /// Build an SBML document from a Model
    pub fn from_model(model: &Model, id: &str, name: &str) -> Self {
        let compartments = model
            .compartments()
            .into_iter()
            .map(|c| SbmlCompartment {
                id: c.clone(),
                name: Some(c),
                constant: true,
            })
            .collect();
        SbmlDocument {
            xmlns: sbml_namespace(),
            level: default_level(),
            version: default_version(),
            model: SbmlModel {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                list_of_compartments: ListOfCompartments { compartments },
                list_of_species: ListOfSpecies {
                    species: model
                        .metabolites
                        .values()
                        .map(|m| SbmlSpecies::from(m.as_ref()))
                        .collect(),
                },
                list_of_reactions: ListOfReactions {
                    reactions: model.reactions.values().map(SbmlReaction::from).collect(),
                },
            },
        }
    }

    /// Parse an SBML document from a string
    pub fn from_xml(xml: &str) -> Result<Self, SbmlError> {
        quick_xml::de::from_str(xml).map_err(|e| SbmlError::UnableToParse(e.to_string()))
    }

    /// Serialize the document, including the XML declaration
    pub fn to_xml(&self) -> Result<String, SbmlError> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| SbmlError::UnableToSerialize(e.to_string()))?;
        Ok(format!("{}{}", XML_DECLARATION, body))
    }

    pub fn species(&self) -> &[SbmlSpecies] {
        &self.model.list_of_species.species
    }

    pub fn reactions(&self) -> &[SbmlReaction] {
        &self.model.list_of_reactions.reactions
    }

    /// Find a species by id
    pub fn find_species(&self, id: &str) -> Option<&SbmlSpecies> {
        self.species().iter().find(|s| s.id == id)
    }
}

impl SbmlReaction {
    /// Notes of the reaction as a {key: value} map
    pub fn notes_map(&self) -> IndexMap<String, String> {
        notes_map(&self.notes)
    }

    pub fn reactant_references(&self) -> &[SpeciesReference] {
        self.reactants
            .as_ref()
            .map(|l| l.references.as_slice())
            .unwrap_or_default()
    }

    pub fn product_references(&self) -> &[SpeciesReference] {
        self.products
            .as_ref()
            .map(|l| l.references.as_slice())
            .unwrap_or_default()
    }
}

impl SbmlSpecies {
    /// Notes of the species as a {key: value} map
    pub fn notes_map(&self) -> IndexMap<String, String> {
        notes_map(&self.notes)
    }
}

fn notes_map(notes: &Option<SbmlNotes>) -> IndexMap<String, String> {
    notes
        .as_ref()
        .map(|n| notes_to_map(&n.body.paragraphs))
        .unwrap_or_default()
}
// endregion Conversions

// region Reading and Writing
/// Read an SBML file
pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<SbmlDocument, SbmlError> {
    let xml = fs::read_to_string(path)?;
    SbmlDocument::from_xml(&xml)
}

/// Write an SBML document to a file
pub fn write_sbml<P: AsRef<Path>>(document: &SbmlDocument, path: P) -> Result<(), SbmlError> {
    fs::write(path, document.to_xml()?)?;
    Ok(())
}

/// Write the model extracted from one database to `{directory}/{model_name}_{database_name}.{ext}`
///
/// # Returns
/// The path of the written file
pub fn write_model(
    model: &Model,
    directory: &Path,
    model_name: &str,
    database_name: &str,
) -> Result<PathBuf, SbmlError> {
    let id = format!("{}_{}", model_name, database_name);
    let extension = Configuration::current().output_extension;
    let path = directory.join(format!("{}.{}", id, extension));
    write_sbml(&SbmlDocument::from_model(model, &id, model_name), &path)?;
    Ok(path)
}
// endregion Reading and Writing

#[derive(Debug, Error)]
pub enum SbmlError {
    #[error("Unable to access SBML file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse SBML: {0}")]
    UnableToParse(String),
    #[error("Unable to serialize SBML: {0}")]
    UnableToSerialize(String),
}
