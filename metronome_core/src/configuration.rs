//! Process wide configuration: upstream endpoints and file layout defaults
use std::fs;
use std::path::Path;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// KEGG REST `get` endpoint, `{}` is replaced by the entry id
    pub kegg_url: String,
    /// OrthoMCL group lookup, `{}` is replaced by the group name
    pub orthomcl_url: String,
    pub metanetx_reaction_xref_url: String,
    pub metanetx_reaction_properties_url: String,
    pub metanetx_chemical_xref_url: String,
    pub metanetx_chemical_properties_url: String,
    /// Compartment given to metabolites whose source doesn't report one
    pub default_compartment: String,
    /// Extensions of the model files considered when merging
    pub model_extensions: Vec<String>,
    /// Extension of the model files written by the extraction stage
    pub output_extension: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            kegg_url: "http://rest.kegg.jp/get/{}".to_string(),
            orthomcl_url: "http://www.orthomcl.org/webservices/GroupQuestions/ByNameList.xml?group_names_data={}&o-fields=ec_numbers".to_string(),
            metanetx_reaction_xref_url: "https://www.metanetx.org/cgi-bin/mnxget/mnxref/reac_xref.tsv".to_string(),
            metanetx_reaction_properties_url: "https://www.metanetx.org/cgi-bin/mnxget/mnxref/reac_prop.tsv".to_string(),
            metanetx_chemical_xref_url: "https://www.metanetx.org/cgi-bin/mnxget/mnxref/chem_xref.tsv".to_string(),
            metanetx_chemical_properties_url: "https://www.metanetx.org/cgi-bin/mnxget/mnxref/chem_prop.tsv".to_string(),
            default_compartment: "Intracellular".to_string(),
            model_extensions: vec!["xml".to_string(), "sbml".to_string()],
            output_extension: "xml".to_string(),
        }
    }
}

impl Configuration {
    /// Read a configuration from a JSON file, fields not present keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Configuration, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Replace the process wide configuration
    pub fn install(self) {
        *CONFIGURATION.write().unwrap_or_else(PoisonError::into_inner) = self;
    }

    /// Snapshot of the process wide configuration
    pub fn current() -> Configuration {
        CONFIGURATION
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Substitute an id into a `{}` url template
pub(crate) fn fill_template(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}

pub(crate) fn default_compartment() -> String {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .default_compartment
        .clone()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file: {0}")]
    UnableToRead(#[from] std::io::Error),
    #[error("Unable to parse configuration file: {0}")]
    UnableToParse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kegg_url": "http://localhost/kegg/{{}}"}}"#).unwrap();
        let config = Configuration::from_json_file(file.path()).unwrap();
        assert_eq!(config.kegg_url, "http://localhost/kegg/{}");
        assert_eq!(config.default_compartment, "Intracellular");
        assert_eq!(config.model_extensions, vec!["xml", "sbml"]);
    }

    #[test]
    fn template_substitution() {
        assert_eq!(
            fill_template("http://rest.kegg.jp/get/{}", "ec:1.1.1.1"),
            "http://rest.kegg.jp/get/ec:1.1.1.1"
        );
    }
}
