//! Enzyme assignment from OrthoMCL ortholog group membership
use std::path::Path;
use std::rc::Rc;

use csv::ReaderBuilder;
use log::{info, warn};
use serde::Deserialize;

use crate::assignment::{AssignmentError, EnzymeAssignment};
use crate::configuration::{fill_template, Configuration};
use crate::io::rest::RestClient;
use crate::metabolic_model::enzyme::{AssignedEnzymeMap, EC_SEARCH_PATTERN};

/// Group name of proteins OrthoMCL couldn't place in any group
const NO_GROUP: &str = "NO_GROUP";

/// Assigns enzymes by looking up the enzyme numbers of each protein's ortholog group
///
/// The input is the tab separated `protein \t group` table OrthoMCL produces.
pub struct OrthoMcl {
    client: Rc<dyn RestClient>,
    assigned_enzymes: AssignedEnzymeMap,
}

impl OrthoMcl {
    pub fn new(client: Rc<dyn RestClient>) -> Self {
        OrthoMcl {
            client,
            assigned_enzymes: AssignedEnzymeMap::new(),
        }
    }

    /// Enzyme numbers of an ortholog group
    ///
    /// # Returns
    /// `None` if the lookup failed, otherwise the numbers found in the first field of the
    /// response (possibly none)
    pub fn group_enzymes(&self, group: &str) -> Option<Vec<String>> {
        let url = fill_template(&Configuration::current().orthomcl_url, group);
        let body = match self.client.get_text(&url) {
            Ok(body) => body,
            Err(e) => {
                warn!("Lookup of group {} failed: {}", group, e);
                return None;
            }
        };
        match first_field(&body) {
            Ok(Some(text)) => Some(
                EC_SEARCH_PATTERN
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string())
                    .collect(),
            ),
            Ok(None) => Some(Vec::new()),
            Err(e) => {
                warn!("Unable to parse the response for group {}: {}", group, e);
                None
            }
        }
    }
}

impl EnzymeAssignment for OrthoMcl {
    fn name(&self) -> &str {
        "OrthoMCL"
    }

    fn assigned_enzymes(&self) -> &AssignedEnzymeMap {
        &self.assigned_enzymes
    }

    fn assign_enzymes(&mut self, input: &Path) -> Result<(), AssignmentError> {
        info!("Assigning enzymes from {}", input.display());
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_path(input)?;
        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed row {}: {}", row + 1, e);
                    continue;
                }
            };
            let (protein, group) = match (record.get(0), record.get(1)) {
                (Some(protein), Some(group)) if !protein.trim().is_empty() => {
                    (protein.trim(), group.trim())
                }
                _ => {
                    warn!("Skipping row {} with fewer than two fields", row + 1);
                    continue;
                }
            };
            if group == NO_GROUP {
                continue;
            }
            let Some(enzymes) = self.group_enzymes(group) else {
                continue;
            };
            info!("{} ({}): {:?}", protein, group, enzymes);
            for enzyme in enzymes {
                self.assigned_enzymes.append_gene(&enzyme, protein)?;
            }
        }
        info!("Assigned {} enzyme numbers", self.assigned_enzymes.len());
        Ok(())
    }

    fn into_assigned_enzymes(self: Box<Self>) -> AssignedEnzymeMap {
        self.assigned_enzymes
    }
}

// region Group lookup response
#[derive(Debug, Deserialize)]
#[serde(rename = "response")]
struct GroupResponse {
    #[serde(rename = "recordset", default)]
    record_sets: Vec<RecordSet>,
}

#[derive(Debug, Deserialize)]
struct RecordSet {
    #[serde(rename = "record", default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "field", default)]
    fields: Vec<Field>,
}

#[derive(Debug, Deserialize)]
struct Field {
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

/// Text of the first `<field>` of a lookup response
fn first_field(xml: &str) -> Result<Option<String>, quick_xml::DeError> {
    let response: GroupResponse = quick_xml::de::from_str(xml)?;
    Ok(response
        .record_sets
        .into_iter()
        .flat_map(|set| set.records)
        .flat_map(|record| record.fields)
        .next()
        .and_then(|field| field.text))
}
// endregion Group lookup response
