//! Enzyme assignment, mapping the proteins of an organism to enzyme numbers
pub mod orthomcl;

use std::path::Path;

use thiserror::Error;

use crate::metabolic_model::enzyme::{AssignedEnzymeMap, EnzymeMapError};

/// A way of assigning enzyme numbers to the genes of an organism
///
/// Implementations start with an empty [`AssignedEnzymeMap`] and fill it in
/// [`EnzymeAssignment::assign_enzymes`]. The finished map is handed off by value with
/// [`EnzymeAssignment::into_assigned_enzymes`].
pub trait EnzymeAssignment {
    /// Name of the assignment method
    fn name(&self) -> &str;

    fn assigned_enzymes(&self) -> &AssignedEnzymeMap;

    /// Read the assignment input and record every enzyme number found for each gene
    fn assign_enzymes(&mut self, input: &Path) -> Result<(), AssignmentError>;

    fn into_assigned_enzymes(self: Box<Self>) -> AssignedEnzymeMap;
}

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Unable to read assignment input: {0}")]
    UnableToRead(#[from] csv::Error),
    #[error(transparent)]
    EnzymeMap(#[from] EnzymeMapError),
}
