//! This module provides the validated entities every extraction source produces.

pub mod enzyme;
pub mod metabolite;
pub mod model;
pub mod reaction;

use thiserror::Error;

use crate::metabolic_model::enzyme::EnzymeMapError;
use crate::metabolic_model::metabolite::MetaboliteBuilderError;
use crate::metabolic_model::reaction::ReactionBuilderError;

/// Errors raised when an entity fails validation
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Invalid metabolite {id}: {source}")]
    InvalidMetabolite {
        id: String,
        source: MetaboliteBuilderError,
    },
    #[error("Invalid reaction {id}: {source}")]
    InvalidReaction {
        id: String,
        source: ReactionBuilderError,
    },
    #[error(transparent)]
    EnzymeMap(#[from] EnzymeMapError),
}
