//! Module for reading and writing models, and for talking to upstream sources
pub mod equation;
pub mod flat_file;
pub mod notes;
pub mod rest;
pub mod sbml;
