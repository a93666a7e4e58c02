//! The built-in extraction sources
pub mod kegg;
pub mod metacyc;
