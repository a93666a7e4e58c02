//! Core rust implementation of Metronome, a framework for the draft reconstruction of
//! metabolic networks.
//!
//! A reconstruction runs in three stages:
//! 1. [`assignment`]: assign enzyme numbers to the genes of an organism
//! 2. [`extraction`] and [`sources`]: extract the reactions catalysed by those enzymes from
//!    several databases
//! 3. [`merge`]: map the reactions of every source to MetaNetX and merge them into one network
//!
//! The [`plugins`] registry makes the assignment methods and sources selectable by name, and
//! [`pipeline`] chains the stages together.

pub mod assignment;
pub mod configuration;
pub mod extraction;
pub mod io;
pub mod merge;
pub mod metabolic_model;
pub mod pipeline;
pub mod plugins;
pub mod sources;
