//! Registry of the pluggable stages: enzyme assignment methods and extraction sources
//!
//! Every unit is registered under a namespace together with a constructor. The pipeline either
//! instantiates every unit of a namespace ([`PluginRegistry::discover`]) or one unit by name
//! ([`PluginRegistry::discover_one`]).
use std::error::Error as StdError;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, warn};
use thiserror::Error;

use crate::assignment::orthomcl::OrthoMcl;
use crate::assignment::EnzymeAssignment;
use crate::extraction::{DatabaseExtraction, ExtractionArgs};
use crate::io::rest::RestClient;
use crate::sources::kegg::KeggExtraction;
use crate::sources::metacyc::MetaCycExtraction;

/// Namespace of the extraction sources queried through a web service
pub const DATABASE_NAMESPACE: &str = "database";
/// Namespace of the extraction sources reading a model file
pub const SBML_NAMESPACE: &str = "sbml";
/// Namespace of the enzyme assignment methods
pub const ASSIGNMENT_NAMESPACE: &str = "assignment";

/// Builds a unit from the shared construction arguments
pub type Constructor<C, A> = fn(&A) -> Result<Box<C>, Box<dyn StdError>>;

struct Unit<C: ?Sized, A> {
    namespace: String,
    constructor: Constructor<C, A>,
}

/// Units implementing the capability `C`, all constructed from arguments of type `A`
pub struct PluginRegistry<C: ?Sized, A> {
    units: IndexMap<String, Unit<C, A>>,
}

impl<C: ?Sized, A> Default for PluginRegistry<C, A> {
    fn default() -> Self {
        PluginRegistry {
            units: IndexMap::new(),
        }
    }
}

impl<C: ?Sized, A> PluginRegistry<C, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit, unit names must be unique across namespaces
    pub fn register(
        &mut self,
        namespace: &str,
        unit: &str,
        constructor: Constructor<C, A>,
    ) -> Result<(), PluginError> {
        if self.units.contains_key(unit) {
            return Err(PluginError::Duplicate(unit.to_string()));
        }
        self.units.insert(
            unit.to_string(),
            Unit {
                namespace: namespace.to_string(),
                constructor,
            },
        );
        Ok(())
    }

    /// Register a unit, consuming and returning the registry
    pub fn with(
        mut self,
        namespace: &str,
        unit: &str,
        constructor: Constructor<C, A>,
    ) -> Result<Self, PluginError> {
        self.register(namespace, unit, constructor)?;
        Ok(self)
    }

    /// Instantiate every unit of a namespace, in registration order
    ///
    /// Units failing to construct are logged and left out.
    pub fn discover(&self, namespace: &str, args: &A) -> Vec<Box<C>> {
        let mut instances = Vec::new();
        for (name, unit) in self.units.iter().filter(|(_, u)| u.namespace == namespace) {
            match (unit.constructor)(args) {
                Ok(instance) => {
                    debug!("Loaded {} from {}", name, namespace);
                    instances.push(instance);
                }
                Err(e) => warn!("Unable to load {} from {}: {}", name, namespace, e),
            }
        }
        instances
    }

    /// Instantiate a single unit by name
    pub fn discover_one(&self, unit: &str, args: &A) -> Result<Box<C>, PluginError> {
        let found = self
            .units
            .get(unit)
            .ok_or_else(|| PluginError::NotFound(unit.to_string()))?;
        (found.constructor)(args).map_err(|source| PluginError::Construction {
            unit: unit.to_string(),
            source,
        })
    }

    /// Names of the units registered in a namespace
    pub fn unit_names(&self, namespace: &str) -> Vec<&str> {
        self.units
            .iter()
            .filter(|(_, u)| u.namespace == namespace)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// The built-in extraction sources
pub fn extraction_registry() -> Result<PluginRegistry<dyn DatabaseExtraction, ExtractionArgs>, PluginError> {
    PluginRegistry::<dyn DatabaseExtraction, ExtractionArgs>::new()
        .with(DATABASE_NAMESPACE, "kegg", |args| {
            Ok(Box::new(KeggExtraction::new(args)?))
        })?
        .with(SBML_NAMESPACE, "metacyc", |args| {
            Ok(Box::new(MetaCycExtraction::new(args)?))
        })
}

/// The built-in enzyme assignment methods
pub fn assignment_registry() -> Result<PluginRegistry<dyn EnzymeAssignment, Rc<dyn RestClient>>, PluginError> {
    PluginRegistry::<dyn EnzymeAssignment, Rc<dyn RestClient>>::new().with(
        ASSIGNMENT_NAMESPACE,
        "orthomcl",
        |client| Ok(Box::new(OrthoMcl::new(Rc::clone(client)))),
    )
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("No plugin named {0}")]
    NotFound(String),
    #[error("A plugin named {0} is already registered")]
    Duplicate(String),
    #[error("Unable to construct plugin {unit}: {source}")]
    Construction {
        unit: String,
        source: Box<dyn StdError>,
    },
}
