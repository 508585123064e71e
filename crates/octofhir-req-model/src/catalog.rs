//! Named collection of rule definitions

use crate::definitions::{Requirement, RequirementSet};
use crate::error::ModelError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Requirements and requirement sets, looked up by name.
///
/// Sets reference their members by name so that the set graph, including
/// any cycles an administrator introduced, can be represented and checked.
#[derive(Debug, Clone, Default)]
pub struct RequirementCatalog {
    requirements: IndexMap<String, Requirement>,
    sets: IndexMap<String, RequirementSet>,
}

/// On-disk shape of a catalog
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    requirement_sets: Vec<RequirementSet>,
}

impl RequirementCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON document form
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| ModelError::ParseError(e.to_string()))?;
        let mut catalog = Self::new();
        for requirement in document.requirements {
            catalog.add_requirement(requirement)?;
        }
        for set in document.requirement_sets {
            catalog.add_set(set)?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        let document = CatalogDocument {
            requirements: self.requirements.values().cloned().collect(),
            requirement_sets: self.sets.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&document).map_err(|e| ModelError::SerializeError(e.to_string()))
    }

    pub fn add_requirement(&mut self, requirement: Requirement) -> Result<(), ModelError> {
        if self.requirements.contains_key(&requirement.name) {
            return Err(ModelError::DuplicateDefinition {
                kind: "requirement",
                name: requirement.name,
            });
        }
        self.requirements.insert(requirement.name.clone(), requirement);
        Ok(())
    }

    pub fn add_set(&mut self, set: RequirementSet) -> Result<(), ModelError> {
        if self.sets.contains_key(&set.name) {
            return Err(ModelError::DuplicateDefinition {
                kind: "requirement set",
                name: set.name,
            });
        }
        self.sets.insert(set.name.clone(), set);
        Ok(())
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Result<Self, ModelError> {
        self.add_requirement(requirement)?;
        Ok(self)
    }

    pub fn with_set(mut self, set: RequirementSet) -> Result<Self, ModelError> {
        self.add_set(set)?;
        Ok(self)
    }

    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.get(name)
    }

    pub fn set(&self, name: &str) -> Option<&RequirementSet> {
        self.sets.get(name)
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    pub fn sets(&self) -> impl Iterator<Item = &RequirementSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.requirements.len() + self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
