//! Operator registry
//!
//! Maps operator names to their decision procedures. The standard operators
//! are built once and shared by every registry created with
//! [`OperatorRegistry::with_standard_operators`].

use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::operators;
use crate::resolver::TimeWindow;
use crate::satisfaction::Satisfaction;
use crate::subject::ResolvedValues;
use indexmap::IndexMap;
use octofhir_req_model::{Requirement, RequirementLinks};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Everything an operator may look at
#[derive(Debug, Clone, Copy)]
pub struct OperatorInput<'a> {
    /// The requirement being evaluated (expected values, thresholds, window)
    pub requirement: &'a Requirement,
    /// Links exposed by the subject
    pub subject: &'a RequirementLinks,
    /// Candidate lab readings and demographics
    pub values: &'a ResolvedValues<'a>,
    pub context: &'a EvaluationContext,
    /// Accepted values of a regex requirement, compiled once per evaluation
    pub patterns: &'a [Regex],
}

impl OperatorInput<'_> {
    /// The requirement's timeframe window at the evaluation instant
    pub fn window(&self) -> EvalResult<TimeWindow> {
        TimeWindow::for_requirement(self.requirement, self.context.now())
    }
}

/// Type alias for operator implementations
pub type OperatorFn = Arc<dyn Fn(&OperatorInput<'_>) -> EvalResult<Satisfaction> + Send + Sync>;

static STANDARD_OPERATORS: Lazy<OperatorRegistry> = Lazy::new(|| {
    let mut registry = OperatorRegistry::new();
    operators::register_standard(&mut registry);
    registry
});

/// Registry of named operators
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: IndexMap<String, OperatorFn>,
}

impl OperatorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the standard operators
    pub fn with_standard_operators() -> Self {
        STANDARD_OPERATORS.clone()
    }

    /// Register an operator, replacing any operator of the same name
    pub fn register(&mut self, name: impl Into<String>, implementation: OperatorFn) {
        self.operators.insert(name.into(), implementation);
    }

    /// Register a plain function or closure as an operator
    pub fn register_fn<F>(&mut self, name: impl Into<String>, implementation: F)
    where
        F: Fn(&OperatorInput<'_>) -> EvalResult<Satisfaction> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(implementation));
    }

    /// Get an operator implementation
    pub fn get(&self, name: &str) -> Option<&OperatorFn> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .finish()
    }
}
