//! Evaluation context and options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How strictly the engine treats its inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Unsupported inputs evaluate to `false`; lab readings are resolved
    /// from a patient when none were supplied explicitly
    #[default]
    Loose,
    /// Unsupported inputs are errors; lab operators only look at readings
    /// passed in explicitly
    Strict,
}

/// Outcome of a timeframe requirement that lists no entity categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacuousTimeframe {
    #[default]
    Pass,
    Fail,
}

/// Engine options, deserializable from application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    pub mode: EvaluationMode,
    pub vacuous_timeframe: VacuousTimeframe,
    /// Maximum nesting of requirement sets
    pub max_set_depth: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Loose,
            vacuous_timeframe: VacuousTimeframe::Pass,
            max_set_depth: 64,
        }
    }
}

/// Everything an evaluation needs besides the rule and the subject.
///
/// The evaluation instant is captured once so that every timeframe window in
/// a batch refers to the same `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    now: DateTime<Utc>,
    options: EvaluationOptions,
}

impl EvaluationContext {
    /// Create a context for a fixed instant with default options
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            options: EvaluationOptions::default(),
        }
    }

    /// Create a builder
    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn mode(&self) -> EvaluationMode {
        self.options.mode
    }

    pub fn is_strict(&self) -> bool {
        self.options.mode == EvaluationMode::Strict
    }
}

/// Builder for [`EvaluationContext`]
#[derive(Debug, Clone, Default)]
pub struct EvaluationContextBuilder {
    now: Option<DateTime<Utc>>,
    options: EvaluationOptions,
}

impl EvaluationContextBuilder {
    /// Fix the evaluation instant (defaults to the current time)
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn vacuous_timeframe(mut self, policy: VacuousTimeframe) -> Self {
        self.options.vacuous_timeframe = policy;
        self
    }

    pub fn max_set_depth(mut self, depth: usize) -> Self {
        self.options.max_set_depth = depth;
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            now: self.now.unwrap_or_else(Utc::now),
            options: self.options,
        }
    }
}
