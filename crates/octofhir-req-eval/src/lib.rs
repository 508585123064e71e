//! Requirement Evaluation Engine
//!
//! This crate decides whether patient-centric domain entities satisfy
//! declarative requirements and requirement sets:
//!
//! - **Operators**: set matching over linked definitions, latest numeric lab
//!   value against its normal range or a threshold, latest categorical lab
//!   value against accepted strings, each with a timeframe variant
//! - **Requirements**: every attached operator is tried in order; the first
//!   satisfied one decides
//! - **Requirement sets**: ALL / ANY / NONE over requirements and nested sets,
//!   with cycle and depth checks
//! - **Validation**: static diagnostics for requirements and whole catalogs
//!
//! # Example
//!
//! ```ignore
//! use octofhir_req_eval::{EvaluationContext, RequirementEngine, Subject};
//!
//! let engine = RequirementEngine::new();
//! let ctx = EvaluationContext::builder().build();
//! let eligible = engine.evaluate_set(&catalog, "eligibility", &Subject::new(patient), &ctx)?;
//! ```
//!
//! # Three-Valued Results
//!
//! Missing data never raises an error. The `assess*` methods return a
//! [`Satisfaction`] that keeps "not enough data" apart from "not satisfied";
//! the `evaluate*` methods project it to `bool`, treating indeterminate as
//! `false`.

pub mod composer;
pub mod context;
pub mod engine;
pub mod error;
pub mod operators;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod satisfaction;
pub mod subject;
pub mod validation;

pub use context::{
    EvaluationContext, EvaluationContextBuilder, EvaluationMode, EvaluationOptions, VacuousTimeframe,
};
pub use engine::RequirementEngine;
pub use error::{EvalError, EvalResult};
pub use operators::{CategoricalMatch, NumericComparison};
pub use registry::{OperatorFn, OperatorInput, OperatorRegistry};
pub use report::{EvaluationReport, ReportKind};
pub use resolver::{Demographics, TimeWindow};
pub use satisfaction::Satisfaction;
pub use subject::{ResolvedValues, Subject};
pub use validation::check_requirement;
