//! Evaluation reports
//!
//! A report mirrors the structure of an evaluated requirement set: one node
//! per set with its combination type and one leaf per requirement. Each node
//! carries both the three-valued outcome and the boolean projection used by
//! `evaluate_set`.

use crate::satisfaction::Satisfaction;
use octofhir_req_model::RequirementSetType;
use serde::Serialize;
use std::fmt;

/// What a report node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportKind {
    Requirement,
    Set { set_type: RequirementSetType },
}

/// Outcome of a requirement or requirement set, with its members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub name: String,
    pub kind: ReportKind,
    pub satisfaction: Satisfaction,
    /// Boolean outcome, combining member booleans
    pub passed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<EvaluationReport>,
}

impl EvaluationReport {
    pub fn requirement(name: impl Into<String>, satisfaction: Satisfaction) -> Self {
        Self {
            name: name.into(),
            kind: ReportKind::Requirement,
            satisfaction,
            passed: satisfaction.is_satisfied(),
            members: Vec::new(),
        }
    }

    pub fn set(
        name: impl Into<String>,
        set_type: RequirementSetType,
        satisfaction: Satisfaction,
        passed: bool,
        members: Vec<EvaluationReport>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ReportKind::Set { set_type },
            satisfaction,
            passed,
            members,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self.kind, ReportKind::Set { .. })
    }

    /// First node with this name, searching depth-first
    pub fn find(&self, name: &str) -> Option<&EvaluationReport> {
        if self.name == name {
            return Some(self);
        }
        self.members.iter().find_map(|member| member.find(name))
    }

    /// Names of the requirements in the tree that did not pass, in
    /// evaluation order
    pub fn failed_requirements(&self) -> Vec<&str> {
        let mut failed = Vec::new();
        self.collect_failed(&mut failed);
        failed
    }

    fn collect_failed<'r>(&'r self, failed: &mut Vec<&'r str>) {
        match self.kind {
            ReportKind::Requirement if !self.passed => failed.push(&self.name),
            ReportKind::Requirement => {}
            ReportKind::Set { .. } => {
                for member in &self.members {
                    member.collect_failed(failed);
                }
            }
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.kind {
            ReportKind::Requirement => writeln!(f, "{indent}- {}: {}", self.name, self.satisfaction)?,
            ReportKind::Set { set_type } => {
                writeln!(f, "{indent}[{set_type}] {}: {}", self.name, self.satisfaction)?
            }
        }
        for member in &self.members {
            member.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
