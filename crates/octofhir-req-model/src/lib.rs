//! Clinical entity model and requirement definitions
//!
//! This crate provides:
//! - Patient record types (diseases, events, lab samples and readings,
//!   examinations, findings, medications, risks)
//! - The closed [`DomainEntity`] union over every kind the engine understands
//! - [`RequirementLinks`] snapshots and the per-kind facade adapters that
//!   produce them
//! - Rule definitions ([`Requirement`], [`RequirementSet`]) and the
//!   [`RequirementCatalog`] that resolves set members by name

pub mod catalog;
pub mod concept;
pub mod definitions;
pub mod entity;
pub mod error;
pub mod facade;
pub mod links;
pub mod records;

pub use catalog::*;
pub use concept::*;
pub use definitions::*;
pub use entity::*;
pub use error::*;
pub use facade::{LinkableEntity, get_links};
pub use links::*;
pub use records::*;
