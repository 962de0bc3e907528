//! Skill definitions for SkillGate.
//!
//! This crate provides:
//!
//! - **Skill types**: [`SkillDefinition`] and its tool sequence, safety
//!   constraints, approval gates, and capability declarations.
//!
//! - **Typed parameters**: [`ParamValue`] and [`Parameters`], the value
//!   type that flows from callers through skills into tools.
//!
//! - **Catalog access**: the read-only [`SkillCatalog`] trait consumed by
//!   the matcher and runtime, plus an [`InMemoryCatalog`] snapshot.
//!
//! - **Loading and validation**: JSON skill files from a directory, checked
//!   with [`validate_skill`].

pub mod catalog;
pub mod error;
pub mod loader;
pub mod params;
pub mod types;
pub mod validate;

pub use catalog::{InMemoryCatalog, SkillCatalog};
pub use error::{Result, SkillError};
pub use loader::{load_skill_from_file, load_skills_from_dir};
pub use params::{ParamValue, Parameters};
pub use types::{
    ApprovalGates, CapabilitiesDeclaration, RemoteToolGroup, SafetyConstraints, SkillDefinition,
    ToolStep,
};
pub use validate::{ValidationIssue, validate_skill};
