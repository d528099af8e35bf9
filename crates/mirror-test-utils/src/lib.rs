//! Shared test utilities for the mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`]: [`project::TestProject`], a temporary initialized project
//! - [`converter`]: [`converter::ScriptedConverter`], a recording converter
//!   double with configurable failures

pub mod converter;
pub mod project;

pub use converter::ScriptedConverter;
pub use project::TestProject;
