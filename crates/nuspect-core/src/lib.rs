//! Core data types for nuspect.
//!
//! This crate defines the types shared by every stage of a resolution run:
//! package identities and the resolved graph, normalized dependencies, the
//! NuGet version grammar, the MSBuild project parser, central package
//! management policy, and global configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod central;
pub mod config;
pub mod dependency;
pub mod package;
pub mod project;
pub mod version;
