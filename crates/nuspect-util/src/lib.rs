//! Shared utilities for nuspect.
//!
//! This crate provides cross-cutting concerns used by all other nuspect
//! crates: the unified error type, filesystem helpers for locating and
//! reading project files, and terminal status output.

pub mod errors;
pub mod fs;
pub mod progress;
