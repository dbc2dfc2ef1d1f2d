//! Reference extraction and resolution engine: normalizes a project's package
//! references into a flat dependency list, expands it into a closed package
//! graph through a package source, and identifies the root packages.

pub mod expander;
pub mod graph;
pub mod legacy;
pub mod normalizer;
pub mod resolver;
pub mod roots;
