//! Package sources: the lookup seam the graph expander resolves against,
//! an offline in-memory catalog, and a NuGet v3 protocol client.

pub mod download;
pub mod memory;
pub mod registration;
pub mod remote;
pub mod source;
