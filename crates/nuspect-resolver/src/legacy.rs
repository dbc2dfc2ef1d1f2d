//! Parsing of legacy `<Reference>` includes, which carry an assembly identity
//! such as `Newtonsoft.Json, Version=9.0.0.0, Culture=neutral, PublicKeyToken=...`.

/// Key marking the version segment of an assembly identity.
pub const VERSION_KEY: &str = "Version=";

const SEGMENT_SEPARATOR: char = ',';

/// Name and version extracted from an assembly identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    pub name: String,
    pub version: String,
}

/// Whether an include carries a version at all. Includes without one
/// (`System`, `System.Xml`) are framework assemblies, not packages.
pub fn has_version(include: &str) -> bool {
    include.contains(VERSION_KEY)
}

/// Split an include into comma-separated segments: the first is the name,
/// the first later segment starting with `Version=` holds the version.
///
/// Returns `None` when there is no name segment or no non-empty version.
pub fn parse_assembly_identity(include: &str) -> Option<AssemblyIdentity> {
    let (name, rest) = include.split_once(SEGMENT_SEPARATOR)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let version = rest
        .split(SEGMENT_SEPARATOR)
        .map(str::trim)
        .find_map(|segment| segment.strip_prefix(VERSION_KEY))?
        .trim();
    if version.is_empty() {
        return None;
    }
    Some(AssemblyIdentity {
        name: name.to_string(),
        version: version.to_string(),
    })
}
