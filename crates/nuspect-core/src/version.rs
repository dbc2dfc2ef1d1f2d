//! NuGet version parsing, comparison, and range matching.
//!
//! NuGet versions differ from strict semver:
//! - Up to four numeric parts (`major.minor.patch.revision`), missing parts are zero
//! - Release labels follow a `-` and are dot-separated; a release sorts above
//!   any prerelease of the same numbers
//! - Numeric labels sort below alphanumeric ones, alphanumeric labels compare
//!   case-insensitively
//! - `+metadata` is kept but never affects ordering

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// A parsed NuGet package version.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    parts: [u64; 4],
    release_labels: Vec<String>,
    metadata: Option<String>,
    original: String,
}

impl NuGetVersion {
    /// Parse a version string. Returns `None` when the string is not a valid version.
    pub fn parse(version: &str) -> Option<Self> {
        let s = version.trim();
        if s.is_empty() {
            return None;
        }

        let (rest, metadata) = match s.split_once('+') {
            Some((_, meta)) if meta.is_empty() || !meta.split('.').all(is_valid_label) => {
                return None;
            }
            Some((rest, meta)) => (rest, Some(meta.to_string())),
            None => (s, None),
        };

        let (numbers, release_labels) = match rest.split_once('-') {
            Some((numbers, labels)) => {
                let labels: Vec<String> = labels.split('.').map(str::to_string).collect();
                if !labels.iter().all(|l| is_valid_label(l)) {
                    return None;
                }
                (numbers, labels)
            }
            None => (rest, Vec::new()),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for token in numbers.split('.') {
            if count == 4 || token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts[count] = token.parse().ok()?;
            count += 1;
        }

        Some(Self {
            parts,
            release_labels,
            metadata,
            original: s.to_string(),
        })
    }

    /// Build a release version from numeric parts; missing parts are zero.
    pub fn from_parts(parts: &[u64]) -> Self {
        let mut all = [0u64; 4];
        for (slot, value) in all.iter_mut().zip(parts) {
            *slot = *value;
        }
        let mut version = Self {
            parts: all,
            release_labels: Vec::new(),
            metadata: None,
            original: String::new(),
        };
        version.original = version.to_normalized_string();
        version
    }

    /// The four numeric parts, zero-filled.
    pub fn parts(&self) -> &[u64; 4] {
        &self.parts
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// The string this version was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// `major.minor.patch[.revision][-labels]`, revision only when non-zero.
    pub fn to_normalized_string(&self) -> String {
        let mut out = format!("{}.{}.{}", self.parts[0], self.parts[1], self.parts[2]);
        if self.parts[3] > 0 {
            out.push_str(&format!(".{}", self.parts[3]));
        }
        if self.is_prerelease() {
            out.push('-');
            out.push_str(&self.release_labels.join("."));
        }
        out
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts
            .cmp(&other.parts)
            .then_with(|| compare_release_labels(&self.release_labels, &other.release_labels))
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_release_labels(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    for (x, y) in a.iter().zip(b) {
        let ord = compare_label(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_label(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())
    }
}

impl Serialize for NuGetVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A floating version (`*`, `1.*`, `1.2.*`) pinned to a fixed numeric prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatRange {
    prefix: Vec<u64>,
}

impl FloatRange {
    /// Whether `version` is a release version sharing this float's prefix.
    pub fn matches(&self, version: &NuGetVersion) -> bool {
        !version.is_prerelease() && version.parts().starts_with(&self.prefix)
    }
}

/// A NuGet version range expression.
///
/// Supports: `1.0` (at least), `[1.0]` (exact), interval forms such as
/// `[1.0,2.0)`, `(,2.0]`, `[1.0,)`, and floating versions `1.*`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    min: Option<NuGetVersion>,
    include_min: bool,
    max: Option<NuGetVersion>,
    include_max: bool,
    float: Option<FloatRange>,
    original: String,
}

impl VersionRange {
    /// Parse a version range string. Returns `None` for invalid expressions.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        if s.starts_with('[') || s.starts_with('(') {
            return Self::parse_interval(s);
        }
        if s.contains('*') {
            return Self::parse_float(s);
        }

        let min = NuGetVersion::parse(s)?;
        Some(Self {
            min: Some(min),
            include_min: true,
            max: None,
            include_max: false,
            float: None,
            original: s.to_string(),
        })
    }

    /// A range matching exactly one version.
    pub fn exact(version: NuGetVersion) -> Self {
        let original = format!("[{version}]");
        Self {
            min: Some(version.clone()),
            include_min: true,
            max: Some(version),
            include_max: true,
            float: None,
            original,
        }
    }

    fn parse_interval(s: &str) -> Option<Self> {
        if s.len() < 3 {
            return None;
        }
        let include_min = s.starts_with('[');
        let include_max = match s.chars().last()? {
            ']' => true,
            ')' => false,
            _ => return None,
        };
        let inner = &s[1..s.len() - 1];

        let Some((lower, upper)) = inner.split_once(',') else {
            // `[1.0]` is the only single-version interval form
            if !include_min || !include_max {
                return None;
            }
            let mut range = Self::exact(NuGetVersion::parse(inner)?);
            range.original = s.to_string();
            return Some(range);
        };

        let lower = lower.trim();
        let upper = upper.trim();
        let min = if lower.is_empty() {
            None
        } else {
            Some(NuGetVersion::parse(lower)?)
        };
        let max = if upper.is_empty() {
            None
        } else {
            Some(NuGetVersion::parse(upper)?)
        };

        if let (Some(lo), Some(hi)) = (&min, &max) {
            match lo.cmp(hi) {
                Ordering::Greater => return None,
                Ordering::Equal if !(include_min && include_max) => return None,
                _ => {}
            }
        }

        Some(Self {
            include_min: include_min && min.is_some(),
            include_max: include_max && max.is_some(),
            min,
            max,
            float: None,
            original: s.to_string(),
        })
    }

    fn parse_float(s: &str) -> Option<Self> {
        let prefix_str = if s == "*" {
            ""
        } else {
            s.strip_suffix(".*")?
        };
        let mut prefix = Vec::new();
        if !prefix_str.is_empty() {
            for token in prefix_str.split('.') {
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                prefix.push(token.parse().ok()?);
            }
        }
        if prefix.len() > 3 {
            return None;
        }
        Some(Self {
            min: Some(NuGetVersion::from_parts(&prefix)),
            include_min: true,
            max: None,
            include_max: false,
            float: Some(FloatRange { prefix }),
            original: s.to_string(),
        })
    }

    pub fn min_version(&self) -> Option<&NuGetVersion> {
        self.min.as_ref()
    }

    pub fn max_version(&self) -> Option<&NuGetVersion> {
        self.max.as_ref()
    }

    pub fn is_floating(&self) -> bool {
        self.float.is_some()
    }

    /// The string this range was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Check if a version lies within the bounds of this range.
    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        if let Some(ref min) = self.min {
            match version.cmp(min) {
                Ordering::Less => return false,
                Ordering::Equal if !self.include_min => return false,
                _ => {}
            }
        }
        if let Some(ref max) = self.max {
            match version.cmp(max) {
                Ordering::Greater => return false,
                Ordering::Equal if !self.include_max => return false,
                _ => {}
            }
        }
        true
    }

    /// Prerelease versions are only candidates when a bound is itself prerelease.
    fn allows_prerelease(&self) -> bool {
        self.min.as_ref().is_some_and(NuGetVersion::is_prerelease)
            || self.max.as_ref().is_some_and(NuGetVersion::is_prerelease)
    }

    /// Pick the version a restore would select from `candidates`.
    ///
    /// Floating ranges take the highest version sharing the float prefix;
    /// everything else takes the lowest version satisfying the range.
    pub fn find_best_match<'a, I>(&self, candidates: I) -> Option<&'a NuGetVersion>
    where
        I: IntoIterator<Item = &'a NuGetVersion>,
    {
        let eligible: Vec<&NuGetVersion> = candidates
            .into_iter()
            .filter(|v| self.satisfies(v))
            .filter(|v| !v.is_prerelease() || self.allows_prerelease())
            .collect();

        if let Some(ref float) = self.float {
            let floated = eligible
                .iter()
                .copied()
                .filter(|v| float.matches(v))
                .max();
            if floated.is_some() {
                return floated;
            }
        }
        eligible.into_iter().min()
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min
            && self.include_min == other.include_min
            && self.max == other.max
            && self.include_max == other.include_max
            && self.float == other.float
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.float.is_some() {
            return f.write_str(&self.original);
        }
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) if lo == hi && self.include_min && self.include_max => {
                write!(f, "[{lo}]")
            }
            _ => {
                f.write_str(if self.include_min { "[" } else { "(" })?;
                if let Some(ref lo) = self.min {
                    write!(f, "{lo}")?;
                }
                f.write_str(", ")?;
                if let Some(ref hi) = self.max {
                    write!(f, "{hi}")?;
                }
                f.write_str(if self.include_max { "]" } else { ")" })
            }
        }
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
