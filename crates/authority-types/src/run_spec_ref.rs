use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hierarchical path identifying a RunSpec, e.g. `/prod/web`. Must start
/// with `/`; validated once at construction so downstream code never has
/// to re-check it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunSpecPath(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("run-spec path must start with '/': {0:?}")]
pub struct InvalidRunSpecPath(pub String);

impl RunSpecPath {
    pub fn new(path: impl Into<String>) -> Result<Self, InvalidRunSpecPath> {
        let path = path.into();
        if path.starts_with('/') {
            Ok(Self(path))
        } else {
            Err(InvalidRunSpecPath(path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RunSpecPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque version token for a RunSpec. Equality is structural; the
/// authority never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunSpecVersion(String);

impl RunSpecVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RunSpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key identifying a RunSpec: `(path, version)`. Key equality is
/// structural over both fields per the data model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunSpecRef {
    pub path: RunSpecPath,
    pub version: RunSpecVersion,
}

impl RunSpecRef {
    pub fn new(path: RunSpecPath, version: RunSpecVersion) -> Self {
        Self { path, version }
    }
}

impl Display for RunSpecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_must_start_with_slash() {
        assert!(RunSpecPath::new("/svc").is_ok());
        assert_eq!(
            RunSpecPath::new("svc").unwrap_err(),
            InvalidRunSpecPath("svc".to_string())
        );
    }

    #[test]
    fn ref_display_matches_spec_format() {
        let r = RunSpecRef::new(
            RunSpecPath::new("/svc").unwrap(),
            RunSpecVersion::new("v1"),
        );
        assert_eq!(r.to_string(), "/svc#v1");
    }
}
