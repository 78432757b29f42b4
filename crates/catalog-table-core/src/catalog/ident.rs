//! Namespace and table identifiers.
//!
//! A part is valid when it is non-empty, is not `.` or `..`, does not start
//! with `_` (reserved for metadata files), and contains none of `.`, `/`,
//! `\` or NUL. Parts map directly onto directory names in the warehouse.

use std::fmt;
use std::str::FromStr;

use snafu::prelude::*;

use crate::catalog::error::{CatalogError, InvalidIdentifierSnafu};

/// Validate a single identifier part (namespace or table name).
pub fn validate_part(part: &str) -> Result<(), CatalogError> {
    let reason = if part.is_empty() {
        Some("must not be empty")
    } else if part == "." || part == ".." {
        Some("must not be a relative path component")
    } else if part.starts_with('_') {
        Some("must not start with '_'")
    } else if part.contains(['.', '/', '\\', '\0']) {
        Some("must not contain '.', '/', '\\' or NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => InvalidIdentifierSnafu {
            identifier: part,
            reason,
        }
        .fail(),
        None => Ok(()),
    }
}

/// Qualified table identifier, `<namespace>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableIdent {
    namespace: String,
    name: String,
}

impl TableIdent {
    /// Build an identifier from its two parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, CatalogError> {
        let namespace = namespace.into();
        let name = name.into();
        validate_part(&namespace)?;
        validate_part(&name)?;
        Ok(Self { namespace, name })
    }

    /// Parse `<namespace>.<name>`, splitting on the first `.`.
    pub fn parse(qualified: &str) -> Result<Self, CatalogError> {
        let (namespace, name) = qualified.split_once('.').context(InvalidIdentifierSnafu {
            identifier: qualified,
            reason: "expected <namespace>.<name>",
        })?;
        Self::new(namespace, name)
    }

    /// Namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Table name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for TableIdent {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
