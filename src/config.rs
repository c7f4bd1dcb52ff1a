//! Transcoder configuration.
//!
//! Configuration is passed explicitly to a [`crate::Transcoder`]; nothing in
//! the crate reads process-wide state.

use serde::{Deserialize, Serialize};

/// Namespace bound to the `fes` prefix in Filter Encoding 2.0 output.
pub const FES_NAMESPACE: &str = "http://www.opengis.net/fes/2.0";

/// Default upper bound on input document size.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// XML vocabulary used when rendering predicates.
///
/// Parsing accepts both dialects regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterDialect {
    /// Bare predicate element with an un-prefixed `PropertyName`.
    #[default]
    Ogc,

    /// Predicate wrapped in `fes:Filter`, property as `fes:ValueReference`.
    Fes2,
}

impl FilterDialect {
    /// Element holding the property name.
    #[must_use]
    pub const fn property_element(&self) -> &'static str {
        match self {
            Self::Ogc => "PropertyName",
            Self::Fes2 => "ValueReference",
        }
    }

    /// Element prefix, including the colon.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Ogc => "",
            Self::Fes2 => "fes:",
        }
    }

    /// Parses a dialect name as given on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ogc" => Some(Self::Ogc),
            "fes2" | "fes" => Some(Self::Fes2),
            _ => None,
        }
    }
}

/// Transcoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// XML vocabulary for rendered fragments.
    pub dialect: FilterDialect,
    /// Inputs larger than this are rejected before parsing.
    pub max_document_bytes: usize,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            dialect: FilterDialect::Ogc,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl TranscoderConfig {
    #[must_use]
    pub const fn with_dialect(mut self, dialect: FilterDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the input size limit; zero is raised to one byte.
    #[must_use]
    pub const fn with_max_document_bytes(mut self, max: usize) -> Self {
        self.max_document_bytes = if max == 0 { 1 } else { max };
        self
    }
}
