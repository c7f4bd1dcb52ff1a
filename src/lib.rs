//! # formfilter - Search-form filter transcoding
//!
//! Saved search forms describe a single filter predicate as a small JSON
//! `filterTemplate` object. The store that persists them speaks OGC Filter
//! XML. This crate converts between the two, preserving every user-entered
//! character exactly once across each hop.
//!
//! ## Core Concepts
//!
//! - **Predicate**: A comparison of one property against one or two values
//! - **PredicateKind**: The closed set of supported comparisons, each with a
//!   JSON token and an XML element
//! - **Value**: Either free text or a UTC instant with millisecond precision
//! - **Transcoder**: The two-way facade, configured by [`TranscoderConfig`]
//!
//! ## Usage
//!
//! ```rust
//! use formfilter::{json_to_xml, xml_to_json};
//!
//! let json = r#"{"filterTemplate":{"type":"DURING","property":"created","value":"2018-12-10T13:09:40Z/2018-12-10T13:09:40Z"}}"#;
//! let xml = json_to_xml(json)?;
//! assert_eq!(
//!     xml,
//!     "<During><PropertyName>created</PropertyName><Literal>1544447380000/1544447380000</Literal></During>"
//! );
//! assert!(xml_to_json(&xml)?.contains(r#""from":"2018-12-10T13:09:40Z""#));
//! # Ok::<(), formfilter::TranscodeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Codecs
pub mod error;
pub mod escape;
pub mod value;

// Predicate model and mappers
pub mod json;
pub mod predicate;
pub mod xml;

// Facade
pub mod config;
pub mod form;
pub mod transcoder;

// Re-export primary types at crate root for convenience
pub use config::{FilterDialect, TranscoderConfig, DEFAULT_MAX_DOCUMENT_BYTES, FES_NAMESPACE};
pub use error::{TranscodeError, TranscodeResult};
pub use escape::{escape_json, escape_xml, is_xml_char, unescape_json, unescape_xml};
pub use form::{OpaqueJson, QueryTemplate};
pub use json::{parse_json, render_json, FILTER_TEMPLATE_KEY};
pub use predicate::{KindSpec, Predicate, PredicateKind, PREDICATE_TABLE, RANGE_SEPARATOR};
pub use transcoder::{json_to_xml, xml_to_json, Transcoder};
pub use value::{
    temporal_from_json, temporal_from_xml, temporal_to_json, temporal_to_xml, Timestamp, Value,
    ValueClass,
};
pub use xml::{parse_xml, render_xml, render_xml_with};
