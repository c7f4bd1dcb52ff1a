//! Transcoder facade.
//!
//! Composes the JSON and XML mappers into the two operations the rest of a
//! search-form service calls: `json_to_xml` when a form is saved and
//! `xml_to_json` when it is read back. Conversion is pure and synchronous;
//! a [`Transcoder`] holds only immutable configuration and can be shared
//! freely across threads.

use tracing::debug;

use crate::config::TranscoderConfig;
use crate::error::{TranscodeError, TranscodeResult};
use crate::json::{parse_json, render_json};
use crate::xml::{parse_xml, render_xml_with};

/// Converts filter predicates between JSON templates and OGC Filter XML.
///
/// # Examples
///
/// ```
/// use formfilter::Transcoder;
///
/// let transcoder = Transcoder::default();
/// let xml = transcoder
///     .json_to_xml(r#"{"filterTemplate":{"type":"=","property":"language","value":"english"}}"#)
///     .unwrap();
/// assert_eq!(
///     xml,
///     "<PropertyIsEqualTo><PropertyName>language</PropertyName><Literal>english</Literal></PropertyIsEqualTo>"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transcoder {
    config: TranscoderConfig,
}

impl Transcoder {
    #[must_use]
    pub const fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Converts a JSON document carrying a filter template into an XML fragment.
    ///
    /// # Errors
    ///
    /// Returns any [`TranscodeError`] raised by the JSON mapper, or
    /// `MalformedFilterFragment` if the document exceeds the size limit.
    pub fn json_to_xml(&self, json: &str) -> TranscodeResult<String> {
        let result = self
            .check_size(json)
            .and_then(|()| parse_json(json))
            .map(|predicate| render_xml_with(&predicate, self.config.dialect));
        log_outcome("json_to_xml", json.len(), &result);
        result
    }

    /// Converts an XML fragment into a `{"filterTemplate":{...}}` document.
    ///
    /// # Errors
    ///
    /// Returns any [`TranscodeError`] raised by the XML mapper, or
    /// `MalformedFilterFragment` if the fragment exceeds the size limit.
    pub fn xml_to_json(&self, xml: &str) -> TranscodeResult<String> {
        let result = self
            .check_size(xml)
            .and_then(|()| parse_xml(xml))
            .and_then(|predicate| render_json(&predicate));
        log_outcome("xml_to_json", xml.len(), &result);
        result
    }

    pub(crate) fn check_size(&self, input: &str) -> TranscodeResult<()> {
        if input.len() > self.config.max_document_bytes {
            return Err(TranscodeError::malformed(format!(
                "document of {} bytes exceeds the {} byte limit",
                input.len(),
                self.config.max_document_bytes
            )));
        }
        Ok(())
    }
}

fn log_outcome(operation: &'static str, bytes: usize, result: &TranscodeResult<String>) {
    match result {
        Ok(output) => debug!(operation, bytes, output_bytes = output.len(), "transcoded filter"),
        Err(e) => debug!(operation, bytes, error = %e, code = e.kind(), "transcode failed"),
    }
}

/// Converts JSON to XML with the default configuration.
///
/// # Errors
///
/// See [`Transcoder::json_to_xml`].
pub fn json_to_xml(json: &str) -> TranscodeResult<String> {
    Transcoder::default().json_to_xml(json)
}

/// Converts XML to JSON with the default configuration.
///
/// # Errors
///
/// See [`Transcoder::xml_to_json`].
pub fn xml_to_json(xml: &str) -> TranscodeResult<String> {
    Transcoder::default().xml_to_json(xml)
}
