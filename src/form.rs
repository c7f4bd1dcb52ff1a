//! Search-form documents and their stored record.
//!
//! A search form travels as a JSON document with some metadata next to its
//! `filterTemplate`. When saved, the template is transcoded to XML and kept
//! as an opaque string on a [`QueryTemplate`]; when read back, the XML is
//! transcoded again and the metadata re-attached. Metadata is never
//! interpreted beyond its JSON type.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::{to_raw_value, RawValue};
use tracing::debug;

use crate::error::{TranscodeError, TranscodeResult};
use crate::json::{parse_template, render_template, UniqueObject, FILTER_TEMPLATE_KEY};
use crate::transcoder::Transcoder;
use crate::value::{temporal_from_json, temporal_to_json, Timestamp};
use crate::xml::{parse_xml, render_xml_with};

const ID_KEY: &str = "id";
const TITLE_KEY: &str = "title";
const DESCRIPTION_KEY: &str = "description";
const CREATED_KEY: &str = "created";
const MODIFIED_KEY: &str = "modified";

const RESERVED_KEYS: [&str; 6] = [
    ID_KEY,
    TITLE_KEY,
    DESCRIPTION_KEY,
    CREATED_KEY,
    MODIFIED_KEY,
    FILTER_TEMPLATE_KEY,
];

/// A JSON value kept exactly as written: number spelling, member order and
/// whitespace inside it are never touched.
#[derive(Debug, Clone)]
pub struct OpaqueJson(Box<RawValue>);

impl OpaqueJson {
    /// Wraps a JSON text after checking it is well formed.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFilterFragment` if `json` is not a single JSON value.
    pub fn from_json(json: impl Into<String>) -> TranscodeResult<Self> {
        Ok(Self(RawValue::from_string(json.into())?))
    }

    /// The JSON text as written.
    #[must_use]
    pub fn get(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for OpaqueJson {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for OpaqueJson {}

impl Serialize for OpaqueJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OpaqueJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Self)
    }
}

/// The stored shape of a search form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// The filter as an OGC Filter XML fragment.
    pub filter_xml: String,
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
    /// Any other top-level form members, passed through untouched.
    pub extra: BTreeMap<String, OpaqueJson>,
}

impl QueryTemplate {
    /// Creates a record holding only a filter.
    #[must_use]
    pub fn new(filter_xml: impl Into<String>) -> Self {
        Self {
            filter_xml: filter_xml.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the audit timestamps.
    #[must_use]
    pub fn with_audit(mut self, created: Timestamp, modified: Timestamp) -> Self {
        self.created = Some(created);
        self.modified = Some(modified);
        self
    }
}

/// JSON object serialized in insertion order.
struct OrderedObject(Vec<(String, Box<RawValue>)>);

impl OrderedObject {
    fn push(&mut self, key: &str, value: Box<RawValue>) {
        self.0.push((key.to_string(), value));
    }

    fn push_string(&mut self, key: &str, value: Option<&str>) -> TranscodeResult<()> {
        if let Some(value) = value {
            self.push(key, to_raw_value(value)?);
        }
        Ok(())
    }

    fn push_timestamp(&mut self, key: &str, value: Option<Timestamp>) -> TranscodeResult<()> {
        if let Some(ts) = value {
            self.push(key, to_raw_value(&temporal_to_json(ts))?);
        }
        Ok(())
    }
}

impl Serialize for OrderedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

fn take_string(
    object: &mut BTreeMap<String, Box<RawValue>>,
    key: &'static str,
) -> TranscodeResult<Option<String>> {
    match object.remove(key) {
        Some(raw) => serde_json::from_str::<Option<String>>(raw.get())
            .map_err(|_| TranscodeError::malformed(format!("'{key}' must be a string"))),
        None => Ok(None),
    }
}

fn take_timestamp(
    object: &mut BTreeMap<String, Box<RawValue>>,
    key: &'static str,
) -> TranscodeResult<Option<Timestamp>> {
    take_string(object, key)?
        .map(|s| temporal_from_json(&s))
        .transpose()
}

impl Transcoder {
    /// Converts a search-form JSON document into its stored record.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFilterFragment` if the document is not a JSON object
    /// or has no `filterTemplate`, `InvalidTimestamp` for bad audit fields,
    /// and any error raised while transcoding the template.
    pub fn form_to_template(&self, form_json: &str) -> TranscodeResult<QueryTemplate> {
        self.check_size(form_json)?;
        let mut object = serde_json::from_str::<UniqueObject<Box<RawValue>>>(form_json)?.into_inner();

        let template = object.remove(FILTER_TEMPLATE_KEY).ok_or_else(|| {
            TranscodeError::malformed(format!("search form has no '{FILTER_TEMPLATE_KEY}'"))
        })?;
        let predicate = parse_template(&template)?;

        let record = QueryTemplate {
            id: take_string(&mut object, ID_KEY)?,
            title: take_string(&mut object, TITLE_KEY)?,
            description: take_string(&mut object, DESCRIPTION_KEY)?,
            filter_xml: render_xml_with(&predicate, self.config().dialect),
            created: take_timestamp(&mut object, CREATED_KEY)?,
            modified: take_timestamp(&mut object, MODIFIED_KEY)?,
            extra: object
                .into_iter()
                .map(|(key, raw)| (key, OpaqueJson(raw)))
                .collect(),
        };

        debug!(id = ?record.id, kind = predicate.kind().json_token(), "search form converted to record");
        Ok(record)
    }

    /// Renders a stored record back into a search-form JSON document.
    ///
    /// Members are emitted in a fixed order: `id`, `title`, `description`,
    /// `created`, `modified`, `filterTemplate`, then extra members by key.
    /// Extra members that collide with those names are dropped.
    ///
    /// # Errors
    ///
    /// Returns any error raised while parsing the stored XML.
    pub fn template_to_form(&self, record: &QueryTemplate) -> TranscodeResult<String> {
        self.check_size(&record.filter_xml)?;
        let predicate = parse_xml(&record.filter_xml)?;

        let mut object = OrderedObject(Vec::with_capacity(6 + record.extra.len()));
        object.push_string(ID_KEY, record.id.as_deref())?;
        object.push_string(TITLE_KEY, record.title.as_deref())?;
        object.push_string(DESCRIPTION_KEY, record.description.as_deref())?;
        object.push_timestamp(CREATED_KEY, record.created)?;
        object.push_timestamp(MODIFIED_KEY, record.modified)?;
        object.push(FILTER_TEMPLATE_KEY, render_template(&predicate)?);
        for (key, value) in &record.extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                object.push(key, value.0.clone());
            }
        }

        debug!(id = ?record.id, kind = predicate.kind().json_token(), "record converted to search form");
        Ok(serde_json::to_string(&object)?)
    }
}
