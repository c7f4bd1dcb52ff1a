//! JSON filter-template mapping.
//!
//! A filter template lives under the `filterTemplate` key of a search-form
//! document:
//!
//! ```text
//! {"filterTemplate":{"type":"DURING","property":"created",
//!   "value":"2018-12-10T13:09:40Z/2018-12-10T13:09:40Z",
//!   "from":"2018-12-10T13:09:40Z","to":"2018-12-10T13:09:40Z"}}
//! ```
//!
//! String leaves are read as raw JSON literals and unescaped with
//! [`crate::escape::unescape_json`]; rendering escapes with
//! [`crate::escape::escape_json`]. Ranges carry both a composed `value`
//! token and the decomposed `from`/`to` bounds on the wire; this module is
//! the only place that converts between the two views.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::trace;

use crate::error::{TranscodeError, TranscodeResult};
use crate::escape::{escape_json, unescape_json};
use crate::predicate::{split_range, Predicate, PredicateKind, RANGE_ARITY, RANGE_SEPARATOR};
use crate::value::{Value, ValueClass};

/// Key of the filter template inside a search-form document.
pub const FILTER_TEMPLATE_KEY: &str = "filterTemplate";

/// A JSON object whose member values are kept as raw literals.
type RawObject<'a> = BTreeMap<String, &'a RawValue>;

/// A JSON object that rejects repeated member names.
///
/// serde_json keeps the last occurrence of a duplicated key; a document
/// carrying two `value`s is ambiguous and refused instead.
pub(crate) struct UniqueObject<V>(BTreeMap<String, V>);

impl<V> UniqueObject<V> {
    pub(crate) fn into_inner(self) -> BTreeMap<String, V> {
        self.0
    }
}

struct UniqueObjectVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueObjectVisitor<V> {
    type Value = UniqueObject<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut members = BTreeMap::new();
        while let Some(key) = access.next_key::<String>()? {
            if members.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate member '{key}'")));
            }
            let value = access.next_value()?;
            members.insert(key, value);
        }
        Ok(UniqueObject(members))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueObject<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UniqueObjectVisitor(PhantomData))
    }
}

fn parse_object(json: &str) -> TranscodeResult<RawObject<'_>> {
    Ok(serde_json::from_str::<UniqueObject<&RawValue>>(json)?.into_inner())
}

struct RawTemplate<'a> {
    kind: Option<&'a RawValue>,
    property: Option<&'a RawValue>,
    value: Option<&'a RawValue>,
    from: Option<&'a RawValue>,
    to: Option<&'a RawValue>,
}

impl<'a> RawTemplate<'a> {
    fn from_object(object: &RawObject<'a>) -> Self {
        Self {
            kind: object.get("type").copied(),
            property: object.get("property").copied(),
            value: object.get("value").copied(),
            from: object.get("from").copied(),
            to: object.get("to").copied(),
        }
    }
}

#[derive(Serialize)]
struct RenderedTemplate {
    #[serde(rename = "type")]
    kind: Box<RawValue>,
    property: Box<RawValue>,
    value: Box<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<Box<RawValue>>,
}

#[derive(Serialize)]
struct RenderedDocument {
    #[serde(rename = "filterTemplate")]
    filter_template: Box<RawValue>,
}

/// Parses the filter template of a JSON document into a predicate.
///
/// The document is either an object holding a `filterTemplate` key or the
/// template object itself.
///
/// # Errors
///
/// - `UnsupportedPredicateKind` for an unknown `type` token
/// - `MalformedFilterFragment` for invalid JSON, missing or non-string
///   fields, or `from`/`to` bounds that disagree with `value`
/// - `MalformedEscapeSequence` / `InvalidTimestamp` from the leaf codecs
pub fn parse_json(document: &str) -> TranscodeResult<Predicate> {
    let object = parse_object(document)?;
    match object.get(FILTER_TEMPLATE_KEY) {
        Some(template) => parse_template(template),
        None if object.contains_key("type") => {
            predicate_from_fields(&RawTemplate::from_object(&object))
        }
        None => Err(TranscodeError::malformed(format!(
            "document has no '{FILTER_TEMPLATE_KEY}'"
        ))),
    }
}

/// Parses a bare filter-template object.
pub(crate) fn parse_template(template: &RawValue) -> TranscodeResult<Predicate> {
    let object = parse_object(template.get())?;
    predicate_from_fields(&RawTemplate::from_object(&object))
}

fn predicate_from_fields(fields: &RawTemplate<'_>) -> TranscodeResult<Predicate> {
    let token = required_string(fields.kind, "type")?;
    let kind = PredicateKind::from_json_token(&token)?;
    let property = required_string(fields.property, "property")?;
    let class = kind.operand();

    let values = if kind.arity() == RANGE_ARITY {
        let (low, high) = parse_range(fields, class)?;
        vec![low, high]
    } else {
        let text = required_string(fields.value, "value")?;
        vec![Value::from_json_text(&text, class)?]
    };

    trace!(kind = kind.json_token(), property = %property, "parsed filter template");
    Predicate::new(kind, property, values)
}

fn parse_range(fields: &RawTemplate<'_>, class: ValueClass) -> TranscodeResult<(Value, Value)> {
    let composed = optional_string(fields.value, "value")?;
    let from = optional_string(fields.from, "from")?;
    let to = optional_string(fields.to, "to")?;

    match (composed, from, to) {
        (Some(composed), from, to) => {
            let (low_text, high_text) = split_range(&composed)?;
            let low = Value::from_json_text(low_text, class)?;
            let high = Value::from_json_text(high_text, class)?;
            ensure_bound_matches("from", from.as_deref(), &low, class)?;
            ensure_bound_matches("to", to.as_deref(), &high, class)?;
            Ok((low, high))
        }
        (None, Some(from), Some(to)) => Ok((
            Value::from_json_text(&from, class)?,
            Value::from_json_text(&to, class)?,
        )),
        (None, _, _) => Err(TranscodeError::malformed(
            "range needs 'value' or both 'from' and 'to'",
        )),
    }
}

fn ensure_bound_matches(
    field: &'static str,
    text: Option<&str>,
    expected: &Value,
    class: ValueClass,
) -> TranscodeResult<()> {
    let Some(text) = text else { return Ok(()) };
    if Value::from_json_text(text, class)? != *expected {
        return Err(TranscodeError::malformed(format!(
            "'{field}' does not match the range in 'value'"
        )));
    }
    Ok(())
}

fn required_string(raw: Option<&RawValue>, field: &'static str) -> TranscodeResult<String> {
    optional_string(raw, field)?
        .ok_or_else(|| TranscodeError::malformed(format!("missing '{field}'")))
}

fn optional_string(raw: Option<&RawValue>, field: &'static str) -> TranscodeResult<Option<String>> {
    let Some(raw) = raw else { return Ok(None) };
    let body = raw
        .get()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| TranscodeError::malformed(format!("'{field}' must be a string")))?;
    unescape_json(body).map(Some)
}

/// Renders a predicate as a `{"filterTemplate":{...}}` document.
///
/// # Errors
///
/// Only fails if the rendered literals are rejected by serde_json, which
/// indicates an escaping bug.
pub fn render_json(predicate: &Predicate) -> TranscodeResult<String> {
    let document = RenderedDocument {
        filter_template: render_template(predicate)?,
    };
    Ok(serde_json::to_string(&document)?)
}

/// Renders the bare filter-template object.
pub(crate) fn render_template(predicate: &Predicate) -> TranscodeResult<Box<RawValue>> {
    let kind = predicate.kind();
    let (value, from, to) = match predicate.range() {
        Some((low, high)) => {
            let low = low.to_json_text();
            let high = high.to_json_text();
            let composed = format!("{low}{RANGE_SEPARATOR}{high}");
            (composed, Some(literal(&low)?), Some(literal(&high)?))
        }
        None => {
            let value = predicate
                .values()
                .first()
                .map(Value::to_json_text)
                .unwrap_or_default();
            (value, None, None)
        }
    };

    let rendered = RenderedTemplate {
        kind: literal(kind.json_token())?,
        property: literal(predicate.property())?,
        value: literal(&value)?,
        from,
        to,
    };
    Ok(serde_json::value::to_raw_value(&rendered)?)
}

fn literal(text: &str) -> TranscodeResult<Box<RawValue>> {
    Ok(RawValue::from_string(format!("\"{}\"", escape_json(text)))?)
}
