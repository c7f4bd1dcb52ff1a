//! Leaf values carried by predicates and their surface forms.
//!
//! A predicate operand is either free text or an absolute instant. Temporal
//! values have two textual forms: ISO-8601 in JSON documents and decimal
//! epoch milliseconds in XML fragments.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TranscodeError, TranscodeResult};

/// ISO-8601 date-time as accepted in JSON documents.
///
/// Years outside 0000..=9999 carry an explicit sign, matching chrono's `%Y`.
const ISO_8601_PATTERN: &str = r"^(?P<datetime>[+-]?\d{4,6}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?)(?:(?P<utc>Z)|(?P<sign>[+-])(?P<oh>\d{2}):(?P<om>\d{2}))$";

static ISO_8601: OnceLock<Regex> = OnceLock::new();

fn iso_8601() -> &'static Regex {
    ISO_8601.get_or_init(|| Regex::new(ISO_8601_PATTERN).expect("ISO-8601 pattern is valid"))
}

/// An absolute UTC instant with millisecond precision.
///
/// Construction truncates anything finer than a millisecond, so two
/// timestamps compare equal exactly when their epoch milliseconds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "DateTime<Utc>", into = "DateTime<Utc>")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp from a chrono instant, truncating to milliseconds.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(3))
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    ///
    /// Returns `None` if the value is outside chrono's representable range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Milliseconds since 1970-01-01T00:00:00Z.
    #[must_use]
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_datetime(at)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&temporal_to_json(*self))
    }
}

/// Renders an instant in its JSON form: UTC with a literal `Z` suffix.
///
/// Whole seconds render as `YYYY-MM-DDThh:mm:ssZ`; a non-zero millisecond
/// part adds a three-digit fraction so the value survives a round trip.
#[must_use]
pub fn temporal_to_json(ts: Timestamp) -> String {
    let at = ts.as_datetime();
    if at.timestamp_subsec_millis() == 0 {
        at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

/// Parses the JSON form of an instant.
///
/// Offsets other than `Z` are accepted and normalized to UTC.
///
/// # Errors
///
/// Returns `TranscodeError::InvalidTimestamp` if the input is not an
/// ISO-8601 date-time or names an impossible calendar instant.
pub fn temporal_from_json(s: &str) -> TranscodeResult<Timestamp> {
    let invalid = || TranscodeError::invalid_timestamp(s);
    let caps = iso_8601().captures(s).ok_or_else(invalid)?;

    let local = NaiveDateTime::parse_from_str(&caps["datetime"], "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| invalid())?;

    let offset_secs = if caps.name("utc").is_some() {
        0
    } else {
        let hours: i64 = caps["oh"].parse().map_err(|_| invalid())?;
        let minutes: i64 = caps["om"].parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        let magnitude = hours * 3600 + minutes * 60;
        if &caps["sign"] == "-" {
            -magnitude
        } else {
            magnitude
        }
    };

    let utc = local
        .checked_sub_signed(Duration::seconds(offset_secs))
        .ok_or_else(invalid)?;
    Ok(Timestamp::from_datetime(utc.and_utc()))
}

/// Renders an instant in its XML form: decimal epoch milliseconds.
#[must_use]
pub fn temporal_to_xml(ts: Timestamp) -> String {
    ts.as_millis().to_string()
}

/// Parses the XML form of an instant.
///
/// # Errors
///
/// Returns `TranscodeError::InvalidTimestamp` on non-numeric or
/// out-of-range input.
pub fn temporal_from_xml(s: &str) -> TranscodeResult<Timestamp> {
    s.parse::<i64>()
        .ok()
        .and_then(Timestamp::from_millis)
        .ok_or_else(|| TranscodeError::invalid_timestamp(s))
}

/// The class of operand a predicate slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    Text,
    Temporal,
}

impl ValueClass {
    /// Returns true if `value` belongs to this class.
    #[must_use]
    pub const fn admits(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Text, Value::Text(_)) | (Self::Temporal, Value::Temporal(_))
        )
    }
}

/// A single predicate operand.
///
/// # Examples
///
/// ```
/// use formfilter::{Value, ValueClass};
///
/// let created = Value::from_json_text("2018-12-10T13:09:40Z", ValueClass::Temporal).unwrap();
/// assert_eq!(created.to_xml_text(), "1544447380000");
///
/// let language = Value::from("english");
/// assert!(language.is_text());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Temporal(Timestamp),
}

impl Value {
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Temporal(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            Self::Temporal(_) => None,
        }
    }

    pub const fn as_temporal(&self) -> Option<Timestamp> {
        match self {
            Self::Temporal(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Returns the class this value belongs to.
    #[must_use]
    pub const fn class(&self) -> ValueClass {
        match self {
            Self::Text(_) => ValueClass::Text,
            Self::Temporal(_) => ValueClass::Temporal,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Temporal(_) => "temporal",
        }
    }

    /// Builds a value of the given class from unescaped JSON text.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::InvalidTimestamp` for a temporal slot whose
    /// text is not ISO-8601.
    pub fn from_json_text(text: &str, class: ValueClass) -> TranscodeResult<Self> {
        match class {
            ValueClass::Text => Ok(Self::Text(text.to_string())),
            ValueClass::Temporal => temporal_from_json(text).map(Self::Temporal),
        }
    }

    /// Builds a value of the given class from unescaped XML text.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::InvalidTimestamp` for a temporal slot whose
    /// text is not epoch milliseconds.
    pub fn from_xml_text(text: &str, class: ValueClass) -> TranscodeResult<Self> {
        match class {
            ValueClass::Text => Ok(Self::Text(text.to_string())),
            ValueClass::Temporal => temporal_from_xml(text).map(Self::Temporal),
        }
    }

    /// Unescaped JSON text of this value.
    #[must_use]
    pub fn to_json_text(&self) -> String {
        match self {
            Self::Text(v) => v.clone(),
            Self::Temporal(ts) => temporal_to_json(*ts),
        }
    }

    /// Unescaped XML text of this value.
    #[must_use]
    pub fn to_xml_text(&self) -> String {
        match self {
            Self::Text(v) => v.clone(),
            Self::Temporal(ts) => temporal_to_xml(*ts),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Temporal(ts) => write!(f, "{ts}"),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Temporal(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Temporal(Timestamp::from_datetime(v))
    }
}
