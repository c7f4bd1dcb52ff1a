//! Predicate model and the predicate-kind table.
//!
//! Every supported predicate shape is one row of [`PREDICATE_TABLE`]: the
//! JSON operator token, the OGC element name, the arity and the class of
//! operand it takes. Both mappers resolve kinds exclusively through this
//! table, so adding a shape is a new enum variant plus one row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TranscodeError, TranscodeResult};
use crate::escape::is_xml_char;
use crate::value::{Timestamp, Value, ValueClass};

/// Supported predicate shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    Before,
    After,
    /// Temporal range; the only arity-2 shape.
    During,
}

/// One row of the predicate-kind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    pub kind: PredicateKind,
    /// Operator token in the JSON `type` field.
    pub json_token: &'static str,
    /// Local name of the OGC Filter element.
    pub xml_element: &'static str,
    pub arity: usize,
    pub operand: ValueClass,
}

const fn row(
    kind: PredicateKind,
    json_token: &'static str,
    xml_element: &'static str,
    arity: usize,
    operand: ValueClass,
) -> KindSpec {
    KindSpec {
        kind,
        json_token,
        xml_element,
        arity,
        operand,
    }
}

/// Separator between the bounds of a composed range token, in both
/// encodings (`low/high`).
pub const RANGE_SEPARATOR: char = '/';

/// Arity of range predicates, whose two values travel as one composed token.
pub const RANGE_ARITY: usize = 2;

/// The predicate-kind table, in `PredicateKind` declaration order.
pub const PREDICATE_TABLE: &[KindSpec] = &[
    row(PredicateKind::Equals, "=", "PropertyIsEqualTo", 1, ValueClass::Text),
    row(PredicateKind::NotEquals, "!=", "PropertyIsNotEqualTo", 1, ValueClass::Text),
    row(PredicateKind::GreaterThan, ">", "PropertyIsGreaterThan", 1, ValueClass::Text),
    row(PredicateKind::GreaterThanOrEqual, ">=", "PropertyIsGreaterThanOrEqualTo", 1, ValueClass::Text),
    row(PredicateKind::LessThan, "<", "PropertyIsLessThan", 1, ValueClass::Text),
    row(PredicateKind::LessThanOrEqual, "<=", "PropertyIsLessThanOrEqualTo", 1, ValueClass::Text),
    row(PredicateKind::Like, "ILIKE", "PropertyIsLike", 1, ValueClass::Text),
    row(PredicateKind::Before, "BEFORE", "Before", 1, ValueClass::Temporal),
    row(PredicateKind::After, "AFTER", "After", 1, ValueClass::Temporal),
    row(PredicateKind::During, "DURING", "During", RANGE_ARITY, ValueClass::Temporal),
];

impl PredicateKind {
    /// Returns this kind's table row.
    #[must_use]
    pub const fn spec(self) -> &'static KindSpec {
        &PREDICATE_TABLE[self as usize]
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        self.spec().arity
    }

    #[must_use]
    pub const fn operand(self) -> ValueClass {
        self.spec().operand
    }

    #[must_use]
    pub const fn json_token(self) -> &'static str {
        self.spec().json_token
    }

    #[must_use]
    pub const fn xml_element(self) -> &'static str {
        self.spec().xml_element
    }

    /// Resolves a JSON operator token.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::UnsupportedPredicateKind` for an unknown token.
    pub fn from_json_token(token: &str) -> TranscodeResult<Self> {
        PREDICATE_TABLE
            .iter()
            .find(|row| row.json_token == token)
            .map(|row| row.kind)
            .ok_or_else(|| TranscodeError::unsupported(token))
    }

    /// Resolves an OGC element local name.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::UnsupportedPredicateKind` for an unknown element.
    pub fn from_xml_element(name: &str) -> TranscodeResult<Self> {
        PREDICATE_TABLE
            .iter()
            .find(|row| row.xml_element == name)
            .map(|row| row.kind)
            .ok_or_else(|| TranscodeError::unsupported(name))
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_token())
    }
}

/// One atomic condition over a named property.
///
/// Invariants, enforced by [`Predicate::new`]:
/// - `values.len() == kind.arity()`
/// - `property` is not blank
/// - every value belongs to the kind's operand class
///
/// Range bounds are not ordered; a `During` whose low bound is after its
/// high bound is a legal predicate.
///
/// # Examples
///
/// ```
/// use formfilter::{Predicate, PredicateKind};
///
/// let p = Predicate::equals("language", "english").unwrap();
/// assert_eq!(p.kind(), PredicateKind::Equals);
/// assert_eq!(p.values().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    kind: PredicateKind,
    property: String,
    values: Vec<Value>,
}

impl Predicate {
    /// Creates a predicate, checking the model invariants.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::MalformedFilterFragment` if the property is
    /// blank, the number of values differs from the kind's arity, a value
    /// is of the wrong class, or any text holds a character XML cannot carry.
    pub fn new(
        kind: PredicateKind,
        property: impl Into<String>,
        values: Vec<Value>,
    ) -> TranscodeResult<Self> {
        let property = property.into();
        if property.trim().is_empty() {
            return Err(TranscodeError::malformed("property must not be empty"));
        }
        if values.len() != kind.arity() {
            return Err(TranscodeError::malformed(format!(
                "{} takes {} value(s), got {}",
                kind.xml_element(),
                kind.arity(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !kind.operand().admits(v)) {
            return Err(TranscodeError::malformed(format!(
                "{} does not accept a {} value",
                kind.xml_element(),
                bad.type_name()
            )));
        }
        let texts = std::iter::once(property.as_str()).chain(values.iter().filter_map(Value::as_text));
        for text in texts {
            if let Some(bad) = text.chars().find(|&c| !is_xml_char(c)) {
                return Err(TranscodeError::malformed(format!(
                    "character U+{:04X} cannot be carried in an XML filter",
                    u32::from(bad)
                )));
            }
        }
        Ok(Self {
            kind,
            property,
            values,
        })
    }

    /// Text equality.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::MalformedFilterFragment` if `property` is blank.
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> TranscodeResult<Self> {
        Self::new(PredicateKind::Equals, property, vec![Value::Text(value.into())])
    }

    /// Temporal range between two instants.
    ///
    /// # Errors
    ///
    /// Returns `TranscodeError::MalformedFilterFragment` if `property` is blank.
    pub fn during(property: impl Into<String>, low: Timestamp, high: Timestamp) -> TranscodeResult<Self> {
        Self::new(
            PredicateKind::During,
            property,
            vec![Value::Temporal(low), Value::Temporal(high)],
        )
    }

    pub const fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The `(low, high)` bounds of an arity-2 predicate.
    #[must_use]
    pub fn range(&self) -> Option<(&Value, &Value)> {
        match self.values.as_slice() {
            [low, high] => Some((low, high)),
            _ => None,
        }
    }
}

/// Splits a composed `low/high` range token.
pub(crate) fn split_range(token: &str) -> TranscodeResult<(&str, &str)> {
    token
        .split_once(RANGE_SEPARATOR)
        .filter(|(_, high)| !high.contains(RANGE_SEPARATOR))
        .ok_or_else(|| {
            TranscodeError::malformed(format!("range '{token}' is not of the form 'low/high'"))
        })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.kind)?;
        for (i, value) in self.values.iter().enumerate() {
            if i == 0 {
                write!(f, " {value}")?;
            } else {
                write!(f, "{RANGE_SEPARATOR}{value}")?;
            }
        }
        Ok(())
    }
}
