//! OGC Filter XML mapping.
//!
//! Rendered fragments have one of two shapes, depending on the dialect:
//!
//! ```text
//! <PropertyIsEqualTo><PropertyName>language</PropertyName><Literal>english</Literal></PropertyIsEqualTo>
//!
//! <fes:Filter xmlns:fes="http://www.opengis.net/fes/2.0"><fes:During>
//!   <fes:ValueReference>created</fes:ValueReference>
//!   <fes:Literal>1544447380000/1544447380000</fes:Literal>
//! </fes:During></fes:Filter>
//! ```
//!
//! Parsing matches on local names only, so either shape (and any namespace
//! prefix) is accepted.

use roxmltree::{Document, Node, TextPos};
use tracing::trace;

use crate::config::{FilterDialect, FES_NAMESPACE};
use crate::error::{TranscodeError, TranscodeResult};
use crate::escape::{escape_xml, unescape_xml};
use crate::predicate::{split_range, Predicate, PredicateKind, RANGE_ARITY, RANGE_SEPARATOR};
use crate::value::Value;

const FILTER_ELEMENT: &str = "Filter";
const LITERAL_ELEMENT: &str = "Literal";
const PROPERTY_ELEMENTS: [&str; 2] = ["PropertyName", "ValueReference"];
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const PI_OPEN: &str = "<?";
const PI_CLOSE: &str = "?>";

/// Parses an OGC Filter fragment into a predicate.
///
/// # Errors
///
/// - `UnsupportedPredicateKind` if the predicate element has no table entry
/// - `MalformedFilterFragment` for XML syntax errors or a missing, extra or
///   empty property/literal child
/// - `MalformedEscapeSequence` for bad entity references
/// - `InvalidTimestamp` for non-numeric temporal literals
pub fn parse_xml(fragment: &str) -> TranscodeResult<Predicate> {
    let doc = Document::parse(fragment).map_err(|e| xml_error(fragment, &e))?;
    let element = predicate_element(doc.root_element())?;
    let kind = PredicateKind::from_xml_element(element.tag_name().name())?;

    let mut property = None;
    let mut literal = None;
    for child in element.children() {
        if child.is_text() {
            if child.text().is_some_and(|t| !t.trim().is_empty()) {
                return Err(TranscodeError::malformed(format!(
                    "unexpected text inside {}",
                    kind.xml_element()
                )));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }
        let name = child.tag_name().name();
        let slot = if PROPERTY_ELEMENTS.contains(&name) {
            &mut property
        } else if name == LITERAL_ELEMENT {
            &mut literal
        } else {
            return Err(TranscodeError::malformed(format!(
                "unexpected element {name} inside {}",
                kind.xml_element()
            )));
        };
        if slot.replace(child).is_some() {
            return Err(TranscodeError::malformed(format!("duplicate {name} element")));
        }
    }

    let property = property
        .ok_or_else(|| TranscodeError::malformed("missing property name"))
        .and_then(|node| element_text(fragment, node))?;
    let literal = literal
        .ok_or_else(|| TranscodeError::malformed("missing literal"))
        .and_then(|node| element_text(fragment, node))?;

    let class = kind.operand();
    let values = if kind.arity() == RANGE_ARITY {
        let (low, high) = split_range(&literal)?;
        vec![Value::from_xml_text(low, class)?, Value::from_xml_text(high, class)?]
    } else {
        vec![Value::from_xml_text(&literal, class)?]
    };

    trace!(kind = kind.xml_element(), property = %property, "parsed filter fragment");
    Predicate::new(kind, property, values)
}

/// Unwraps an enclosing `Filter` element holding exactly one predicate.
fn predicate_element<'a, 'input>(root: Node<'a, 'input>) -> TranscodeResult<Node<'a, 'input>> {
    if root.tag_name().name() != FILTER_ELEMENT {
        return Ok(root);
    }
    let mut children = root.children().filter(Node::is_element);
    match (children.next(), children.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(TranscodeError::malformed("empty Filter element")),
        (Some(_), Some(_)) => Err(TranscodeError::malformed(
            "Filter element holds more than one predicate",
        )),
    }
}

/// Collects the text content of a leaf element, resolving references with
/// the crate's XML codec rather than the parser's.
///
/// The element's raw inner markup is walked segment by segment: CDATA is
/// copied verbatim, comments and processing instructions are skipped, and
/// character data goes through [`unescape_xml`].
fn element_text(fragment: &str, node: Node<'_, '_>) -> TranscodeResult<String> {
    if node.children().any(|child| child.is_element()) {
        return Err(TranscodeError::malformed(format!(
            "{} must contain only text",
            node.tag_name().name()
        )));
    }

    let (base, inner) = inner_markup(fragment, node)?;
    let mut text = String::new();
    let mut rest = inner;
    while !rest.is_empty() {
        let offset = base + (inner.len() - rest.len());
        if let Some(after) = rest.strip_prefix(CDATA_OPEN) {
            let (data, tail) = split_at_marker(after, CDATA_CLOSE)?;
            text.push_str(data);
            rest = tail;
        } else if let Some(after) = rest.strip_prefix(COMMENT_OPEN) {
            rest = split_at_marker(after, COMMENT_CLOSE)?.1;
        } else if let Some(after) = rest.strip_prefix(PI_OPEN) {
            rest = split_at_marker(after, PI_CLOSE)?.1;
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            if end == 0 {
                return Err(TranscodeError::malformed("unexpected markup inside leaf element"));
            }
            let chunk = unescape_xml(&rest[..end]).map_err(|e| shift_position(e, offset))?;
            text.push_str(&chunk);
            rest = &rest[end..];
        }
    }
    Ok(text)
}

/// Returns the byte offset and raw markup between an element's start and
/// end tags; empty for a self-closing element.
fn inner_markup<'f>(fragment: &'f str, node: Node<'_, '_>) -> TranscodeResult<(usize, &'f str)> {
    let range = node.range();
    let raw = fragment
        .get(range.clone())
        .ok_or_else(|| TranscodeError::malformed("element range outside the fragment"))?;

    let mut quote = None;
    let mut start_tag_end = None;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => {
                start_tag_end = Some(i);
                break;
            }
            (None, _) => {}
        }
    }
    let start_tag_end =
        start_tag_end.ok_or_else(|| TranscodeError::malformed("unterminated start tag"))?;
    if raw[..start_tag_end].ends_with('/') {
        return Ok((range.start + start_tag_end + 1, ""));
    }

    let inner_start = start_tag_end + 1;
    let inner_end = raw
        .rfind("</")
        .filter(|&end| end >= inner_start)
        .ok_or_else(|| TranscodeError::malformed("missing end tag"))?;
    Ok((range.start + inner_start, &raw[inner_start..inner_end]))
}

fn split_at_marker<'r>(raw: &'r str, marker: &str) -> TranscodeResult<(&'r str, &'r str)> {
    raw.find(marker)
        .map(|at| (&raw[..at], &raw[at + marker.len()..]))
        .ok_or_else(|| TranscodeError::malformed(format!("missing '{marker}'")))
}

/// Rebases an escape error position from a text chunk onto the fragment.
fn shift_position(err: TranscodeError, offset: usize) -> TranscodeError {
    match err {
        TranscodeError::MalformedEscapeSequence { position, reason } => {
            TranscodeError::malformed_escape(offset + position, reason)
        }
        other => other,
    }
}

fn xml_error(fragment: &str, err: &roxmltree::Error) -> TranscodeError {
    match err {
        roxmltree::Error::UnknownEntityReference(_, pos)
        | roxmltree::Error::MalformedEntityReference(pos) => {
            TranscodeError::malformed_escape(byte_offset(fragment, *pos), err.to_string())
        }
        _ => TranscodeError::malformed(format!("invalid XML: {err}")),
    }
}

/// Converts a 1-based row/column position into a byte offset.
fn byte_offset(text: &str, pos: TextPos) -> usize {
    let row = pos.row.saturating_sub(1) as usize;
    let col = pos.col.saturating_sub(1) as usize;
    let line_start: usize = text.split_inclusive('\n').take(row).map(str::len).sum();
    let line = text.get(line_start..).unwrap_or_default();
    line_start + line.chars().take(col).map(char::len_utf8).sum::<usize>()
}

/// Renders a predicate in the default (OGC) dialect.
#[must_use]
pub fn render_xml(predicate: &Predicate) -> String {
    render_xml_with(predicate, FilterDialect::Ogc)
}

/// Renders a predicate in the given dialect.
#[must_use]
pub fn render_xml_with(predicate: &Predicate, dialect: FilterDialect) -> String {
    let prefix = dialect.prefix();
    let element = predicate.kind().xml_element();
    let property_element = dialect.property_element();

    let literal = match predicate.range() {
        Some((low, high)) => format!("{}{RANGE_SEPARATOR}{}", low.to_xml_text(), high.to_xml_text()),
        None => predicate
            .values()
            .first()
            .map(Value::to_xml_text)
            .unwrap_or_default(),
    };

    let body = format!(
        "<{prefix}{element}>\
         <{prefix}{property_element}>{}</{prefix}{property_element}>\
         <{prefix}{LITERAL_ELEMENT}>{}</{prefix}{LITERAL_ELEMENT}>\
         </{prefix}{element}>",
        escape_xml(predicate.property()),
        escape_xml(&literal),
    );

    match dialect {
        FilterDialect::Ogc => body,
        FilterDialect::Fes2 => format!(
            "<{prefix}{FILTER_ELEMENT} xmlns:fes=\"{FES_NAMESPACE}\">{body}</{prefix}{FILTER_ELEMENT}>"
        ),
    }
}
