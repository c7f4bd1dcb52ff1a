//! Character-level escaping for JSON string literals and XML text.
//!
//! Escaping is encoding-local: JSON only escapes what is structural inside a
//! JSON string (`"`, `\` and control characters) and XML only escapes what is
//! structural inside element text (`&`, `<`, `>`). Each `unescape_*` function
//! is the exact left inverse of its `escape_*` counterpart and rejects
//! malformed input instead of guessing.

use crate::error::{TranscodeError, TranscodeResult};

/// Escapes a raw string for embedding between the quotes of a JSON string.
#[must_use]
pub fn escape_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c < ' ' => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

/// Resolves the escape sequences of a JSON string literal body.
///
/// # Errors
///
/// Returns `TranscodeError::MalformedEscapeSequence` on a trailing lone
/// backslash, an unknown escape letter, a short or non-hex `\u` sequence, or
/// an unpaired UTF-16 surrogate.
pub fn unescape_json(escaped: &str) -> TranscodeResult<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    let mut offset = 0;

    while let Some(bs) = rest.find('\\') {
        out.push_str(&rest[..bs]);
        let position = offset + bs;
        let after = &rest[bs + 1..];

        let consumed = match after.chars().next() {
            None => return Err(TranscodeError::malformed_escape(position, "trailing backslash")),
            Some('"') => push_one(&mut out, '"'),
            Some('\\') => push_one(&mut out, '\\'),
            Some('/') => push_one(&mut out, '/'),
            Some('b') => push_one(&mut out, '\u{08}'),
            Some('f') => push_one(&mut out, '\u{0C}'),
            Some('n') => push_one(&mut out, '\n'),
            Some('r') => push_one(&mut out, '\r'),
            Some('t') => push_one(&mut out, '\t'),
            Some('u') => {
                let (c, len) = decode_unicode_escape(after, position)?;
                out.push(c);
                len
            }
            Some(other) => {
                return Err(TranscodeError::malformed_escape(
                    position,
                    format!("unknown escape '\\{other}'"),
                ))
            }
        };

        rest = &after[consumed..];
        offset = position + 1 + consumed;
    }

    out.push_str(rest);
    Ok(out)
}

fn push_one(out: &mut String, c: char) -> usize {
    out.push(c);
    1
}

/// Decodes `uXXXX` (and a following `\uXXXX` low surrogate when needed).
/// Returns the character and the number of bytes consumed from `after`.
fn decode_unicode_escape(after: &str, position: usize) -> TranscodeResult<(char, usize)> {
    let unit = hex4(after.get(1..5), position)?;
    let (code, consumed) = match unit {
        0xD800..=0xDBFF => {
            if after.get(5..7) != Some("\\u") {
                return Err(TranscodeError::malformed_escape(position, "unpaired high surrogate"));
            }
            let low = hex4(after.get(7..11), position)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(TranscodeError::malformed_escape(position, "unpaired high surrogate"));
            }
            (0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00), 11)
        }
        0xDC00..=0xDFFF => {
            return Err(TranscodeError::malformed_escape(position, "unpaired low surrogate"))
        }
        _ => (unit, 5),
    };
    let c = char::from_u32(code)
        .ok_or_else(|| TranscodeError::malformed_escape(position, "invalid code point"))?;
    Ok((c, consumed))
}

fn hex4(digits: Option<&str>, position: usize) -> TranscodeResult<u32> {
    digits
        .filter(|d| d.len() == 4 && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|d| u32::from_str_radix(d, 16).ok())
        .ok_or_else(|| TranscodeError::malformed_escape(position, "expected four hex digits after \\u"))
}

/// Returns true if `c` may appear in XML 1.0 character data, escaped or not.
#[must_use]
pub const fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Escapes a raw string for use as XML element text.
///
/// Quotes and backslashes are left alone; they carry no meaning in text.
#[must_use]
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolves entity and character references in XML text.
///
/// Accepts the five predefined entities plus decimal and hexadecimal
/// character references.
///
/// # Errors
///
/// Returns `TranscodeError::MalformedEscapeSequence` on an unterminated,
/// unknown or out-of-range reference.
pub fn unescape_xml(escaped: &str) -> TranscodeResult<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    let mut offset = 0;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let position = offset + amp;
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| TranscodeError::malformed_escape(position, "unterminated entity reference"))?;
        out.push(decode_entity(&after[..semi], position)?);

        let consumed = amp + 1 + semi + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }

    out.push_str(rest);
    Ok(out)
}

fn decode_entity(name: &str, position: usize) -> TranscodeResult<char> {
    let numeric = |digits: &str, radix: u32| {
        u32::from_str_radix(digits, radix)
            .ok()
            .filter(|_| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_alphanumeric()))
            .and_then(char::from_u32)
            .ok_or_else(|| {
                TranscodeError::malformed_escape(position, format!("invalid character reference '&{name};'"))
            })
    };

    match name {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        _ => {
            if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                numeric(hex, 16)
            } else if let Some(dec) = name.strip_prefix('#') {
                numeric(dec, 10)
            } else {
                Err(TranscodeError::malformed_escape(
                    position,
                    format!("unknown entity '&{name};'"),
                ))
            }
        }
    }
}
