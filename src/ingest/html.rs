//! HTML cleanup for feed text.
//!
//! Feed summaries routinely arrive as entity-escaped HTML fragments. The
//! public `summary` field wants plain prose, so the pipeline is: strip
//! tags and newlines, decode entities, trim. Titles get only the entity
//! decoding pass.
//!
//! These are single-pass byte scanners in the spirit of a hand-rolled
//! text cleaner, not an HTML parser — feeds in the wild are too messy
//! for strictness to pay off.

use std::borrow::Cow;

/// Removes `<...>` tag runs and newline characters.
///
/// A `<` with no closing `>` is treated as literal text (nothing after it
/// is a well-formed tag anyway). Returns `Cow::Borrowed` when the input
/// contains neither tags nor newlines, which is the common case for
/// plain-text summaries.
pub fn strip_tags_and_newlines(s: &str) -> Cow<'_, str> {
    if !s.contains('<') && !s.contains('\n') && !s.contains('\r') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // unterminated tag, keep the tail as text
                out.push_str(&rest[open..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.retain(|c| c != '\n' && c != '\r');
    Cow::Owned(out)
}

/// Decodes HTML entities: the XML builtins, the common named set feeds
/// actually use, and numeric references (`&#34;`, `&#x22;`).
///
/// Unrecognized entities are kept literally — dropping them would eat
/// legitimate text like "R&B;".
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        // entity names are short; don't scan the whole string for a ';'
        let semi = tail[..tail.len().min(12)].find(';');
        match semi {
            Some(semi) if semi > 1 => {
                let name = &tail[1..semi];
                match decode_entity(name) {
                    Some(c) => {
                        out.push(c);
                        rest = &tail[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        _ => return None,
    };
    Some(c)
}

/// Derives the public summary from a raw feed summary:
/// strip tags/newlines, decode entities, trim surrounding whitespace.
pub fn sanitize_summary(raw: &str) -> String {
    let stripped = strip_tags_and_newlines(raw);
    decode_entities(&stripped).trim().to_string()
}
