//! Identifier codec.
//!
//! TaskJuggler identifiers are restricted to `[A-Za-z_][A-Za-z0-9_]*`, while
//! external keys are tracker keys (`PRJ-12`), numeric row ids (`42`) or free
//! text (`Write docs`). The codec maps keys onto the identifier alphabet with
//! three reserved markers:
//!
//! | Key feature | Marker |
//! |-------------|--------|
//! | leading digit (all numeric keys) | `_n_` prefix |
//! | `-` | `_d_` |
//! | ` ` (space) | `_s_` |
//!
//! Markers compose: `12-a b` encodes to `_n_12_d_a_s_b`.
//!
//! # Precondition
//!
//! Markers are ordinary substrings, so a key that already contains one (or
//! whose underscores combine with an encoded character into one) cannot be
//! decoded back. [`check_key`] rejects such keys; the loader calls it for
//! every record identifier. Keys that pass [`check_key`] satisfy
//! `decode(encode(k)) == k`, hence two accepted keys never share an
//! identifier.

use crate::error::KeyError;

/// Prefix for keys starting with a digit.
pub const NUMERIC_MARKER: &str = "_n_";
/// Replacement for `-`.
pub const DASH_MARKER: &str = "_d_";
/// Replacement for a space.
pub const SPACE_MARKER: &str = "_s_";
/// All reserved tokens.
pub const RESERVED_TOKENS: [&str; 3] = [NUMERIC_MARKER, DASH_MARKER, SPACE_MARKER];

/// Encodes an external key as a TaskJuggler identifier.
pub fn encode(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + NUMERIC_MARKER.len());
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        out.push_str(NUMERIC_MARKER);
    }
    for c in key.chars() {
        match c {
            '-' => out.push_str(DASH_MARKER),
            ' ' => out.push_str(SPACE_MARKER),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes an identifier produced by [`encode`] back to its key.
///
/// The numeric marker is stripped first; dash and space markers are then
/// substituted in one left-to-right scan so adjacent markers cannot merge.
pub fn decode(identifier: &str) -> String {
    let mut rest = identifier
        .strip_prefix(NUMERIC_MARKER)
        .unwrap_or(identifier);
    let mut out = String::with_capacity(rest.len());

    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix(DASH_MARKER) {
            out.push('-');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(SPACE_MARKER) {
            out.push(' ');
            rest = tail;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// Checks that `key` can be encoded losslessly.
///
/// # Errors
/// - [`KeyError::Empty`] for the empty string
/// - [`KeyError::InvalidCharacter`] for characters outside `[A-Za-z0-9_ -]`
/// - [`KeyError::ReservedToken`] when a marker already occurs in the key
/// - [`KeyError::NotInvertible`] when underscores in the key combine with
///   an encoded character into a marker
pub fn check_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if let Some(ch) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' ')))
    {
        return Err(KeyError::InvalidCharacter {
            key: key.to_string(),
            ch,
        });
    }
    if let Some(token) = RESERVED_TOKENS.into_iter().find(|t| key.contains(*t)) {
        return Err(KeyError::ReservedToken {
            key: key.to_string(),
            token,
        });
    }
    if decode(&encode(key)) != key {
        return Err(KeyError::NotInvertible {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Whether `s` is a syntactically valid TaskJuggler identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
