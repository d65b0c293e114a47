//! Composite keys and bookmark encoding.
//!
//! A composite key is `\u{0}` + object type + `\u{0}` followed by each
//! attribute terminated by `\u{0}`. Lexicographic order of the encoded keys
//! groups every entity of one type together, so a prefix scan doubles as a
//! type-scoped iteration.

use shared_types::LedgerError;

const SEPARATOR: char = '\u{0}';

/// Build a composite key from an object type and attributes.
///
/// # Errors
///
/// [`LedgerError::InvalidCompositeKey`] if any component is empty-typed or
/// contains the separator.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String, LedgerError> {
    if object_type.is_empty() {
        return Err(LedgerError::InvalidCompositeKey("empty object type".into()));
    }
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(SEPARATOR);
    push_component(&mut key, object_type)?;
    for attr in attributes {
        push_component(&mut key, attr)?;
    }
    Ok(key)
}

fn push_component(key: &mut String, component: &str) -> Result<(), LedgerError> {
    if component.contains(SEPARATOR) {
        return Err(LedgerError::InvalidCompositeKey(component.replace(SEPARATOR, "\\0")));
    }
    key.push_str(component);
    key.push(SEPARATOR);
    Ok(())
}

/// Split a composite key into `(object_type, attributes)`.
///
/// Returns `None` for keys that are not composite.
#[must_use]
pub fn split_composite_key(key: &str) -> Option<(String, Vec<String>)> {
    let body = key.strip_prefix(SEPARATOR)?.strip_suffix(SEPARATOR)?;
    let mut parts = body.split(SEPARATOR).map(str::to_string);
    let object_type = parts.next()?;
    Some((object_type, parts.collect()))
}

/// Encode the key a page should resume from.
///
/// Callers that stop consuming a page early use this to hand out a bookmark
/// pointing at the first unconsumed record.
pub fn encode_bookmark(next_key: &str) -> String {
    hex::encode(next_key.as_bytes())
}

/// Decode a bookmark back into the resume key. Empty means "from the start".
pub(crate) fn decode_bookmark(bookmark: &str) -> Result<Option<String>, LedgerError> {
    if bookmark.is_empty() {
        return Ok(None);
    }
    let bytes = hex::decode(bookmark).map_err(|e| LedgerError::InvalidBookmark(e.to_string()))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| LedgerError::InvalidBookmark(e.to_string()))
}
