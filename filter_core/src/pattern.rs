//! Conversion between a user-entered substring and the backing `LIKE` pattern.
//!
//! `abc` is stored as `%abc%`. The reserved characters `%`, `_` and `\` are escaped with a
//! leading backslash, so `100%` becomes `%100\%%`.

use crate::error::{MalformedPatternError, MalformedPatternKind};

pub const DELIMITER: char = '%';
pub const ESCAPE: char = '\\';
pub const RESERVED: [char; 3] = ['%', '_', '\\'];

pub fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

pub fn pack(value: &str) -> String {
    let mut packed = String::with_capacity(value.len() + 2);
    packed.push(DELIMITER);
    for c in value.chars() {
        if is_reserved(c) {
            packed.push(ESCAPE);
        }
        packed.push(c);
    }
    packed.push(DELIMITER);
    packed
}

pub fn unpack(pattern: &str) -> Result<String, MalformedPatternError> {
    let error = |position: usize, kind: MalformedPatternKind| MalformedPatternError {
        pattern: pattern.to_string(),
        position,
        kind,
    };
    let inner = pattern
        .strip_prefix(DELIMITER)
        .and_then(|p| p.strip_suffix(DELIMITER))
        .ok_or_else(|| error(0, MalformedPatternKind::MissingDelimiter))?;

    let mut value = String::with_capacity(inner.len());
    let mut escaping = false;
    let mut position = 1;
    for c in inner.chars() {
        match (escaping, is_reserved(c)) {
            (true, true) => {
                escaping = false;
                value.push(c);
            }
            (true, false) => return Err(error(position, MalformedPatternKind::InvalidEscape(c))),
            (false, true) if c == ESCAPE => escaping = true,
            (false, true) => {
                return Err(error(position, MalformedPatternKind::UnescapedReserved(c)));
            }
            (false, false) => value.push(c),
        }
        position += 1;
    }
    if escaping {
        return Err(error(position, MalformedPatternKind::DanglingEscape));
    }
    Ok(value)
}
