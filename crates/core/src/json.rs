use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::error::{QrError, Result};

/// Compact formatter that writes every non-ASCII character as a `\uXXXX`
/// escape (surrogate pairs outside the BMP).
#[derive(Debug, Default, Clone, Copy)]
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            if start < idx {
                writer.write_all(fragment[start..idx].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        if start < fragment.len() {
            writer.write_all(fragment[start..].as_bytes())?;
        }
        Ok(())
    }
}

/// Serializes `value` as compact, ASCII-only JSON.
pub fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::with_capacity(64);
    {
        let mut ser = Serializer::with_formatter(&mut buf, AsciiFormatter);
        value.serialize(&mut ser)?;
    }
    String::from_utf8(buf).map_err(|err| QrError::Encode(err.to_string()))
}
