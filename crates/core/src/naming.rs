use crate::error::{QrError, Result};
use crate::payload::Payload;

const UUID_PREFIX_LEN: usize = 4;

/// Keeps ASCII letters, digits, `_` and `-`; drops everything else.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Base file name (no extension) for a payload.
///
/// Participant payloads use the sanitized name plus the first four
/// characters of the uuid. Two rows sharing both still map to the same
/// name; callers decide whether that overwrites or is reported.
pub fn base_filename(payload: &Payload) -> Result<String> {
    let base = match payload {
        Payload::Id { id } => sanitize(id),
        Payload::Participant { uuid, name, .. } => {
            let prefix = uuid.chars().take(UUID_PREFIX_LEN).collect::<String>();
            format!("{}_{}", sanitize(name), sanitize(&prefix))
        }
    };
    if base.trim_matches('_').is_empty() {
        let source = match payload {
            Payload::Id { id } => id.clone(),
            Payload::Participant { name, .. } => name.clone(),
        };
        return Err(QrError::EmptyFileName(source));
    }
    Ok(base)
}
