//! Participant tables in, check-in QR codes out.

mod backfill;
mod error;
mod json;
mod naming;
mod payload;
mod qr;
mod table;

pub use backfill::{
    backfill_uuids, backfill_with, BackfillReport, PendingBackfill, DEFAULT_UUID_COLUMN,
};
pub use error::{QrError, Result};
pub use json::to_ascii_json;
pub use naming::{base_filename, sanitize};
pub use payload::{build_payload, Payload, Variant, COL_NAME, COL_TEAM, COL_UNIQUE_ID, COL_UUID};
pub use qr::{
    encode_matrix, render, QrSettings, QrWriter, WrittenCode, DEFAULT_BORDER, DEFAULT_MODULE_SIZE,
};
pub use table::{normalize_column, Delimiter, DelimiterMode, ParticipantRow, Table};
