use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("qr encoding failed: {0}")]
    Encode(String),
    #[error("'{}' not found", .0.display())]
    InputNotFound(PathBuf),
    #[error("Missing columns: [{}]", quoted_list(.0))]
    MissingColumns(Vec<String>),
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("'{0}' has no characters usable in a file name")]
    EmptyFileName(String),
    #[error("invalid {name}: {value}")]
    InvalidOption { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, QrError>;

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
