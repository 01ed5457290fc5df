use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use checkin_qr_core::{
    DelimiterMode, QrSettings, Variant, DEFAULT_BORDER, DEFAULT_MODULE_SIZE, DEFAULT_UUID_COLUMN,
};
use serde::Deserialize;

use crate::cli::{BackfillArgs, GenerateArgs};

pub const DEFAULT_CONFIG: &str = "checkin-qr.toml";
pub const DEFAULT_ID_INPUT: &str = "Actual_checkin_participants.csv";
pub const DEFAULT_FULL_INPUT: &str = "participants.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "qr_codes";
pub const DEFAULT_TITLE: &str = "Check-in QR Code Generator";

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub generate: GenerateDefaults,
    #[serde(default)]
    pub backfill: BackfillDefaults,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateDefaults {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub variant: Option<String>,
    pub delimiter: Option<String>,
    pub module_size: Option<u32>,
    pub border: Option<u32>,
    pub title: Option<String>,
    pub detect_collisions: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackfillDefaults {
    pub input: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub column: Option<String>,
}

/// Everything a generate run needs, fixed before the first row is read.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub variant: Variant,
    pub delimiter: DelimiterMode,
    pub qr: QrSettings,
    pub title: String,
    pub detect_collisions: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    pub input: PathBuf,
    pub delimiter: DelimiterMode,
    pub column: String,
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}

pub fn resolve_generate(
    args: &GenerateArgs,
    defaults: &GenerateDefaults,
    verbose: bool,
) -> Result<GenerateConfig> {
    let variant = match args.variant.as_deref().or(defaults.variant.as_deref()) {
        Some(raw) => raw.parse::<Variant>()?,
        None => Variant::default(),
    };
    let delimiter = parse_delimiter(args.delimiter.as_deref().or(defaults.delimiter.as_deref()))?;
    let input = args
        .input
        .clone()
        .or_else(|| defaults.input.clone())
        .unwrap_or_else(|| PathBuf::from(default_input(variant)));
    let output_dir = args
        .output
        .clone()
        .or_else(|| defaults.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let qr = QrSettings::new(
        args.module_size
            .or(defaults.module_size)
            .unwrap_or(DEFAULT_MODULE_SIZE),
        args.border.or(defaults.border).unwrap_or(DEFAULT_BORDER),
    )?;
    let title = args
        .title
        .clone()
        .or_else(|| defaults.title.clone())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    Ok(GenerateConfig {
        input,
        output_dir,
        variant,
        delimiter,
        qr,
        title,
        detect_collisions: args.detect_collisions || defaults.detect_collisions.unwrap_or(false),
        verbose,
    })
}

pub fn resolve_backfill(args: &BackfillArgs, defaults: &BackfillDefaults) -> Result<BackfillConfig> {
    let delimiter = parse_delimiter(args.delimiter.as_deref().or(defaults.delimiter.as_deref()))?;
    let input = args
        .input
        .clone()
        .or_else(|| defaults.input.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FULL_INPUT));
    let column = args
        .column
        .clone()
        .or_else(|| defaults.column.clone())
        .unwrap_or_else(|| DEFAULT_UUID_COLUMN.to_string());
    Ok(BackfillConfig {
        input,
        delimiter,
        column,
    })
}

fn default_input(variant: Variant) -> &'static str {
    match variant {
        Variant::IdOnly => DEFAULT_ID_INPUT,
        Variant::Full => DEFAULT_FULL_INPUT,
    }
}

fn parse_delimiter(raw: Option<&str>) -> Result<DelimiterMode> {
    Ok(match raw {
        Some(value) => value.parse()?,
        None => DelimiterMode::Auto,
    })
}
