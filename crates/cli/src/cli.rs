use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "checkin-qr",
    version,
    about = "Generate check-in QR codes from a participant table"
)]
pub struct Cli {
    /// TOML file with defaults for every command
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one QR code PNG per participant row
    Generate(GenerateArgs),
    /// Fill empty UUID cells in place
    Backfill(BackfillArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Participant table (comma or tab separated, header row required)
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Directory receiving the PNG files
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Payload shape: `id` or `full`
    #[arg(long)]
    pub variant: Option<String>,
    /// `auto`, `comma` or `tab`
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Pixels per QR module
    #[arg(long = "module-size")]
    pub module_size: Option<u32>,
    /// Quiet zone width in modules
    #[arg(long)]
    pub border: Option<u32>,
    /// Banner printed at the top of the run
    #[arg(long)]
    pub title: Option<String>,
    /// Report a repeated file name as a row error instead of overwriting
    #[arg(long = "detect-collisions", action = ArgAction::SetTrue)]
    pub detect_collisions: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BackfillArgs {
    #[arg(long)]
    pub input: Option<PathBuf>,
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Identifier column, matched case-insensitively
    #[arg(long)]
    pub column: Option<String>,
}
