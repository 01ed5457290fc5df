use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use checkin_qr_core::{BackfillReport, DelimiterMode, PendingBackfill};

use crate::config::BackfillConfig;
use crate::console::Console;
use crate::report::{RunReport, RunState};

const TITLE: &str = "Participant UUID Backfill";

pub fn run(cfg: &BackfillConfig) -> Result<RunReport> {
    let stdout = io::stdout();
    run_with(cfg, stdout.lock(), PendingBackfill::open, PendingBackfill::fill)
}

fn run_with<W, O, F>(cfg: &BackfillConfig, out: W, open_fn: O, fill_fn: F) -> Result<RunReport>
where
    W: Write,
    O: FnOnce(&Path, &str, DelimiterMode) -> checkin_qr_core::Result<PendingBackfill>,
    F: FnOnce(PendingBackfill) -> checkin_qr_core::Result<BackfillReport>,
{
    let mut console = Console::new(out);
    let mut report = RunReport::default();
    console.banner(TITLE)?;

    report.advance(RunState::Validating);
    let pending = match open_fn(&cfg.input, &cfg.column, cfg.delimiter) {
        Ok(pending) => pending,
        Err(err) => {
            console.error(err)?;
            report.advance(RunState::Aborted);
            return Ok(report);
        }
    };
    report.loaded = pending.rows();
    console.ok(format!("Loaded {} rows", pending.rows()))?;

    report.advance(RunState::Processing);
    let outcome = match fill_fn(pending) {
        Ok(outcome) => outcome,
        Err(err) => {
            console.error(format!("Cannot rewrite '{}': {err}", cfg.input.display()))?;
            report.advance(RunState::Aborted);
            return Ok(report);
        }
    };
    report.generated = outcome.assigned;
    report.skipped = outcome.rows - outcome.assigned;
    if outcome.assigned == 0 {
        console.done(format!(
            "Every row already has a '{}' value; '{}' left unchanged",
            cfg.column,
            cfg.input.display()
        ))?;
    } else {
        console.done(format!(
            "Assigned {} new identifiers in '{}'",
            outcome.assigned,
            cfg.input.display()
        ))?;
    }
    report.advance(RunState::Done);
    Ok(report)
}
