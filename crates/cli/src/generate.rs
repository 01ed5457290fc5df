use std::collections::HashMap;
use std::io::{self, Write};

use anyhow::Result;
use checkin_qr_core::{
    base_filename, build_payload, ParticipantRow, Payload, QrError, QrWriter, Table, WrittenCode,
};
use thiserror::Error;

use crate::config::GenerateConfig;
use crate::console::Console;
use crate::report::{RunReport, RunState};

#[derive(Debug, Error)]
enum RowError {
    #[error(transparent)]
    Qr(#[from] QrError),
    #[error("file name '{base}' was already written for row {first_line}")]
    Collision { base: String, first_line: usize },
}

pub fn run(cfg: &GenerateConfig) -> Result<RunReport> {
    let writer = QrWriter::new(&cfg.output_dir, cfg.qr);
    let stdout = io::stdout();
    run_with(
        cfg,
        stdout.lock(),
        || writer.prepare(),
        |payload, base| writer.write(payload, base),
    )
}

fn run_with<W, P, F>(
    cfg: &GenerateConfig,
    out: W,
    prepare_fn: P,
    mut write_fn: F,
) -> Result<RunReport>
where
    W: Write,
    P: FnOnce() -> checkin_qr_core::Result<()>,
    F: FnMut(&Payload, &str) -> checkin_qr_core::Result<WrittenCode>,
{
    let mut console = Console::new(out);
    let mut report = RunReport::default();
    console.banner(&cfg.title)?;

    report.advance(RunState::Validating);
    let table = match load_validated(cfg) {
        Ok(table) => table,
        Err(err) => {
            console.error(&err)?;
            match err {
                QrError::InputNotFound(_) | QrError::MissingColumns(_) => {
                    console.detail(format!(
                        "The table must have these columns: {}",
                        cfg.variant.required_columns().join(", ")
                    ))?;
                }
                _ => {}
            }
            report.advance(RunState::Aborted);
            return Ok(report);
        }
    };
    report.loaded = table.len();
    console.ok(format!("Loaded {} participants", table.len()))?;
    if let Err(err) = prepare_fn() {
        console.error(format!(
            "Cannot create output directory '{}': {err}",
            cfg.output_dir.display()
        ))?;
        report.advance(RunState::Aborted);
        return Ok(report);
    }
    console.ok(format!("Output directory '{}' ready", cfg.output_dir.display()))?;
    console.blank()?;
    console.line("Generating QR codes...")?;
    console.rule('-')?;

    report.advance(RunState::Processing);
    let mut written_by: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        match process_row(&row, cfg, &mut written_by, &mut write_fn) {
            Ok(Some((payload, code))) => {
                report.generated += 1;
                console.ok(payload.label())?;
                console.detail(format!("File: {}", code.path.display()))?;
                if cfg.verbose {
                    console.detail(format!("Payload: {}", code.json))?;
                }
                console.blank()?;
            }
            Ok(None) => {
                report.skipped += 1;
                tracing::debug!(line = row.line, "nothing to encode, row skipped");
            }
            Err(err) => {
                report.failed += 1;
                console.error(format!("Row {}: {err}", row.line))?;
            }
        }
    }

    console.rule('=')?;
    console.done(format!(
        "Generated {} QR codes in '{}' ({} rows loaded, {} skipped, {} failed)",
        report.generated,
        cfg.output_dir.display(),
        report.loaded,
        report.skipped,
        report.failed
    ))?;
    report.advance(RunState::Done);
    Ok(report)
}

fn load_validated(cfg: &GenerateConfig) -> checkin_qr_core::Result<Table> {
    let table = Table::load(&cfg.input, cfg.delimiter)?;
    table.require_columns(cfg.variant.required_columns())?;
    Ok(table)
}

fn process_row<F>(
    row: &ParticipantRow,
    cfg: &GenerateConfig,
    written_by: &mut HashMap<String, usize>,
    write_fn: &mut F,
) -> std::result::Result<Option<(Payload, WrittenCode)>, RowError>
where
    F: FnMut(&Payload, &str) -> checkin_qr_core::Result<WrittenCode>,
{
    let Some(payload) = build_payload(row, cfg.variant)? else {
        return Ok(None);
    };
    let base = base_filename(&payload)?;
    if let Some(&first_line) = written_by.get(&base) {
        if cfg.detect_collisions {
            return Err(RowError::Collision { base, first_line });
        }
        tracing::debug!(line = row.line, first_line, base = %base, "overwriting earlier file");
    }
    let code = write_fn(&payload, &base)?;
    written_by.insert(base, row.line);
    Ok(Some((payload, code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_qr_core::{DelimiterMode, QrSettings, Variant};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn config(input: PathBuf, output_dir: PathBuf, variant: Variant) -> GenerateConfig {
        GenerateConfig {
            input,
            output_dir,
            variant,
            delimiter: DelimiterMode::Auto,
            qr: QrSettings::default(),
            title: "Test Run".to_string(),
            detect_collisions: false,
            verbose: false,
        }
    }

    fn run_real(cfg: &GenerateConfig) -> (RunReport, String) {
        let writer = QrWriter::new(&cfg.output_dir, cfg.qr);
        let mut out = Vec::new();
        let report = run_with(
            cfg,
            &mut out,
            || writer.prepare(),
            |payload, base| writer.write(payload, base),
        )
        .unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    fn png_names(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn full_variant_writes_one_file_per_named_row() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("participants.csv");
        fs::write(
            &input,
            "UUID,Name,Team Name\na1b2c3d4-x,Jane Doe,Red\n,No Id,Blue\nff00aa11,,Green\n99887766,Solo,\n",
        )
        .unwrap();
        let out_dir = dir.path().join("qr_codes");
        let cfg = config(input, out_dir.clone(), Variant::Full);

        let (report, text) = run_real(&cfg);

        assert_eq!(report.state, RunState::Done);
        assert_eq!(report.loaded, 4);
        assert_eq!(report.generated, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(png_names(&out_dir), vec!["JaneDoe_a1b2.png", "Solo_9988.png"]);
        assert!(text.contains("[OK] Loaded 4 participants"));
        assert!(text.contains("[OK] Jane Doe (Red)"));
        assert!(text.contains("[OK] Solo\n"));
        assert!(!text.contains("[ERROR]"));
        assert!(text.contains("[DONE] Generated 2 QR codes in"));
    }

    #[test]
    fn id_variant_reports_identifier() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("checkin.csv");
        fs::write(&input, "Unique ID,Name\nT-042,Jane\n").unwrap();
        let out_dir = dir.path().join("out");
        let mut cfg = config(input, out_dir.clone(), Variant::IdOnly);
        cfg.verbose = true;

        let (report, text) = run_real(&cfg);

        assert!(report.succeeded());
        assert_eq!(png_names(&out_dir), vec!["T-042.png"]);
        assert!(text.contains("[OK] ID: T-042"));
        assert!(text.contains(r#"    Payload: {"id":"T-042"}"#));
    }

    #[test]
    fn missing_columns_abort_before_any_row() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("participants.csv");
        fs::write(&input, "uuid,name\nu1,Jane\n").unwrap();
        let out_dir = dir.path().join("qr_codes");
        let cfg = config(input, out_dir.clone(), Variant::Full);

        let (report, text) = run_real(&cfg);

        assert_eq!(report.state, RunState::Aborted);
        assert_eq!(report.generated, 0);
        assert!(text.contains("[ERROR] Missing columns: ['team name']"));
        assert!(!text.contains("[DONE]"));
        assert!(!out_dir.exists());
    }

    #[test]
    fn missing_input_aborts() {
        let dir = tempdir().unwrap();
        let cfg = config(
            dir.path().join("absent.csv"),
            dir.path().join("qr_codes"),
            Variant::IdOnly,
        );
        let (report, text) = run_real(&cfg);
        assert_eq!(report.state, RunState::Aborted);
        assert!(text.contains("[ERROR] '"));
        assert!(text.contains("absent.csv' not found"));
        assert!(text.contains("unique id"));
    }

    #[test]
    fn row_failure_does_not_stop_later_rows() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("checkin.csv");
        fs::write(&input, "Unique ID\nA-1\nB-2\n!!!\nC-3\n").unwrap();
        let cfg = config(input, dir.path().join("unused"), Variant::IdOnly);
        let mut written = Vec::new();
        let mut out = Vec::new();

        let report = run_with(
            &cfg,
            &mut out,
            || Ok(()),
            |payload, base| {
                if base == "B-2" {
                    return Err(QrError::Encode("disk on fire".into()));
                }
                written.push(base.to_string());
                Ok(WrittenCode {
                    path: PathBuf::from(format!("{base}.png")),
                    json: checkin_qr_core::to_ascii_json(payload)?,
                })
            },
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(written, vec!["A-1", "C-3"]);
        assert_eq!(report.generated, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.state, RunState::Done);
        assert!(text.contains("[ERROR] Row 3: qr encoding failed: disk on fire"));
        assert!(text.contains("[ERROR] Row 4: '!!!' has no characters usable in a file name"));
    }

    #[test]
    fn duplicate_names_overwrite_unless_detection_is_on() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("participants.csv");
        fs::write(
            &input,
            "uuid,name,team name\nabcd-1,Jane Doe,Red\nabcd-2,Jane Doe,Blue\n",
        )
        .unwrap();

        let out_dir = dir.path().join("plain");
        let cfg = config(input.clone(), out_dir.clone(), Variant::Full);
        let (report, _) = run_real(&cfg);
        assert_eq!(report.generated, 2);
        assert_eq!(png_names(&out_dir), vec!["JaneDoe_abcd.png"]);

        let out_dir = dir.path().join("checked");
        let mut cfg = config(input, out_dir.clone(), Variant::Full);
        cfg.detect_collisions = true;
        let (report, text) = run_real(&cfg);
        assert_eq!(report.generated, 1);
        assert_eq!(report.failed, 1);
        assert!(text.contains(
            "[ERROR] Row 3: file name 'JaneDoe_abcd' was already written for row 2"
        ));
    }

    #[test]
    fn output_directory_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("checkin.csv");
        fs::write(&input, "Unique ID\nA-1\n").unwrap();
        let cfg = config(input, dir.path().join("out"), Variant::IdOnly);
        let mut out = Vec::new();
        let report = run_with(
            &cfg,
            &mut out,
            || {
                Err(QrError::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "denied",
                )))
            },
            |_, _| -> checkin_qr_core::Result<WrittenCode> {
                unreachable!("no row may be written")
            },
        )
        .unwrap();
        assert_eq!(report.state, RunState::Aborted);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[ERROR] Cannot create output directory"));
    }
}
