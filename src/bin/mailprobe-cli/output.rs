use std::fmt::Write as _;

use anyhow::{Context, Result, bail};

use mailprobe_lib::{MxStatus, OverallStatus, ProbeReport, SyntaxReport, VerificationResult};
#[cfg(feature = "with-csv")]
use mailprobe_lib::{ReportRow, write_csv_report};

use crate::args::Cli;

pub fn write_reports(results: &[VerificationResult], cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => emit(&render_human(results), cli),
        "json" => write_json(results, cli),
        "ndjson" => write_ndjson(results, cli),
        "csv" => write_csv(results, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn any_not_valid(results: &[VerificationResult]) -> bool {
    results
        .iter()
        .any(|result| result.overall_status() != OverallStatus::Valid)
}

fn render_human(results: &[VerificationResult]) -> String {
    let mut out = String::new();
    for result in results {
        let tag = match result.overall_status() {
            OverallStatus::Valid => "[VALID]  ",
            OverallStatus::InvalidSyntax => "[SYNTAX] ",
            OverallStatus::RiskyOrInvalid => "[RISKY]  ",
        };
        let _ = writeln!(out, "{tag}{}", result.address());
        if !result.syntax_valid() {
            continue;
        }
        let _ = match result.mx_not_found() {
            Some(reason) => writeln!(out, "         mx: none ({reason})"),
            None => writeln!(out, "         mailbox: {}", result.mailbox_status()),
        };
    }
    out
}

/// Text goes to `--out` (atomically) when given, to stdout otherwise.
fn emit(text: &str, cli: &Cli) -> Result<()> {
    match &cli.out {
        Some(path) => write_all_atomically(path, text.as_bytes()),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

#[cfg(feature = "with-serde")]
fn write_json(results: &[VerificationResult], cli: &Cli) -> Result<()> {
    let mut s = serde_json::to_string_pretty(results)?;
    s.push('\n');
    emit(&s, cli)
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[VerificationResult], _: &Cli) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson(results: &[VerificationResult], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        for result in results {
            let line = serde_json::to_string(result)?;
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        write_all_atomically(path, &buf)?;
    } else {
        for result in results {
            println!("{}", serde_json::to_string(result)?);
        }
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[VerificationResult], _: &Cli) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv(results: &[VerificationResult], cli: &Cli) -> Result<()> {
    let rows: Vec<ReportRow> = results.iter().map(ReportRow::from).collect();
    if let Some(path) = &cli.out {
        let mut data = Vec::new();
        write_csv_report(&mut data, &rows)?;
        write_all_atomically(path, &data)?;
    } else {
        write_csv_report(std::io::stdout().lock(), &rows)?;
    }
    Ok(())
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[VerificationResult], _: &Cli) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

pub fn print_syntax(address: &str, report: &SyntaxReport, cli: &Cli) -> Result<()> {
    if cli.format == "json" {
        return emit_json(report, cli);
    }
    let text = if report.ok {
        format!("[OK]    {address}\n")
    } else {
        format!("[INVALID] {address} :: {}\n", report.reasons.join("; "))
    };
    emit(&text, cli)
}

pub fn print_mx(domain: &str, status: &MxStatus, cli: &Cli) -> Result<()> {
    if cli.format == "json" {
        return emit_json(status, cli);
    }
    emit(&render_mx(domain, status), cli)
}

fn render_mx(domain: &str, status: &MxStatus) -> String {
    let mut out = String::new();
    match status {
        MxStatus::Records(records) => {
            let _ = writeln!(out, "{domain}:");
            for record in records {
                let _ = writeln!(out, "  {:>5} {}", record.preference, record.exchange);
            }
        }
        MxStatus::NotFound(reason) => {
            let _ = writeln!(out, "{domain}: no MX ({reason})");
        }
    }
    out
}

pub fn print_probe(address: &str, report: &ProbeReport, cli: &Cli) -> Result<()> {
    if cli.format == "json" {
        return emit_json(report, cli);
    }
    emit(&render_probe(address, report), cli)
}

fn render_probe(address: &str, report: &ProbeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{address}: {}", report.status);
    let _ = match (&report.answered_by, report.rcpt_code) {
        (Some(host), Some(code)) => writeln!(out, "  answered by {host} (RCPT {code})"),
        _ => writeln!(out, "  no host answered"),
    };
    if !report.hosts_tried.is_empty() {
        let _ = writeln!(out, "  hosts tried: {}", report.hosts_tried.join(", "));
    }
    out
}

#[cfg(feature = "with-serde")]
fn emit_json<T: serde::Serialize>(value: &T, cli: &Cli) -> Result<()> {
    let mut s = serde_json::to_string_pretty(value)?;
    s.push('\n');
    emit(&s, cli)
}

#[cfg(not(feature = "with-serde"))]
fn emit_json<T>(_: &T, _: &Cli) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}
