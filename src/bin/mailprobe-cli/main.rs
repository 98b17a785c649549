mod args;
mod output;

use std::io::{self, BufRead};

use anyhow::{Context, Result, bail};
use mailprobe_lib::{
    MxStatus, SmtpProber, Verifier, VerificationResult, check_syntax, resolve_mx_with_options,
};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    // codes de sortie : 0 OK, 2 au moins une adresse non valide, 1 fatal
    let all_ok = match &cli.cmd {
        Commands::Verify { emails } => run_verify(emails, &cli)?,
        Commands::Batch { input, stdin } => {
            let emails = if *stdin {
                read_stdin_lines()?
            } else if let Some(path) = input {
                read_input_file(path)?
            } else {
                bail!("batch needs --input FILE or --stdin");
            };
            run_verify(&emails, &cli)?
        }
        Commands::Syntax { email } => {
            let report = check_syntax(email);
            output::print_syntax(email, &report, &cli)?;
            report.ok
        }
        Commands::Mx { domain } => {
            let status = resolve_mx_with_options(domain, &cli.resolver_options());
            output::print_mx(domain, &status, &cli)?;
            matches!(status, MxStatus::Records(_))
        }
        Commands::Probe { email, hosts } => {
            let prober = SmtpProber::new(cli.probe_options());
            let report = prober.probe_report(email, hosts);
            output::print_probe(email, &report, &cli)?;
            report.status == mailprobe_lib::MailboxStatus::Exists
        }
    };

    if !all_ok {
        std::process::exit(2);
    }
    Ok(())
}

fn run_verify(emails: &[String], cli: &Cli) -> Result<bool> {
    let options = cli.verifier_options();
    let results: Vec<VerificationResult> = match Verifier::system(&options) {
        Ok(verifier) => verifier.verify_batch(emails, cli.workers),
        Err(err) => {
            // sans résolveur, chaque adresse passe quand même par la syntaxe
            tracing::warn!(error = %err, "system resolver unavailable");
            emails
                .iter()
                .map(|email| mailprobe_lib::verify_email_with_options(email, &options))
                .collect()
        }
    };
    output::write_reports(&results, cli)?;
    Ok(!output::any_not_valid(&results))
}

fn read_stdin_lines() -> Result<Vec<String>> {
    let mut emails = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        let email = line.trim();
        if !email.is_empty() {
            emails.push(email.to_string());
        }
    }
    Ok(emails)
}

#[cfg(feature = "with-csv")]
fn read_input_file(path: &str) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {path}"))?;
    mailprobe_lib::read_csv_emails(io::BufReader::new(file))
        .with_context(|| format!("read emails from {path}"))
}

#[cfg(not(feature = "with-csv"))]
fn read_input_file(_path: &str) -> Result<Vec<String>> {
    bail!("--input nécessite la feature 'with-csv'")
}
