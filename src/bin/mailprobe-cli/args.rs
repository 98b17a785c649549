use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use mailprobe_lib::{ProbeOptions, ResolverOptions, VerifierOptions};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// format: human|json|ndjson|csv
    #[arg(long, global = true, default_value = "human")]
    pub format: String,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// nombre de vérifications menées en parallèle
    #[arg(long, global = true, default_value_t = 4)]
    pub workers: usize,

    /// port SMTP des MX
    #[arg(long, global = true, default_value_t = 25)]
    pub port: u16,

    /// nom annoncé en EHLO/HELO (par défaut: nom de la machine)
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM (par défaut no-reply@<domaine du HELO>)
    #[arg(long = "from", global = true)]
    pub mail_from: Option<String>,

    #[arg(long, global = true, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    #[arg(long, global = true, default_value_t = 10_000)]
    pub command_timeout_ms: u64,

    /// timeout DNS par tentative
    #[arg(long, global = true, default_value_t = 5_000)]
    pub dns_timeout_ms: u64,

    /// budget DNS total par requête
    #[arg(long, global = true, default_value_t = 10_000)]
    pub dns_lifetime_ms: u64,

    /// n'essaie pas STARTTLS
    #[arg(long, global = true)]
    pub no_starttls: bool,

    /// vérifie le certificat TLS des MX
    #[arg(long, global = true)]
    pub verify_tls: bool,

    /// ignore les adresses IPv6 des MX
    #[arg(long, global = true)]
    pub no_ipv6: bool,

    /// logs détaillés sur stderr (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// vérification complète: syntaxe, MX, sonde SMTP
    Verify {
        #[arg(required = true)]
        emails: Vec<String>,
    },
    /// vérifie une liste: CSV avec colonne `Email`, ou une adresse par ligne sur stdin
    Batch {
        #[arg(long, conflicts_with = "stdin", required_unless_present = "stdin")]
        input: Option<String>,
        #[arg(long)]
        stdin: bool,
    },
    /// contrôle de syntaxe seul
    Syntax { email: String },
    /// résout les MX d'un domaine
    Mx { domain: String },
    /// sonde une adresse sur des hôtes SMTP donnés
    Probe {
        email: String,
        /// hôte SMTP à interroger (répétable, dans l'ordre)
        #[arg(long = "host", required = true)]
        hosts: Vec<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "mailprobe_lib=debug,info",
            _ => "mailprobe_lib=trace,debug",
        }
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: Duration::from_millis(self.dns_timeout_ms),
            lifetime: Duration::from_millis(self.dns_lifetime_ms),
        }
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            command_timeout: Duration::from_millis(self.command_timeout_ms),
            helo_name: self.helo.clone(),
            mail_from: self.mail_from.clone(),
            starttls: !self.no_starttls,
            verify_tls: self.verify_tls,
            ipv6: !self.no_ipv6,
        }
    }

    pub fn verifier_options(&self) -> VerifierOptions {
        VerifierOptions {
            resolver: self.resolver_options(),
            probe: self.probe_options(),
        }
    }
}
