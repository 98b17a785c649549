#![forbid(unsafe_code)]
//! mailprobe_lib: vérification d'adresses e-mail sans envoi de message,
//! syntaxe, résolution MX (RFC 7505 null MX), sonde SMTP RCPT TO.

pub mod mx;
pub mod report;
pub mod smtp_verify;
pub mod validator;
pub mod verify;

pub use mx::{
    LookupMx, MxError, MxRecord, MxResolver, MxStatus, NotFoundReason, ResolverOptions,
    resolve_mx, resolve_mx_with_options,
};
pub use report::{REPORT_HEADERS, ReportRow};
#[cfg(feature = "with-csv")]
pub use report::{ReportError, read_csv_emails, write_csv_report};
pub use smtp_verify::{
    MailboxProber, MailboxStatus, ProbeOptions, ProbeReport, SmtpError, SmtpProber, probe_mailbox,
};
pub use validator::{EmailAddress, SyntaxError, SyntaxReport, check_syntax, validate_syntax};
pub use verify::{
    OverallStatus, VerificationResult, Verifier, VerifierOptions, verify_email,
    verify_email_with_options,
};
