//! SMTP mailbox probing.
//!
//! The public entry point is [`probe_mailbox`], which runs a partial SMTP
//! dialogue against MX hosts in order and classifies the RCPT TO reply into
//! a [`MailboxStatus`]. A host that fails at the transport or protocol level
//! is skipped; the first host that answers RCPT TO decides.

mod error;
mod options;
mod probe;
mod session;
mod types;
mod util;

pub use error::SmtpError;
pub use options::ProbeOptions;
pub use probe::{MailboxProber, SmtpProber, probe_mailbox};
pub use session::{SmtpReply, SmtpSession, SmtpStream};
pub use types::{HostAttempt, MailboxStatus, ProbeReport};
