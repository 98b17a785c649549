use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for [`SmtpProber`](crate::smtp_verify::SmtpProber).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub port: u16,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    /// Name sent with EHLO/HELO; the local hostname when unset.
    pub helo_name: Option<String>,
    /// Envelope sender; `no-reply@<helo suffix>` when unset.
    pub mail_from: Option<String>,
    pub starttls: bool,
    /// Verify server certificates during STARTTLS. Off by default: the
    /// upgrade is opportunistic.
    pub verify_tls: bool,
    pub ipv6: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(10),
            helo_name: None,
            mail_from: None,
            starttls: true,
            verify_tls: false,
            ipv6: true,
        }
    }
}

impl ProbeOptions {
    /// A zero duration disables the connect deadline.
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero(self.connect_timeout)
    }

    /// A zero duration disables the read/write deadline.
    pub fn command_timeout(&self) -> Option<Duration> {
        non_zero(self.command_timeout)
    }
}

fn non_zero(duration: Duration) -> Option<Duration> {
    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
