use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::smtp_verify::error::SmtpError;

/// Classification of a mailbox from the RCPT TO reply.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MailboxStatus {
    /// RCPT TO accepted (250 or 251).
    Exists,
    /// RCPT TO rejected with 550, 551 or 553.
    DoesNotExist,
    /// Anything else, including every host failing.
    #[default]
    Unverifiable,
}

impl MailboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
            Self::Unverifiable => "Unverifiable",
        }
    }

    pub fn from_rcpt_code(code: u16) -> Self {
        match code {
            250 | 251 => Self::Exists,
            550 | 551 | 553 => Self::DoesNotExist,
            _ => Self::Unverifiable,
        }
    }
}

impl fmt::Display for MailboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the dialogue with one host.
#[derive(Debug)]
pub enum HostAttempt {
    /// The dialogue reached RCPT TO: decisive, whatever the status.
    Classified { status: MailboxStatus, code: u16 },
    /// Transport or protocol failure: the host gave no answer.
    Failed(SmtpError),
}

/// Result of [`SmtpProber::probe_report`](crate::smtp_verify::SmtpProber::probe_report).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: MailboxStatus,
    pub hosts_tried: Vec<String>,
    /// The decisive host, when one answered.
    pub answered_by: Option<String>,
    pub rcpt_code: Option<u16>,
}

impl ProbeReport {
    pub(crate) fn unanswered(hosts_tried: Vec<String>) -> Self {
        Self {
            status: MailboxStatus::Unverifiable,
            hosts_tried,
            answered_by: None,
            rcpt_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rcpt_codes_classification() {
        assert_eq!(MailboxStatus::from_rcpt_code(250), MailboxStatus::Exists);
        assert_eq!(MailboxStatus::from_rcpt_code(251), MailboxStatus::Exists);
        for code in [550, 551, 553] {
            assert_eq!(MailboxStatus::from_rcpt_code(code), MailboxStatus::DoesNotExist);
        }
        for code in [421, 450, 451, 452, 252, 503, 552, 554, 0] {
            assert_eq!(MailboxStatus::from_rcpt_code(code), MailboxStatus::Unverifiable);
        }
    }

    #[test]
    fn default_is_unverifiable() {
        assert_eq!(MailboxStatus::default(), MailboxStatus::Unverifiable);
        assert_eq!(MailboxStatus::DoesNotExist.to_string(), "DoesNotExist");
    }
}
