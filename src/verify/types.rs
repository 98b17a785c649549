use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::mx::NotFoundReason;
use crate::smtp_verify::MailboxStatus;

/// Final verdict for one address, derived from the three checks.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallStatus {
    Valid,
    InvalidSyntax,
    RiskyOrInvalid,
}

impl OverallStatus {
    pub fn derive(syntax_valid: bool, has_mx: bool, mailbox: MailboxStatus) -> Self {
        if !syntax_valid {
            Self::InvalidSyntax
        } else if has_mx && mailbox == MailboxStatus::Exists {
            Self::Valid
        } else {
            Self::RiskyOrInvalid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::InvalidSyntax => "InvalidSyntax",
            Self::RiskyOrInvalid => "RiskyOrInvalid",
        }
    }

    /// Wording used in the report columns.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::InvalidSyntax => "Invalid Syntax",
            Self::RiskyOrInvalid => "Risky / Invalid",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-address verdict. Fields are fixed at construction so the status
/// invariants always hold; deserialization recomputes the derived fields.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(from = "ResultFields"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    address: String,
    syntax_valid: bool,
    has_mx: bool,
    mailbox_status: MailboxStatus,
    overall_status: OverallStatus,
    #[cfg_attr(
        feature = "with-serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    mx_not_found: Option<NotFoundReason>,
}

/// Wire form of [`VerificationResult`]; `overall_status` is ignored on input.
#[cfg(feature = "with-serde")]
#[derive(Deserialize)]
struct ResultFields {
    address: String,
    syntax_valid: bool,
    has_mx: bool,
    mailbox_status: MailboxStatus,
    #[serde(default)]
    mx_not_found: Option<NotFoundReason>,
}

#[cfg(feature = "with-serde")]
impl From<ResultFields> for VerificationResult {
    fn from(fields: ResultFields) -> Self {
        Self::build(
            &fields.address,
            fields.syntax_valid,
            fields.has_mx,
            fields.mailbox_status,
            fields.mx_not_found,
        )
    }
}

impl VerificationResult {
    pub(crate) fn invalid_syntax(address: &str) -> Self {
        Self::build(address, false, false, MailboxStatus::Unverifiable, None)
    }

    pub(crate) fn without_mx(address: &str, reason: NotFoundReason) -> Self {
        Self::build(address, true, false, MailboxStatus::Unverifiable, Some(reason))
    }

    pub(crate) fn probed(address: &str, mailbox_status: MailboxStatus) -> Self {
        Self::build(address, true, true, mailbox_status, None)
    }

    fn build(
        address: &str,
        syntax_valid: bool,
        has_mx: bool,
        mailbox_status: MailboxStatus,
        mx_not_found: Option<NotFoundReason>,
    ) -> Self {
        let has_mx = syntax_valid && has_mx;
        let mx_not_found = if has_mx { None } else { mx_not_found };
        let mailbox_status = if has_mx {
            mailbox_status
        } else {
            MailboxStatus::Unverifiable
        };
        Self {
            address: address.to_string(),
            syntax_valid,
            has_mx,
            mailbox_status,
            overall_status: OverallStatus::derive(syntax_valid, has_mx, mailbox_status),
            mx_not_found,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn syntax_valid(&self) -> bool {
        self.syntax_valid
    }

    pub fn has_mx(&self) -> bool {
        self.has_mx
    }

    pub fn mailbox_status(&self) -> MailboxStatus {
        self.mailbox_status
    }

    pub fn overall_status(&self) -> OverallStatus {
        self.overall_status
    }

    /// Why MX resolution came back empty, for diagnostics.
    pub fn mx_not_found(&self) -> Option<&NotFoundReason> {
        self.mx_not_found.as_ref()
    }
}
