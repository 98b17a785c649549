use std::fmt;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Why a domain yielded no usable mail exchanger. Diagnostic only: every
/// variant means the same thing to callers.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    EmptyDomain,
    NoRecords,
    /// Every record was an RFC 7505 null MX (`MX 0 .`).
    NullMx,
    NxDomain,
    NoAnswer,
    Timeout,
    Other(String),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain => f.write_str("domain is empty"),
            Self::NoRecords => f.write_str("no MX records"),
            Self::NullMx => f.write_str("null MX (domain accepts no mail)"),
            Self::NxDomain => f.write_str("domain does not exist"),
            Self::NoAnswer => f.write_str("no answer"),
            Self::Timeout => f.write_str("DNS timeout"),
            Self::Other(message) => write!(f, "resolution error: {message}"),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    /// Usable records, ascending preference; ties keep the DNS answer order.
    Records(Vec<MxRecord>),
    NotFound(NotFoundReason),
}

impl MxStatus {
    pub fn records(&self) -> &[MxRecord] {
        match self {
            Self::Records(records) => records.as_slice(),
            Self::NotFound(_) => &[],
        }
    }

    pub fn hosts(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|record| record.exchange.clone())
            .collect()
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Records(records) if !records.is_empty())
    }
}
