use thiserror::Error;

/// Why a single MX host gave no answer. Every variant sends the probe on to
/// the next host; none of them reaches the caller of `probe_mailbox`.
#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable socket address for {host}")]
    NoAddresses { host: String },
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("TLS handshake with {host} failed: {source}")]
    TlsHandshake {
        host: String,
        #[source]
        source: native_tls::Error,
    },
    #[error("unexpected greeting {code}")]
    Greeting { code: u16 },
    #[error("HELO rejected with {code}")]
    HeloRejected { code: u16 },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SmtpError {
    /// Socket-level failure, as opposed to a server speaking bad SMTP.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. } | Self::NoAddresses { .. } | Self::Connect { .. } | Self::Io { .. }
        )
    }
}
