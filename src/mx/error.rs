use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;

use super::NotFoundReason;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("domain {domain} does not exist")]
    NxDomain { domain: String },
    #[error("no MX answer for {domain}")]
    NoAnswer { domain: String },
    #[error("MX lookup for {domain} timed out")]
    Timeout { domain: String },
    #[error("MX lookup failed: {source}")]
    Lookup {
        #[source]
        source: ResolveError,
    },
}

impl MxError {
    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(domain: &str, source: ResolveError) -> Self {
        let domain = domain.to_string();
        match source.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                Self::NxDomain { domain }
            }
            ResolveErrorKind::NoRecordsFound { .. } => Self::NoAnswer { domain },
            ResolveErrorKind::Timeout => Self::Timeout { domain },
            _ => Self::Lookup { source },
        }
    }

    /// Collapses the error into the annotation carried by `MxStatus::NotFound`.
    pub fn not_found_reason(&self) -> NotFoundReason {
        match self {
            Self::EmptyDomain => NotFoundReason::EmptyDomain,
            Self::NxDomain { .. } => NotFoundReason::NxDomain,
            Self::NoAnswer { .. } => NotFoundReason::NoAnswer,
            Self::Timeout { .. } => NotFoundReason::Timeout,
            Self::ResolverInit { .. } | Self::Lookup { .. } => {
                NotFoundReason::Other(self.to_string())
            }
        }
    }
}
