//! Per-address verification: syntax, then MX, then SMTP probe.
//!
//! [`Verifier::verify`] never fails; every sub-check failure ends up as a
//! field value of the [`VerificationResult`].

mod batch;
mod types;

pub use types::{OverallStatus, VerificationResult};

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mx::{
    LookupMx, MxError, MxResolver, MxStatus, NotFoundReason, ResolverOptions, resolve_with,
};
use crate::smtp_verify::{MailboxProber, ProbeOptions, SmtpProber};
use crate::validator::EmailAddress;

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierOptions {
    pub resolver: ResolverOptions,
    pub probe: ProbeOptions,
}

pub struct Verifier<R, P> {
    resolver: R,
    prober: P,
}

impl Verifier<MxResolver, SmtpProber> {
    /// System DNS resolver and real SMTP probing.
    pub fn system(options: &VerifierOptions) -> Result<Self, MxError> {
        let resolver = MxResolver::new(&options.resolver)?;
        Ok(Self::new(resolver, SmtpProber::new(options.probe.clone())))
    }
}

impl<R, P> Verifier<R, P>
where
    R: LookupMx,
    P: MailboxProber,
{
    pub fn new(resolver: R, prober: P) -> Self {
        Self { resolver, prober }
    }

    pub fn verify(&self, address: &str) -> VerificationResult {
        let email = match EmailAddress::parse(address) {
            Ok(email) => email,
            Err(err) => {
                debug!(error = %err, "syntax check failed");
                return VerificationResult::invalid_syntax(address);
            }
        };

        let hosts = match resolve_with(&self.resolver, email.domain()) {
            MxStatus::Records(records) if !records.is_empty() => records
                .into_iter()
                .map(|record| record.exchange)
                .collect::<Vec<_>>(),
            MxStatus::Records(_) => {
                return VerificationResult::without_mx(address, NotFoundReason::NoRecords);
            }
            MxStatus::NotFound(reason) => {
                debug!(domain = email.domain(), %reason, "no usable MX");
                return VerificationResult::without_mx(address, reason);
            }
        };

        let status = self.prober.probe(email.as_str(), &hosts);
        VerificationResult::probed(address, status)
    }
}

/// One-shot verification with default options.
pub fn verify_email(address: &str) -> VerificationResult {
    verify_email_with_options(address, &VerifierOptions::default())
}

pub fn verify_email_with_options(address: &str, options: &VerifierOptions) -> VerificationResult {
    if EmailAddress::parse(address).is_err() {
        return VerificationResult::invalid_syntax(address);
    }
    match Verifier::system(options) {
        Ok(verifier) => verifier.verify(address),
        Err(err) => {
            warn!(error = %err, "MX resolver unavailable");
            VerificationResult::without_mx(address, err.not_found_reason())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::mx::MxRecord;
    use crate::smtp_verify::MailboxStatus;

    /// Thread-safe DNS stub keyed by domain; unknown domains are NXDOMAIN.
    #[derive(Default)]
    pub(crate) struct MapResolver {
        pub records: HashMap<String, Vec<MxRecord>>,
        pub calls: AtomicUsize,
    }

    impl MapResolver {
        pub(crate) fn with(mut self, domain: &str, records: Vec<MxRecord>) -> Self {
            self.records.insert(domain.to_string(), records);
            self
        }
    }

    impl LookupMx for MapResolver {
        fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records
                .get(domain)
                .cloned()
                .ok_or_else(|| MxError::NxDomain {
                    domain: domain.to_string(),
                })
        }
    }

    /// Records every probe and answers per first host, like a decisive MX.
    #[derive(Default)]
    pub(crate) struct ScriptedProber {
        pub answers: HashMap<String, MailboxStatus>,
        pub calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedProber {
        pub(crate) fn answer(mut self, host: &str, status: MailboxStatus) -> Self {
            self.answers.insert(host.to_string(), status);
            self
        }

        pub(crate) fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl MailboxProber for ScriptedProber {
        fn probe(&self, address: &str, mx_hosts: &[String]) -> MailboxStatus {
            self.calls
                .lock()
                .expect("calls lock")
                .push((address.to_string(), mx_hosts.to_vec()));
            mx_hosts
                .iter()
                .find_map(|host| self.answers.get(host).copied())
                .unwrap_or_default()
        }
    }

    fn verifier() -> Verifier<MapResolver, ScriptedProber> {
        let resolver = MapResolver::default()
            .with(
                "good.test",
                vec![
                    MxRecord::new(20, "mx2.good.test."),
                    MxRecord::new(10, "mx1.good.test."),
                ],
            )
            .with("gone.test", vec![MxRecord::new(10, "mx.gone.test.")])
            .with("nullmx.test", vec![MxRecord::new(0, ".")]);
        let prober = ScriptedProber::default()
            .answer("mx1.good.test", MailboxStatus::Exists)
            .answer("mx.gone.test", MailboxStatus::DoesNotExist);
        Verifier::new(resolver, prober)
    }

    #[test]
    fn invalid_syntax_never_touches_dns_or_smtp() {
        let verifier = verifier();
        let result = verifier.verify("user@ex ample.com");
        assert!(!result.syntax_valid());
        assert!(!result.has_mx());
        assert_eq!(result.mailbox_status(), MailboxStatus::Unverifiable);
        assert_eq!(result.overall_status(), OverallStatus::InvalidSyntax);
        assert_eq!(verifier.resolver.calls.load(Ordering::SeqCst), 0);
        assert!(verifier.prober.calls().is_empty());
    }

    #[test]
    fn domain_without_mx_is_risky() {
        let verifier = verifier();
        let result = verifier.verify("user@domain-with-no-mx.test");
        assert!(result.syntax_valid());
        assert!(!result.has_mx());
        assert_eq!(result.mailbox_status(), MailboxStatus::Unverifiable);
        assert_eq!(result.overall_status(), OverallStatus::RiskyOrInvalid);
        assert_eq!(result.mx_not_found(), Some(&NotFoundReason::NxDomain));
        assert!(verifier.prober.calls().is_empty());
    }

    #[test]
    fn null_mx_domain_is_risky_without_probe() {
        let verifier = verifier();
        let result = verifier.verify("user@nullmx.test");
        assert!(!result.has_mx());
        assert_eq!(result.mx_not_found(), Some(&NotFoundReason::NullMx));
        assert!(verifier.prober.calls().is_empty());
    }

    #[test]
    fn existing_mailbox_is_valid() {
        let verifier = verifier();
        let result = verifier.verify("user@good.test");
        assert!(result.has_mx());
        assert_eq!(result.mailbox_status(), MailboxStatus::Exists);
        assert_eq!(result.overall_status(), OverallStatus::Valid);
        assert_eq!(result.mx_not_found(), None);

        let calls = verifier.prober.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "user@good.test");
        assert_eq!(calls[0].1, vec!["mx1.good.test", "mx2.good.test"]);
    }

    #[test]
    fn rejected_mailbox_is_risky() {
        let result = verifier().verify("user@gone.test");
        assert!(result.has_mx());
        assert_eq!(result.mailbox_status(), MailboxStatus::DoesNotExist);
        assert_eq!(result.overall_status(), OverallStatus::RiskyOrInvalid);
    }

    #[test]
    fn address_is_reported_verbatim() {
        let result = verifier().verify("User.Name+tag@good.test");
        assert_eq!(result.address(), "User.Name+tag@good.test");
    }
}
