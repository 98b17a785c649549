use tracing::{debug, warn};
use trust_dns_resolver::{
    Resolver,
    config::{ResolverConfig, ResolverOpts},
    system_conf::read_system_conf,
};

use super::{MxError, MxRecord, MxStatus, NotFoundReason, ResolverOptions};

/// Source of raw MX answers. Implemented by [`MxResolver`]; tests plug in stubs.
pub trait LookupMx {
    /// Returns the records in DNS answer order, exchanges untouched.
    fn lookup_mx(&self, ascii_domain: &str) -> Result<Vec<MxRecord>, MxError>;
}

/// Synchronous system resolver with explicit timeouts.
pub struct MxResolver {
    inner: Resolver,
}

impl MxResolver {
    pub fn new(options: &ResolverOptions) -> Result<Self, MxError> {
        let (config, opts) = match read_system_conf() {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "system resolver configuration unreadable, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        let opts = tuned_opts(opts, options, config.name_servers().len());
        let inner = Resolver::new(config, opts).map_err(MxError::resolver_init)?;
        Ok(Self { inner })
    }
}

impl LookupMx for MxResolver {
    fn lookup_mx(&self, ascii_domain: &str) -> Result<Vec<MxRecord>, MxError> {
        // nom absolu: pas d'expansion par les suffixes `search` de resolv.conf
        let lookup = self
            .inner
            .mx_lookup(absolute_name(ascii_domain).as_str())
            .map_err(|err| MxError::lookup(ascii_domain, err))?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
            .collect())
    }
}

/// Resolve the mail exchangers of `domain` with the default [`ResolverOptions`].
///
/// Every failure (no records, null MX, NXDOMAIN, timeout, resolver errors)
/// collapses into [`MxStatus::NotFound`].
pub fn resolve_mx(domain: &str) -> MxStatus {
    resolve_mx_with_options(domain, &ResolverOptions::default())
}

pub fn resolve_mx_with_options(domain: &str, options: &ResolverOptions) -> MxStatus {
    match MxResolver::new(options) {
        Ok(resolver) => resolve_with(&resolver, domain),
        Err(err) => {
            warn!(domain, error = %err, "MX resolver unavailable");
            MxStatus::NotFound(err.not_found_reason())
        }
    }
}

pub fn resolve_with<R>(resolver: &R, domain: &str) -> MxStatus
where
    R: LookupMx + ?Sized,
{
    if domain.trim().is_empty() {
        return MxStatus::NotFound(NotFoundReason::EmptyDomain);
    }
    let ascii = normalize_domain(domain);

    let records = match resolver.lookup_mx(&ascii) {
        Ok(records) => records,
        Err(err) => {
            let reason = err.not_found_reason();
            match reason {
                NotFoundReason::Other(_) => warn!(domain = %ascii, error = %err, "MX lookup failed"),
                _ => debug!(domain = %ascii, error = %err, "no MX for domain"),
            }
            return MxStatus::NotFound(reason);
        }
    };

    if records.is_empty() {
        debug!(domain = %ascii, "empty MX answer");
        return MxStatus::NotFound(NotFoundReason::NoRecords);
    }

    let mut usable: Vec<MxRecord> = records
        .into_iter()
        .map(|record| MxRecord::new(record.preference, normalize_exchange(&record.exchange)))
        .filter(|record| !record.exchange.is_empty())
        .collect();

    if usable.is_empty() {
        debug!(domain = %ascii, "domain publishes null MX");
        return MxStatus::NotFound(NotFoundReason::NullMx);
    }

    // tri stable: à préférence égale, l'ordre de la réponse DNS est conservé
    usable.sort_by_key(|record| record.preference);
    debug!(domain = %ascii, count = usable.len(), "MX records resolved");
    MxStatus::Records(usable)
}

/// IDNA/Punycode form of `domain`; the input is kept as-is when conversion fails.
pub(crate) fn normalize_domain(domain: &str) -> String {
    match idna::domain_to_ascii(domain) {
        Ok(ascii) if !ascii.is_empty() => ascii,
        Ok(_) => domain.to_string(),
        Err(err) => {
            debug!(domain, error = ?err, "IDNA conversion failed, querying raw domain");
            domain.to_string()
        }
    }
}

/// Timeouts from `options`. Every name server is queried at once so that one
/// lookup stays within about `attempts * timeout`, whatever the number of
/// servers in the system configuration.
pub(crate) fn tuned_opts(
    mut opts: ResolverOpts,
    options: &ResolverOptions,
    name_servers: usize,
) -> ResolverOpts {
    opts.timeout = options.timeout;
    opts.attempts = options.attempts();
    opts.num_concurrent_reqs = name_servers.max(1);
    opts
}

/// Fully qualified form of `ascii_domain` (trailing root dot).
pub(crate) fn absolute_name(ascii_domain: &str) -> String {
    format!("{}.", ascii_domain.trim_end_matches('.'))
}

/// Strips the root label dot(s); the null MX exchange `.` becomes empty.
pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_string()
}
