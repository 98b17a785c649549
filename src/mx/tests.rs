use std::cell::Cell;

use super::{
    LookupMx, MxError, MxRecord, MxStatus, NotFoundReason, ResolverOptions, resolve_with, resolver,
};
use std::time::Duration;

use trust_dns_resolver::config::ResolverOpts;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::rr::Name;

type LookupResult = Result<Vec<MxRecord>, MxError>;
type LookupFn = dyn Fn(&str) -> LookupResult;

pub(crate) struct StubResolver {
    pub on_lookup: Box<LookupFn>,
    pub calls: Cell<usize>,
}

impl StubResolver {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> LookupResult + 'static,
    {
        Self {
            on_lookup: Box::new(f),
            calls: Cell::new(0),
        }
    }

    pub(crate) fn records(records: Vec<MxRecord>) -> Self {
        Self::new(move |_| Ok(records.clone()))
    }
}

impl LookupMx for StubResolver {
    fn lookup_mx(&self, domain: &str) -> LookupResult {
        self.calls.set(self.calls.get() + 1);
        (self.on_lookup)(domain)
    }
}

fn hosts(status: &MxStatus) -> Vec<&str> {
    status
        .records()
        .iter()
        .map(|r| r.exchange.as_str())
        .collect()
}

#[test]
fn sorts_by_preference_and_keeps_answer_order_on_ties() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "example.com");
        Ok(vec![
            MxRecord::new(20, "b20.example.com."),
            MxRecord::new(10, "c10.example.com."),
            MxRecord::new(20, "a20.example.com."),
            MxRecord::new(10, "a10.example.com."),
            MxRecord::new(5, "z5.example.com."),
        ])
    });

    let status = resolve_with(&stub, "example.com");
    assert_eq!(
        hosts(&status),
        vec![
            "z5.example.com",
            "c10.example.com",
            "a10.example.com",
            "b20.example.com",
            "a20.example.com",
        ]
    );
    assert!(status.is_found());
}

#[test]
fn duplicates_are_kept() {
    let stub = StubResolver::records(vec![
        MxRecord::new(10, "mx1.example.com"),
        MxRecord::new(10, "mx1.example.com"),
    ]);
    let status = resolve_with(&stub, "example.com");
    assert_eq!(status.hosts().len(), 2);
}

#[test]
fn null_mx_only_is_not_found() {
    let stub = StubResolver::records(vec![MxRecord::new(0, ".")]);
    let status = resolve_with(&stub, "example.com");
    assert_eq!(status, MxStatus::NotFound(NotFoundReason::NullMx));
    assert!(!status.is_found());
    assert!(status.hosts().is_empty());
}

#[test]
fn null_mx_is_discarded_next_to_real_exchanges() {
    let stub = StubResolver::records(vec![
        MxRecord::new(0, "."),
        MxRecord::new(10, ""),
        MxRecord::new(20, "mx.example.com."),
    ]);
    let status = resolve_with(&stub, "example.com");
    assert_eq!(status.hosts(), vec!["mx.example.com".to_string()]);
}

#[test]
fn empty_answer_is_not_found() {
    let stub = StubResolver::records(Vec::new());
    let status = resolve_with(&stub, "example.com");
    assert_eq!(status, MxStatus::NotFound(NotFoundReason::NoRecords));
}

#[test]
fn lookup_errors_collapse_to_not_found() {
    let cases = vec![
        (
            MxError::NxDomain {
                domain: "example.com".into(),
            },
            NotFoundReason::NxDomain,
        ),
        (
            MxError::NoAnswer {
                domain: "example.com".into(),
            },
            NotFoundReason::NoAnswer,
        ),
        (
            MxError::Timeout {
                domain: "example.com".into(),
            },
            NotFoundReason::Timeout,
        ),
    ];
    for (error, expected) in cases {
        let error = std::cell::RefCell::new(Some(error));
        let stub = StubResolver::new(move |_| Err(error.borrow_mut().take().expect("one call")));
        let status = resolve_with(&stub, "example.com");
        assert_eq!(status, MxStatus::NotFound(expected));
    }
}

#[test]
fn generic_resolver_error_is_other() {
    let stub = StubResolver::new(|domain| {
        Err(MxError::lookup(domain, ResolveError::from("connection reset")))
    });
    match resolve_with(&stub, "example.com") {
        MxStatus::NotFound(NotFoundReason::Other(message)) => {
            assert!(message.contains("connection reset"), "{message}");
        }
        other => panic!("expected other failure, got {other:?}"),
    }
}

#[test]
fn resolve_error_timeout_is_classified() {
    let err = MxError::lookup("example.com", ResolveError::from(ResolveErrorKind::Timeout));
    assert!(matches!(err, MxError::Timeout { .. }));
    assert_eq!(err.not_found_reason(), NotFoundReason::Timeout);
}

#[test]
fn empty_domain_skips_lookup() {
    let stub = StubResolver::records(vec![MxRecord::new(10, "mx.example.com")]);
    let status = resolve_with(&stub, "  ");
    assert_eq!(status, MxStatus::NotFound(NotFoundReason::EmptyDomain));
    assert_eq!(stub.calls.get(), 0);
}

#[test]
fn idn_domain_is_queried_in_punycode() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "xn--bcher-kva.example");
        Ok(vec![MxRecord::new(10, "mx.xn--bcher-kva.example.")])
    });
    let status = resolve_with(&stub, "bücher.example");
    assert_eq!(status.hosts(), vec!["mx.xn--bcher-kva.example".to_string()]);
}

#[test]
fn normalize_exchange_trims_root_dot() {
    assert_eq!(resolver::normalize_exchange("Mail.EXAMPLE.com."), "Mail.EXAMPLE.com");
    assert_eq!(resolver::normalize_exchange("."), "");
}

#[test]
fn normalize_domain_lowercases_ascii() {
    assert_eq!(resolver::normalize_domain("example.com"), "example.com");
    assert_eq!(resolver::normalize_domain("EXAMPLE.Com"), "example.com");
}

#[test]
fn lookups_use_the_absolute_name() {
    assert_eq!(resolver::absolute_name("foo.test"), "foo.test.");
    assert_eq!(resolver::absolute_name("foo.test."), "foo.test.");
    assert_eq!(resolver::absolute_name("xn--bcher-kva.example"), "xn--bcher-kva.example.");

    let name = Name::from_ascii(resolver::absolute_name("foo.test")).expect("name");
    assert!(name.is_fqdn());
    let relative = Name::from_ascii("foo.test").expect("name");
    assert!(!relative.is_fqdn());
}

#[test]
fn resolver_opts_follow_options() {
    let options = ResolverOptions {
        timeout: Duration::from_secs(2),
        lifetime: Duration::from_secs(6),
    };
    let opts = resolver::tuned_opts(ResolverOpts::default(), &options, 6);
    assert_eq!(opts.timeout, Duration::from_secs(2));
    assert_eq!(opts.attempts, 3);
    assert_eq!(opts.num_concurrent_reqs, 6);

    let opts = resolver::tuned_opts(ResolverOpts::default(), &options, 0);
    assert_eq!(opts.num_concurrent_reqs, 1);
}
