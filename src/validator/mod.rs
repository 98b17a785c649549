mod domain;
mod local;
mod types;

pub use types::{EmailAddress, SyntaxError, SyntaxReport};

use domain::check_domain;
use local::check_local;

/// Contrôle de forme `local@domaine.tld`, sans I/O.
///
/// Motif pragmatique, pas une grammaire RFC 5322 complète.
pub fn validate_syntax(address: &str) -> bool {
    check_syntax(address).ok
}

/// Comme [`validate_syntax`], avec la liste des raisons du rejet.
pub fn check_syntax(address: &str) -> SyntaxReport {
    let mut reasons = Vec::new();

    let Some((local, domain)) = address.rsplit_once('@') else {
        reasons.push("must contain '@'".to_string());
        return SyntaxReport { ok: false, reasons };
    };

    check_local(local, &mut reasons);
    check_domain(domain, &mut reasons);

    SyntaxReport {
        ok: reasons.is_empty(),
        reasons,
    }
}

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, SyntaxError> {
        let report = check_syntax(raw);
        if !report.ok {
            return Err(SyntaxError::Invalid {
                address: raw.to_string(),
                reasons: report.reasons,
            });
        }
        // un rapport ok garantit la présence d'un '@'
        Self::from_validated(raw).ok_or_else(|| SyntaxError::Invalid {
            address: raw.to_string(),
            reasons: vec!["must contain '@'".to_string()],
        })
    }
}
