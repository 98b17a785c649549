use std::sync::LazyLock;

use regex::Regex;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("static label pattern")
});

/// Valide le domaine tel quel (ASCII uniquement, pas de conversion IDNA ici).
/// Push des raisons invalidantes dans `reasons`.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    if domain.is_empty() {
        reasons.push("domain is empty".to_string());
        return;
    }

    // au moins un point (suffixe de type TLD)
    if !domain.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }

    for label in domain.split('.') {
        if !LABEL.is_match(label) {
            reasons.push(label_problem(label));
        }
    }
}

fn label_problem(label: &str) -> String {
    if label.is_empty() {
        "empty domain label".to_string()
    } else if label.len() > 63 {
        format!("domain label '{}' length {} > 63", label, label.len())
    } else if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        format!("domain label '{}' has invalid chars", label)
    } else {
        format!("domain label '{}' cannot start/end with '-'", label)
    }
}
