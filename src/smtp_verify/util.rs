use tracing::debug;

/// Hostname of this machine, `localhost` when it cannot be read.
pub(crate) fn local_hostname() -> String {
    match hostname::get() {
        Ok(name) => name
            .into_string()
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| is_command_safe(name))
            .unwrap_or_else(|| "localhost".to_string()),
        Err(err) => {
            debug!(error = %err, "hostname unavailable, using localhost");
            "localhost".to_string()
        }
    }
}

/// Non-empty, printable ASCII without spaces: safe as a single SMTP argument.
pub(crate) fn is_command_safe(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_graphic())
}

/// `no-reply@` followed by the HELO name without its first label.
pub(crate) fn default_sender(helo: &str) -> String {
    let suffix = helo
        .split_once('.')
        .map(|(_, rest)| rest.trim_matches('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or("localhost");
    format!("no-reply@{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_uses_domain_suffix() {
        assert_eq!(default_sender("probe.mail.example.com"), "no-reply@mail.example.com");
        assert_eq!(default_sender("host.example"), "no-reply@example");
    }

    #[test]
    fn sender_falls_back_to_localhost() {
        assert_eq!(default_sender("workstation"), "no-reply@localhost");
        assert_eq!(default_sender("localhost"), "no-reply@localhost");
        assert_eq!(default_sender("trailing."), "no-reply@localhost");
        assert_eq!(default_sender(""), "no-reply@localhost");
    }

    #[test]
    fn command_safety() {
        assert!(is_command_safe("probe.example.net"));
        assert!(is_command_safe("[192.0.2.1]"));
        assert!(!is_command_safe(""));
        assert!(!is_command_safe("host name"));
        assert!(!is_command_safe("host\r\nDATA"));
        assert!(!is_command_safe("hôte.example"));
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!local_hostname().is_empty());
    }
}
