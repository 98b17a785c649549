/// Jeu de caractères admis dans la partie locale: atext ASCII + '.'.
///
/// Volontairement pragmatique: pas de quoted-string, et les points ne sont
/// pas contraints (initial, terminal ou doublés sont acceptés).
pub(crate) fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '.' | '!'
                | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '-'
        )
}

/// Push des raisons invalidantes pour la partie locale dans `reasons`.
pub(crate) fn check_local(local: &str, reasons: &mut Vec<String>) {
    if local.is_empty() {
        reasons.push("local part is empty".to_string());
        return;
    }
    let invalid: String = local.chars().filter(|c| !is_local_char(*c)).collect();
    if !invalid.is_empty() {
        reasons.push(format!("local part has invalid chars {invalid:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_special_char() {
        let mut reasons = vec![];
        check_local("a.b!#$%&'*+/=?^_`{|}~-z", &mut reasons);
        assert!(reasons.is_empty(), "{:?}", reasons);
    }

    #[test]
    fn dots_are_not_constrained() {
        let mut reasons = vec![];
        check_local(".a..b.", &mut reasons);
        assert!(reasons.is_empty(), "{:?}", reasons);
    }

    #[test]
    fn rejects_space_and_quotes() {
        let mut reasons = vec![];
        check_local("\"a b\"", &mut reasons);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("invalid chars"));
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(!is_local_char('é'));
        assert!(!is_local_char('@'));
    }
}
