//! Message templating with `{fieldName}` placeholders.

use std::collections::BTreeMap;

use regex::Regex;

/// Sentinel substituted for placeholders the payload could not fill.
pub const UNRESOLVED: &str = "N/A";

/// Substitutes every known field into the template, then replaces any
/// placeholder left unresolved with [`UNRESOLVED`] so raw `{tokens}`
/// never leak into delivered messages.
pub fn render(template: &str, fields: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in fields {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }

    match Regex::new(r"\{[A-Za-z0-9_]+\}") {
        Ok(placeholder) => placeholder.replace_all(&rendered, UNRESOLVED).into_owned(),
        Err(_) => rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_all_known_fields() {
        let out = render(
            "{deviceName} connected from {ipAddress}",
            &fields(&[("deviceName", "PC-1"), ("ipAddress", "10.0.0.5")]),
        );
        assert_eq!(out, "PC-1 connected from 10.0.0.5");
    }

    #[test]
    fn unresolved_placeholders_become_sentinel() {
        let out = render(
            "{deviceName} in group {groupName}",
            &fields(&[("deviceName", "PC-1")]),
        );
        assert_eq!(out, "PC-1 in group N/A");
    }

    #[test]
    fn braces_without_an_identifier_survive() {
        let out = render("literal {} stays, {unknown} does not", &fields(&[]));
        assert_eq!(out, "literal {} stays, N/A does not");
    }

    #[test]
    fn repeated_placeholders_all_substitute() {
        let out = render(
            "{userName} / {userName}",
            &fields(&[("userName", "alice")]),
        );
        assert_eq!(out, "alice / alice");
    }
}
