use std::collections::BTreeMap;

/// Attributes copied into a bundle in addition to every `data-*` attribute.
pub const RELEVANT_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "type",
    "value",
    "placeholder",
    "aria-label",
    "aria-labelledby",
    "aria-describedby",
    "role",
    "href",
    "src",
    "alt",
    "title",
    "for",
    "testid",
    "test-id",
];

pub fn is_relevant(name: &str) -> bool {
    name.starts_with("data-") || RELEVANT_ATTRIBUTES.contains(&name)
}

/// Filter a live attribute map down to the relevant set.
///
/// A password control never has its `value` copied.
pub fn relevant_attributes(
    attrs: &BTreeMap<String, String>,
    is_password: bool,
) -> BTreeMap<String, String> {
    attrs
        .iter()
        .filter(|(name, _)| is_relevant(name))
        .filter(|(name, _)| !(is_password && name.as_str() == "value"))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Collapse whitespace and cap to `max_chars`; `None` when nothing is left.
pub fn text_snippet(text: &str, max_chars: usize) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(max_chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn keeps_allow_list_and_data_attributes() {
        let kept = relevant_attributes(
            &attrs(&[
                ("id", "q"),
                ("style", "color: red"),
                ("data-testid", "search"),
                ("data-row", "4"),
                ("onclick", "go()"),
                ("class", "a b"),
            ]),
            false,
        );
        let names: Vec<_> = kept.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["data-row", "data-testid", "id"]);
    }

    #[test]
    fn password_value_is_dropped() {
        let kept = relevant_attributes(
            &attrs(&[("type", "password"), ("value", "hunter2")]),
            true,
        );
        assert!(!kept.contains_key("value"));
        assert_eq!(kept["type"], "password");
    }

    #[test]
    fn snippet_is_capped() {
        assert_eq!(text_snippet("  a   b \n c ", 100).as_deref(), Some("a b c"));
        assert_eq!(text_snippet(&"x".repeat(150), 100).map(|s| s.len()), Some(100));
        assert_eq!(text_snippet("   ", 100), None);
    }
}
