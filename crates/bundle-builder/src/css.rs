use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,63}$").expect("css ident regex"));

/// Runs of digits typical of framework-generated ids (`ember1234`, `mui-53871`).
static GENERATED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3,}").expect("generated id regex"));

/// State classes that flip at runtime and make poor anchors.
const VOLATILE_CLASSES: &[&str] = &[
    "active", "hover", "focus", "focused", "selected", "disabled", "open", "hidden", "visible",
];

pub fn is_plausible_ident(value: &str) -> bool {
    IDENT_RE.is_match(value) && !GENERATED_RE.is_match(value)
}

fn is_plausible_class(class: &str) -> bool {
    is_plausible_ident(class)
        && !VOLATILE_CLASSES
            .iter()
            .any(|v| class.eq_ignore_ascii_case(v) || class.starts_with("is-"))
}

/// Best-effort selector: `tag#id`, else `tag.c1.c2.c3`, else nothing.
pub fn css_selector<'a>(
    tag: &str,
    id: Option<&str>,
    classes: impl IntoIterator<Item = &'a str>,
    max_classes: usize,
) -> Option<String> {
    if !IDENT_RE.is_match(tag) {
        return None;
    }
    if let Some(id) = id.filter(|id| is_plausible_ident(id)) {
        return Some(format!("{}#{}", tag, id));
    }
    let picked: Vec<&str> = classes
        .into_iter()
        .filter(|c| is_plausible_class(c))
        .take(max_classes)
        .collect();
    if picked.is_empty() {
        return None;
    }
    Some(format!("{}.{}", tag, picked.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_id() {
        assert_eq!(
            css_selector("input", Some("email-field"), ["form-control"], 3).as_deref(),
            Some("input#email-field")
        );
    }

    #[test]
    fn generated_ids_fall_back_to_classes() {
        assert_eq!(
            css_selector("button", Some("ember1234"), ["btn", "active", "primary"], 3).as_deref(),
            Some("button.btn.primary")
        );
        assert_eq!(
            css_selector("div", Some(":r0:"), ["a", "b", "c", "d"], 3).as_deref(),
            Some("div.a.b.c")
        );
    }

    #[test]
    fn nothing_plausible() {
        assert_eq!(css_selector("span", None, ["css-1x9283a", "is-open"], 3), None);
        assert_eq!(css_selector("span", None, Vec::<&str>::new(), 3), None);
    }
}
