//! Navigate primitive

use page_host::ReplayHost;
use soulreplay_core_types::Step;
use tracing::debug;
use url::Url;

use crate::{errors::ActionError, types::ExecCtx};

/// Navigation target of a step: its value, else the URL it was captured on.
pub fn navigation_target(step: &Step) -> Result<String, ActionError> {
    let raw = step
        .value
        .as_deref()
        .or(step.bundle.page_url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ActionError::InvalidUrl("step carries no URL".to_string()))?;
    Url::parse(raw).map_err(|err| ActionError::InvalidUrl(format!("{}: {}", raw, err)))?;
    Ok(raw.to_string())
}

/// Ask the host to navigate. No interaction sequence is dispatched.
pub async fn execute_navigate<H>(host: &H, ctx: &ExecCtx, url: &str) -> Result<(), ActionError>
where
    H: ReplayHost + ?Sized,
{
    if ctx.is_cancelled() {
        return Err(ActionError::Cancelled);
    }
    debug!(action_id = %ctx.action_id, %url, "navigating");
    host.navigate(url).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulreplay_core_types::{EventKind, LocatorBundle};

    fn step(value: Option<&str>, page_url: Option<&str>) -> Step {
        let mut bundle = LocatorBundle::new("html", "/html[1]");
        bundle.page_url = page_url.map(str::to_string);
        let mut step = Step::new("n", "Navigate", EventKind::Navigate, bundle);
        step.value = value.map(str::to_string);
        step
    }

    #[test]
    fn value_wins_over_capture_url() {
        let target = navigation_target(&step(
            Some("https://example.test/next"),
            Some("https://example.test/"),
        ))
        .unwrap();
        assert_eq!(target, "https://example.test/next");
        let target = navigation_target(&step(None, Some("https://example.test/"))).unwrap();
        assert_eq!(target, "https://example.test/");
    }

    #[test]
    fn rejects_missing_or_malformed() {
        assert!(matches!(
            navigation_target(&step(None, None)),
            Err(ActionError::InvalidUrl(_))
        ));
        assert!(matches!(
            navigation_target(&step(Some("not a url"), None)),
            Err(ActionError::InvalidUrl(_))
        ));
    }
}
