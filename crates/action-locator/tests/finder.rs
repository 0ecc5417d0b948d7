use std::sync::Arc;
use std::time::Duration;

use action_locator::{
    ElementFinder, ElementResolver, FinderPolicy, LocatorError, LocatorStrategy, ResolveRequest,
};
use page_host::{DocumentAccessor, MemoryPage, NodeInspector, NodeSpec};
use soulreplay_core_types::{BoundaryHop, BoundaryKind, LocatorBundle};
use tokio_util::sync::CancellationToken;

fn placeholder_bundle() -> LocatorBundle {
    let mut bundle = LocatorBundle::new("input", "/html[1]/body[1]/form[1]/input[1]");
    bundle.id = Some("email".into());
    bundle.placeholder = Some("Enter email".into());
    bundle
}

#[tokio::test(start_paused = true)]
async fn node_appearing_late_is_found_by_polling() {
    let page = Arc::new(MemoryPage::with_body(
        "https://example.test/",
        [NodeSpec::new("form")],
    ));
    let form = page.body().and_then(|b| page.children(b).first().copied()).unwrap();

    let writer = page.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        writer
            .append_child(form, NodeSpec::new("input").attr("placeholder", "Enter email"))
            .unwrap();
    });

    let bundle = placeholder_bundle();
    let outcome = ElementFinder::default()
        .resolve(page.as_ref(), ResolveRequest::new(&bundle))
        .await
        .unwrap();
    assert_eq!(outcome.strategy, LocatorStrategy::Placeholder);
    assert!(outcome.attempts >= 2);
    assert!(outcome.elapsed >= Duration::from_millis(400));
    assert!(outcome.elapsed < Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn times_out_with_not_found() {
    let page = MemoryPage::with_body("https://example.test/", [NodeSpec::new("div")]);
    let bundle = placeholder_bundle();
    let wall = std::time::Instant::now();
    let err = ElementFinder::default()
        .resolve(
            &page,
            ResolveRequest::new(&bundle).with_timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
    match err {
        LocatorError::NotFound {
            attempts,
            elapsed_ms,
        } => {
            assert_eq!(attempts, 2);
            assert!(elapsed_ms >= 100);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(wall.elapsed() <= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling() {
    let page = MemoryPage::with_body("https://example.test/", [NodeSpec::new("div")]);
    let bundle = placeholder_bundle();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let err = ElementFinder::default()
        .resolve(
            &page,
            ResolveRequest::new(&bundle)
                .with_timeout(Duration::from_secs(30))
                .with_cancel(cancel),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LocatorError::Cancelled { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn hidden_match_falls_through_to_next_strategy() {
    let page = MemoryPage::with_body(
        "https://example.test/",
        [
            NodeSpec::new("input").id("email").display_none(),
            NodeSpec::new("input").attr("placeholder", "Enter email"),
        ],
    );
    let bundle = placeholder_bundle();
    let outcome = ElementFinder::default()
        .resolve(&page, ResolveRequest::new(&bundle))
        .await
        .unwrap();
    assert_eq!(outcome.strategy, LocatorStrategy::Placeholder);
}

#[tokio::test(start_paused = true)]
async fn re_descends_into_iframe_and_skips_missing_shadow_hop() {
    let page = MemoryPage::with_body(
        "https://example.test/",
        [
            NodeSpec::new("nav"),
            NodeSpec::new("iframe").id("checkout").frame([NodeSpec::new("button")
                .attr("name", "pay")
                .text("Pay now")]),
        ],
    );
    let mut bundle = LocatorBundle::new("button", "/html[1]/body[1]/div[1]/button[1]");
    bundle.name = Some("pay".into());
    bundle.boundary_chain = vec![
        BoundaryHop {
            kind: BoundaryKind::Iframe,
            host_xpath: "/html[1]/body[1]/iframe[1]".into(),
            host_selector: Some("iframe#checkout".into()),
        },
        BoundaryHop {
            kind: BoundaryKind::ShadowHost,
            host_xpath: "/html[1]/body[1]/pay-widget[1]".into(),
            host_selector: None,
        },
    ];

    let outcome = ElementFinder::default()
        .resolve(&page, ResolveRequest::new(&bundle))
        .await
        .unwrap();
    assert_eq!(outcome.strategy, LocatorStrategy::Name);
    assert_eq!(outcome.skipped_hops, 1);
    assert_ne!(outcome.scope, page.document());
    assert_eq!(page.scope_of(outcome.node), Some(outcome.scope));
}

#[tokio::test(start_paused = true)]
async fn label_hint_feeds_fuzzy_text() {
    let page = MemoryPage::with_body(
        "https://example.test/",
        [NodeSpec::new("button").id("next").text("Continue")],
    );
    let bundle = LocatorBundle::new("button", "/html[1]/body[1]/button[4]");
    let finder = ElementFinder::new(FinderPolicy {
        timeout_ms: 0,
        ..FinderPolicy::default()
    });
    let outcome = finder
        .resolve(&page, ResolveRequest::new(&bundle).with_label_hint("Continue"))
        .await
        .unwrap();
    assert_eq!(outcome.strategy, LocatorStrategy::FuzzyText);
    assert_eq!(Some(outcome.node), page.find_by_id("next"));
}
