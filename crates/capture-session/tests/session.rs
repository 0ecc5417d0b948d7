use std::sync::Arc;
use std::time::Duration;

use bundle_builder::BundleBuilder;
use capture_session::{CaptureError, CapturePolicy, CaptureSession, Disposition, RawInteraction};
use page_host::{MemoryPage, NodeSpec, TokioClock};
use soulreplay_core_types::{BoundaryKind, EventKind, Step};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

fn login_page() -> Arc<MemoryPage> {
    Arc::new(MemoryPage::with_body(
        "https://example.test/login",
        [NodeSpec::new("form").id("login").children([
            NodeSpec::new("input")
                .id("email-field")
                .attr("placeholder", "Enter email"),
            NodeSpec::new("button").id("submit").text("Sign in"),
        ])],
    ))
}

fn start(page: &Arc<MemoryPage>) -> (CaptureSession<MemoryPage>, UnboundedReceiver<Step>) {
    CaptureSession::start(
        page.clone(),
        Arc::new(BundleBuilder::default()),
        CapturePolicy::default(),
        Arc::new(TokioClock),
    )
}

#[tokio::test(start_paused = true)]
async fn keystroke_burst_becomes_one_input_step() {
    let page = login_page();
    let email = page.find_by_id("email-field").unwrap();
    let (session, mut steps) = start(&page);

    for value in ["t", "test@", "test@test.com"] {
        let disposition = session
            .record(RawInteraction::Keystroke {
                node: email,
                value: value.into(),
            })
            .unwrap();
        assert_eq!(disposition, Disposition::Debounced);
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    // Last keystroke happened 40ms ago.
    let last = Instant::now() - Duration::from_millis(40);

    let step = steps.recv().await.unwrap();
    assert_eq!(Instant::now() - last, Duration::from_millis(500));
    assert_eq!(step.event, EventKind::Input);
    assert_eq!(step.value.as_deref(), Some("test@test.com"));
    assert_eq!(step.label, "Enter Email");
    assert_eq!(step.bundle.placeholder.as_deref(), Some("Enter email"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(steps.try_recv().is_err());
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn click_burst_is_throttled_to_one_step() {
    let page = login_page();
    let submit = page.find_by_id("submit").unwrap();
    let (session, mut steps) = start(&page);

    let mut dispositions = Vec::new();
    for _ in 0..10 {
        dispositions.push(session.record(RawInteraction::Click { node: submit }).unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        dispositions
            .iter()
            .filter(|d| **d == Disposition::Emitted)
            .count(),
        1
    );
    let step = steps.try_recv().unwrap();
    assert_eq!(step.event, EventKind::Click);
    assert_eq!(step.label, "Sign In");
    assert!(step.coordinates.is_some());
    assert!(steps.try_recv().is_err());
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn discrete_event_flushes_pending_input_first() {
    let page = login_page();
    let email = page.find_by_id("email-field").unwrap();
    let submit = page.find_by_id("submit").unwrap();
    let (session, mut steps) = start(&page);

    session
        .record(RawInteraction::Keystroke {
            node: email,
            value: "me@example.test".into(),
        })
        .unwrap();
    session.record(RawInteraction::Click { node: submit }).unwrap();

    let first = steps.try_recv().unwrap();
    let second = steps.try_recv().unwrap();
    assert_eq!(first.event, EventKind::Input);
    assert_eq!(second.event, EventKind::Click);
    assert_ne!(first.id, second.id);
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_flushes_synchronously() {
    let page = login_page();
    let email = page.find_by_id("email-field").unwrap();
    let (session, mut steps) = start(&page);

    session
        .record(RawInteraction::Keystroke {
            node: email,
            value: "trailing".into(),
        })
        .unwrap();
    assert_eq!(session.stop(), 1);
    let step = steps.try_recv().unwrap();
    assert_eq!(step.value.as_deref(), Some("trailing"));

    assert_eq!(
        session.record(RawInteraction::Click { node: email }),
        Err(CaptureError::Stopped)
    );
    assert_eq!(session.stop(), 0);
}

#[tokio::test(start_paused = true)]
async fn navigation_and_detached_nodes() {
    let page = login_page();
    let submit = page.find_by_id("submit").unwrap();
    let (session, mut steps) = start(&page);

    session
        .record(RawInteraction::Navigation {
            url: "https://example.test/home".into(),
        })
        .unwrap();
    let step = steps.try_recv().unwrap();
    assert_eq!(step.event, EventKind::Navigate);
    assert_eq!(step.value.as_deref(), Some("https://example.test/home"));

    page.remove(submit).unwrap();
    assert_eq!(
        session.record(RawInteraction::Click { node: submit }),
        Err(CaptureError::Disconnected(submit))
    );
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn late_iframe_is_indexed_and_used_for_chains() {
    let page = login_page();
    let (session, mut steps) = start(&page);
    assert!(session.index().is_empty());

    let body = page.body().unwrap();
    page.append_child(
        body,
        NodeSpec::new("iframe")
            .id("chat")
            .frame([NodeSpec::new("button").id("send").text("Send")]),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.index().len(), 1);

    let send = page.find_by_id("send").unwrap();
    session.record(RawInteraction::Click { node: send }).unwrap();
    let step = steps.try_recv().unwrap();
    assert_eq!(step.bundle.boundary_chain.len(), 1);
    assert_eq!(step.bundle.boundary_chain[0].kind, BoundaryKind::Iframe);
    assert_eq!(
        step.bundle.boundary_chain[0].host_selector.as_deref(),
        Some("iframe#chat")
    );
    session.stop();
}
