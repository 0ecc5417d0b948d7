use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use bundle_builder::BundleBuilder;
use capture_session::{CaptureSession, RawInteraction};
use clap::{Args, ValueEnum};
use page_host::TokioClock;
use soulreplay_core_types::Step;
use tracing::{debug, info};

use crate::cli::context::CliContext;
use crate::cli::fixture::{load_page, locate};
use crate::cli::output::emit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CaptureEvent {
    Click,
    Input,
    Enter,
    Navigate,
}

#[derive(Args, Clone, Debug)]
pub struct CaptureArgs {
    /// JSON page fixture to record against
    #[arg(short, long, value_name = "FILE")]
    pub fixture: PathBuf,

    /// CSS selector or XPath of the element interacted with
    #[arg(short, long)]
    pub target: Option<String>,

    /// Interaction to record
    #[arg(short, long, value_enum, default_value = "click")]
    pub event: CaptureEvent,

    /// Typed value for input, destination URL for navigate
    #[arg(long)]
    pub value: Option<String>,
}

pub async fn cmd_capture(args: CaptureArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let page = Arc::new(load_page(&args.fixture).await?);

    let interaction = match args.event {
        CaptureEvent::Navigate => {
            let Some(url) = args.value.clone() else {
                bail!("navigate needs --value <URL>");
            };
            RawInteraction::Navigation { url }
        }
        event => {
            let Some(target) = args.target.as_deref() else {
                bail!("{event:?} needs --target");
            };
            let node = locate(page.as_ref(), target, &config.builder)?;
            match event {
                CaptureEvent::Input => RawInteraction::Keystroke {
                    node,
                    value: args.value.clone().unwrap_or_default(),
                },
                CaptureEvent::Enter => RawInteraction::EnterKey { node },
                _ => RawInteraction::Click { node },
            }
        }
    };

    let builder = Arc::new(BundleBuilder::new(
        config.builder.clone(),
        config.label.clone(),
    ));
    let (session, mut receiver) = CaptureSession::start(
        page,
        builder,
        config.capture.clone(),
        Arc::new(TokioClock::new()),
    );
    let disposition = session.record(interaction)?;
    debug!(?disposition, "interaction recorded");
    session.stop();

    let mut steps: Vec<Step> = Vec::new();
    while let Ok(step) = receiver.try_recv() {
        steps.push(step);
    }
    info!(steps = steps.len(), "capture finished");

    emit(ctx.output(), &steps, |steps| {
        for step in steps {
            println!(
                "{}\t{}\t{}\t{}",
                step.id, step.event, step.label, step.bundle.xpath
            );
        }
    })
}
