use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use label_detect::LabelEngine;

use crate::cli::context::CliContext;
use crate::cli::fixture::{load_page, locate};
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct LabelArgs {
    /// JSON page fixture
    #[arg(short, long, value_name = "FILE")]
    pub fixture: PathBuf,

    /// CSS selector or XPath of the element to label
    pub target: String,
}

pub async fn cmd_label(args: LabelArgs, ctx: &CliContext) -> Result<()> {
    let page = load_page(&args.fixture).await?;
    let node = locate(&page, &args.target, &ctx.config().builder)?;
    let detected = LabelEngine::new(ctx.config().label.clone()).detect_with_source(&page, node);
    emit(ctx.output(), &detected, |detected| {
        println!("{} ({})", detected.label, detected.source.name());
    })
}
