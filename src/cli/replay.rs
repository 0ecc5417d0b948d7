use std::path::{Path, PathBuf};

use action_primitives::{ReplayActionExecutor, StepResult};
use anyhow::{bail, Context, Result};
use clap::Args;
use soulreplay_core_types::Step;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::fixture::load_page;
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// JSON scenario: an array of captured steps
    pub scenario: PathBuf,

    /// JSON page fixture to replay against
    #[arg(short, long, value_name = "FILE")]
    pub fixture: PathBuf,

    /// Keep going after a failed step
    #[arg(long)]
    pub continue_on_failure: bool,

    /// Fail steps whose post-condition does not hold
    #[arg(long)]
    pub strict: bool,

    /// Per-step budget in milliseconds
    #[arg(long)]
    pub budget_ms: Option<u64>,
}

pub async fn load_scenario(path: &Path) -> Result<Vec<Step>> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse scenario {}", path.display()))
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let page = load_page(&args.fixture).await?;
    let steps = load_scenario(&args.scenario).await?;

    let mut policy = config.executor.clone();
    policy.continue_on_failure |= args.continue_on_failure;
    policy.strict |= args.strict;
    if let Some(budget) = args.budget_ms {
        policy.step_budget_ms = budget;
    }
    let executor = ReplayActionExecutor::new(policy, config.finder.clone());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling replay");
            on_interrupt.cancel();
        }
    });

    info!(steps = steps.len(), scenario = %args.scenario.display(), "replay starting");
    let results = executor.run(&page, &steps, &cancel).await;
    interrupt.abort();

    emit(ctx.output(), &results, |results| print_results(results))?;

    let failed = results.iter().filter(|r| !r.ok).count();
    let skipped = steps.len() - results.len();
    if failed > 0 {
        bail!(
            "{failed} of {} steps failed ({skipped} not run)",
            steps.len()
        );
    }
    Ok(())
}

fn print_results(results: &[StepResult]) {
    for result in results {
        let status = if result.ok { "ok" } else { "FAILED" };
        let strategy = result
            .strategy
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let detail = result
            .reason
            .map(|r| r.name().to_string())
            .or_else(|| result.message.clone())
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}ms\t{}",
            result.step_id, status, strategy, result.duration_ms, detail
        );
    }
}
