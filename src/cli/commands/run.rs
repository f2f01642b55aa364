//! Run Command
//!
//! Search the configured plan with the configured provider and print the
//! accepted fragments.
//!
//! Usage:
//!   totwriter run [--max-depth N] [--max-candidates K] [--boundary plan|max-depth]
//!                 [--provider P] [--model M] [--timeout SECS] [-f text|json]

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{
    LlmEvaluator, LlmGenerator, RetryPolicy, create_provider, with_optional_timeout,
};
use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::plan::StagePlan;
use crate::search::{
    CancellationFlag, Context, SearchEngine, SearchOptions, SearchReport, SearchStats,
    SuccessBoundary,
};
use crate::types::Result;

/// Command-line overrides; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub max_depth: Option<usize>,
    pub max_candidates: Option<usize>,
    pub boundary: Option<SuccessBoundary>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub format: OutputFormat,
}

impl RunOptions {
    fn apply(&self, config: &mut Config) {
        if let Some(max_depth) = self.max_depth {
            config.search.max_depth = Some(max_depth);
        }
        if let Some(max_candidates) = self.max_candidates {
            config.search.max_candidates = max_candidates;
        }
        if let Some(boundary) = self.boundary {
            config.search.boundary = boundary;
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.search.deadline_secs = Some(timeout_secs);
        }
    }
}

/// JSON shape of a finished run
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    solved: bool,
    context: Option<&'a Context>,
    stats: &'a SearchStats,
}

fn search_options(config: &Config, cancellation: CancellationFlag) -> SearchOptions {
    let options = SearchOptions::default()
        .with_max_candidates(config.search.max_candidates)
        .with_boundary(config.search.boundary)
        .with_cancellation(cancellation);

    match config.search.max_depth {
        Some(max_depth) => options.with_max_depth(max_depth),
        None => options,
    }
}

pub async fn run(options: RunOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    options.apply(&mut config);
    config.validate()?;

    let plan = StagePlan::from_config(&config.plan)?;
    let provider = create_provider(&config.llm.provider_config())?;

    if !provider.health_check().await.unwrap_or(false) {
        warn!(
            provider = provider.name(),
            "Provider health check failed; the run will likely fail"
        );
    }

    let retry = RetryPolicy::with_max_retries(config.llm.max_retries);
    let generator = LlmGenerator::new(provider.clone(), plan.goal()).with_retry(retry);
    let evaluator = LlmEvaluator::new(provider.clone()).with_retry(retry);

    let cancellation = CancellationFlag::new();
    let interrupt = {
        let flag = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping before the next collaborator call");
                flag.cancel();
            }
        })
    };

    info!(
        provider = provider.name(),
        model = provider.model(),
        stages = plan.stage_count(),
        "Running search"
    );

    let engine = SearchEngine::new(&plan, &generator, &evaluator)
        .with_options(search_options(&config, cancellation));
    let deadline = config.search.deadline_secs.map(Duration::from_secs);
    let outcome = with_optional_timeout(deadline, engine.run(), "search").await;
    interrupt.abort();

    print_report(&outcome?, options.format)
}

fn print_report(report: &SearchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Text => {
            let output = Output::new();
            match report.result.context() {
                Some(context) => {
                    output.header("Result");
                    output.fragments(context);
                    output.success(&format!("Filled {} stages", context.len()));
                }
                None => output.warning("No candidate path reached the goal"),
            }
            output.stats(&report.stats);
        }
    }
    Ok(())
}

fn render_json(report: &SearchReport) -> Result<String> {
    let summary = RunSummary {
        solved: report.result.is_solved(),
        context: report.result.context(),
        stats: &report.stats,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}
