//! totwriter - Tree-of-Thought Document Writer
//!
//! Fills a fixed, ordered plan of stages (for example the sections of a
//! resume) one fragment at a time. For each stage a generator proposes a
//! few candidate fragments, an evaluator rates each one `sure`, `maybe` or
//! `impossible` against the overall goal, and a depth-first search with
//! backtracking keeps the first path that fills every stage.
//!
//! ## Quick Start
//!
//! ```ignore
//! use totwriter::ai::{LlmEvaluator, LlmGenerator, create_provider};
//! use totwriter::{SearchEngine, SearchOptions, StagePlan};
//!
//! let plan = StagePlan::resume();
//! let provider = create_provider(&config.llm.provider_config())?;
//! let generator = LlmGenerator::new(provider.clone(), plan.goal());
//! let evaluator = LlmEvaluator::new(provider);
//! let report = SearchEngine::new(&plan, &generator, &evaluator)
//!     .with_options(SearchOptions::default().with_max_depth(3))
//!     .run()
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`search`]: the backtracking engine and its collaborator traits
//! - [`plan`]: stage plans
//! - [`ai`]: LLM providers, generator and evaluator adapters
//! - [`config`]: layered configuration
//! - [`cli`]: command implementations for the binary

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod plan;
pub mod search;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use plan::{StagePlan, StageSpec};
pub use search::{
    CancellationFlag, Candidate, CandidateEvaluator, CandidateGenerator, Context, SearchEngine,
    SearchOptions, SearchReport, SearchResult, SearchStats, SuccessBoundary, Verdict, search,
};
pub use types::error::{ErrorCategory, Result, TotError};
