//! Tree-of-Thought Search
//!
//! Depth-first backtracking over candidate fragments, one stage at a time.
//! For each stage the engine asks a [`CandidateGenerator`] for a bounded list
//! of fragments, asks a [`CandidateEvaluator`] for one [`Verdict`] per
//! fragment, and descends along the viable ones in generation order. The
//! first path that reaches the success boundary wins.
//!
//! ## Budget
//!
//! Every run starts with a lookahead budget of `max_depth`. A `sure` verdict
//! descends with the budget unchanged, a `maybe` verdict descends with one
//! less. A stage entered with a budget of zero exhausts unless it already is
//! the success boundary.
//!
//! ## Modules
//!
//! - `context`: accumulated stage → fragment mapping
//! - `engine`: the recursive controller
//! - `verdict`: sure / maybe / impossible

mod context;
mod engine;
mod verdict;

pub use context::{Candidate, Context};
pub use engine::{SearchEngine, search};
pub use verdict::Verdict;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::search as search_constants;
use crate::plan::StageSpec;
use crate::types::Result;

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Proposes candidate fragments for a stage
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// Return up to `limit` candidate texts for `stage`, conditioned on the
    /// fragments accepted so far. Extra items are discarded by the engine.
    async fn generate(
        &self,
        stage: &StageSpec,
        context: &Context,
        limit: usize,
    ) -> Result<Vec<String>>;
}

/// Classifies candidates against the overall goal
#[async_trait]
pub trait CandidateEvaluator: Send + Sync {
    /// Return exactly one verdict per candidate, in candidate order.
    async fn evaluate(
        &self,
        stage: &StageSpec,
        goal: &str,
        context: &Context,
        candidates: &[Candidate],
    ) -> Result<Vec<Verdict>>;
}

// =============================================================================
// Options
// =============================================================================

/// Stage index at which a path counts as complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuccessBoundary {
    /// Every stage of the plan must be filled
    #[default]
    Plan,
    /// Only the first `max_depth` stages must be filled
    MaxDepth,
}

impl fmt::Display for SuccessBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessBoundary::Plan => write!(f, "plan"),
            SuccessBoundary::MaxDepth => write!(f, "max-depth"),
        }
    }
}

impl FromStr for SuccessBoundary {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plan" => Ok(SuccessBoundary::Plan),
            "max-depth" | "max_depth" | "depth" => Ok(SuccessBoundary::MaxDepth),
            _ => Err(format!(
                "Invalid boundary '{}'. Valid values: plan, max-depth",
                s
            )),
        }
    }
}

/// Cooperative cancellation shared between the caller and a running search
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning for a single search run
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Initial lookahead budget; `None` uses the plan's stage count
    pub max_depth: Option<usize>,
    /// Branching cap per stage
    pub max_candidates: usize,
    pub boundary: SuccessBoundary,
    pub cancellation: Option<CancellationFlag>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_candidates: search_constants::MAX_CANDIDATES,
            boundary: SuccessBoundary::Plan,
            cancellation: None,
        }
    }
}

impl SearchOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_boundary(mut self, boundary: SuccessBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of a search: a complete context or exhaustion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Solved(Context),
    Exhausted,
}

impl SearchResult {
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchResult::Solved(_))
    }

    pub fn context(&self) -> Option<&Context> {
        match self {
            SearchResult::Solved(ctx) => Some(ctx),
            SearchResult::Exhausted => None,
        }
    }

    pub fn into_context(self) -> Option<Context> {
        match self {
            SearchResult::Solved(ctx) => Some(ctx),
            SearchResult::Exhausted => None,
        }
    }
}

/// Counters collected during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub generator_calls: usize,
    pub evaluator_calls: usize,
    pub candidates_generated: usize,
    /// Candidates skipped as impossible
    pub candidates_pruned: usize,
    /// Insertions undone after a child branch exhausted
    pub backtracks: usize,
    /// Branches cut because the budget reached zero
    pub budget_cutoffs: usize,
    /// Highest stage index entered
    pub deepest_stage: usize,
}

/// Result plus run statistics
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub result: SearchResult,
    pub stats: SearchStats,
}

// =============================================================================
// Test Collaborators
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_parse_and_display() {
        assert_eq!("plan".parse::<SuccessBoundary>().unwrap(), SuccessBoundary::Plan);
        assert_eq!(
            "max-depth".parse::<SuccessBoundary>().unwrap(),
            SuccessBoundary::MaxDepth
        );
        assert!("leaf".parse::<SuccessBoundary>().is_err());
        assert_eq!(SuccessBoundary::MaxDepth.to_string(), "max-depth");
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_options_builder() {
        let opts = SearchOptions::default()
            .with_max_depth(3)
            .with_max_candidates(2)
            .with_boundary(SuccessBoundary::MaxDepth);
        assert_eq!(opts.max_depth, Some(3));
        assert_eq!(opts.max_candidates, 2);
        assert_eq!(opts.boundary, SuccessBoundary::MaxDepth);
        assert!(opts.cancellation.is_none());
    }

    #[test]
    fn test_search_result_accessors() {
        assert!(!SearchResult::Exhausted.is_solved());
        assert!(SearchResult::Exhausted.context().is_none());
        let solved = SearchResult::Solved(Context::new());
        assert!(solved.is_solved());
        assert!(solved.into_context().unwrap().is_empty());
    }
}
