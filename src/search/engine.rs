//! Recursive backtracking controller.

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    Candidate, CandidateEvaluator, CandidateGenerator, Context, SearchOptions, SearchReport,
    SearchResult, SearchStats, SuccessBoundary, Verdict,
};
use crate::plan::{StagePlan, StageSpec};
use crate::types::{Result, TotError};

/// Search one plan with the given generator and evaluator.
///
/// `max_depth` is the initial lookahead budget and may not exceed the plan's
/// stage count. Exhaustion is `Ok(SearchResult::Exhausted)`.
pub async fn search(
    plan: &StagePlan,
    generator: &dyn CandidateGenerator,
    evaluator: &dyn CandidateEvaluator,
    max_depth: usize,
) -> Result<SearchResult> {
    let report = SearchEngine::new(plan, generator, evaluator)
        .with_options(SearchOptions::default().with_max_depth(max_depth))
        .run()
        .await?;
    Ok(report.result)
}

/// Mutable state owned by the single active search path
#[derive(Debug, Default)]
struct Walk {
    context: Context,
    stats: SearchStats,
}

pub struct SearchEngine<'a> {
    plan: &'a StagePlan,
    generator: &'a dyn CandidateGenerator,
    evaluator: &'a dyn CandidateEvaluator,
    options: SearchOptions,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        plan: &'a StagePlan,
        generator: &'a dyn CandidateGenerator,
        evaluator: &'a dyn CandidateEvaluator,
    ) -> Self {
        Self {
            plan,
            generator,
            evaluator,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    fn max_depth(&self) -> usize {
        self.options.max_depth.unwrap_or(self.plan.stage_count())
    }

    fn boundary(&self) -> usize {
        match self.options.boundary {
            SuccessBoundary::Plan => self.plan.stage_count(),
            SuccessBoundary::MaxDepth => self.max_depth(),
        }
    }

    fn validate(&self) -> Result<()> {
        let stages = self.plan.stage_count();
        let requested = self.max_depth();
        if requested > stages {
            return Err(TotError::InvalidDepth { requested, stages });
        }
        if self.options.max_candidates == 0 {
            return Err(TotError::Config(
                "max_candidates must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the search to the first complete path or to exhaustion.
    #[instrument(
        name = "search",
        skip(self),
        fields(
            run_id = %Uuid::new_v4(),
            stages = self.plan.stage_count(),
            max_depth = self.max_depth(),
            boundary = %self.options.boundary,
        )
    )]
    pub async fn run(&self) -> Result<SearchReport> {
        self.validate()?;

        info!("Starting tree-of-thought search");
        let mut walk = Walk::default();
        let solved = self.descend(0, self.max_depth(), &mut walk).await?;

        let result = if solved {
            SearchResult::Solved(walk.context)
        } else {
            debug_assert!(walk.context.is_empty());
            SearchResult::Exhausted
        };

        info!(
            solved = result.is_solved(),
            generator_calls = walk.stats.generator_calls,
            evaluator_calls = walk.stats.evaluator_calls,
            backtracks = walk.stats.backtracks,
            "Search finished"
        );

        Ok(SearchReport {
            result,
            stats: walk.stats,
        })
    }

    /// One stage frame. Returns `Ok(true)` once the boundary is reached with
    /// `walk.context` holding the full path; on `Ok(false)` or `Err` the
    /// context is exactly as it was on entry.
    fn descend<'s>(
        &'s self,
        stage_index: usize,
        budget: usize,
        walk: &'s mut Walk,
    ) -> BoxFuture<'s, Result<bool>> {
        async move {
            if stage_index == self.boundary() {
                debug!(stage_index, "Reached success boundary");
                return Ok(true);
            }

            let stage = self.plan.stage_at(stage_index)?;
            walk.stats.deepest_stage = walk.stats.deepest_stage.max(stage_index);

            if budget == 0 {
                walk.stats.budget_cutoffs += 1;
                debug!(stage = %stage.name, "Lookahead budget exhausted before boundary");
                return Ok(false);
            }

            self.check_cancelled(stage)?;
            let candidates = self.generate(stage, walk).await?;
            if candidates.is_empty() {
                debug!(stage = %stage.name, "No candidates generated");
                return Ok(false);
            }

            self.check_cancelled(stage)?;
            let verdicts = self.evaluate(stage, &candidates, walk).await?;

            for (candidate, verdict) in candidates.into_iter().zip(verdicts) {
                let next_budget = match verdict {
                    Verdict::Impossible => {
                        walk.stats.candidates_pruned += 1;
                        continue;
                    }
                    Verdict::Sure => budget,
                    Verdict::Maybe => budget - 1,
                };

                debug!(
                    stage = %stage.name,
                    candidate = candidate.index,
                    %verdict,
                    budget = next_budget,
                    "Descending"
                );

                walk.context.push(stage.name.as_str(), candidate.text);
                match self.descend(stage_index + 1, next_budget, walk).await {
                    Ok(true) => return Ok(true),
                    Ok(false) => {
                        walk.context.pop();
                        walk.stats.backtracks += 1;
                    }
                    Err(e) => {
                        walk.context.pop();
                        return Err(e);
                    }
                }
            }

            debug!(stage = %stage.name, "Candidates exhausted");
            Ok(false)
        }
        .boxed()
    }

    fn check_cancelled(&self, stage: &StageSpec) -> Result<()> {
        match &self.options.cancellation {
            Some(flag) if flag.is_cancelled() => Err(TotError::Cancelled {
                stage: stage.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    async fn generate(&self, stage: &StageSpec, walk: &mut Walk) -> Result<Vec<Candidate>> {
        walk.stats.generator_calls += 1;
        let limit = self.options.max_candidates;

        let mut texts = self
            .generator
            .generate(stage, &walk.context, limit)
            .await
            .map_err(|e| match e {
                TotError::Generation { .. } => e,
                other => TotError::generation(&stage.name, other.to_string()),
            })?;

        if texts.len() > limit {
            debug!(
                stage = %stage.name,
                generated = texts.len(),
                limit,
                "Truncating candidates to branching cap"
            );
            texts.truncate(limit);
        }
        walk.stats.candidates_generated += texts.len();

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Candidate { index, text })
            .collect())
    }

    async fn evaluate(
        &self,
        stage: &StageSpec,
        candidates: &[Candidate],
        walk: &mut Walk,
    ) -> Result<Vec<Verdict>> {
        walk.stats.evaluator_calls += 1;

        let verdicts = self
            .evaluator
            .evaluate(stage, self.plan.goal(), &walk.context, candidates)
            .await
            .map_err(|e| match e {
                TotError::Evaluation { .. } => e,
                other => TotError::evaluation(&stage.name, other.to_string()),
            })?;

        if verdicts.len() != candidates.len() {
            warn!(
                stage = %stage.name,
                expected = candidates.len(),
                actual = verdicts.len(),
                "Evaluator broke the one-verdict-per-candidate contract"
            );
            return Err(TotError::EvaluationContract {
                stage: stage.name.clone(),
                expected: candidates.len(),
                actual: verdicts.len(),
            });
        }

        Ok(verdicts)
    }
}
