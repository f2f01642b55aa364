//! Stage Plan
//!
//! The immutable, ordered list of stages a search must fill. Each stage
//! carries the key its accepted fragment is stored under and the
//! instructions handed to the candidate generator. The engine never looks
//! inside the instructions.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::PlanConfig;
use crate::types::{Result, TotError};

const RESUME_GOAL: &str = "A complete, truthful and well-structured resume in markdown";

/// One stage of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSpec {
    /// 0-based position in the plan
    pub index: usize,
    /// Context key for this stage's fragment
    pub name: String,
    /// Generator instructions (opaque to the engine)
    pub instructions: String,
}

/// Ordered, fixed sequence of stages
#[derive(Debug, Clone, Serialize)]
pub struct StagePlan {
    goal: String,
    stages: Vec<StageSpec>,
}

impl StagePlan {
    /// Build a plan from `(name, instructions)` pairs in order.
    ///
    /// Names must be non-empty and unique since they key the context.
    pub fn new<I, N, S>(goal: impl Into<String>, stages: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut specs = Vec::new();

        for (index, (name, instructions)) in stages.into_iter().enumerate() {
            let name = name.into().trim().to_string();
            if name.is_empty() {
                return Err(TotError::Config(format!(
                    "stage {} has an empty name",
                    index
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(TotError::Config(format!(
                    "duplicate stage name '{}'",
                    name
                )));
            }
            specs.push(StageSpec {
                index,
                name,
                instructions: instructions.into(),
            });
        }

        if specs.is_empty() {
            return Err(TotError::Config(
                "a stage plan needs at least one stage".to_string(),
            ));
        }

        Ok(Self {
            goal: goal.into(),
            stages: specs,
        })
    }

    /// Built-in five-stage resume plan
    pub fn resume() -> Self {
        let stages = [
            ("personal_information", "Personal information:"),
            ("education", "Education:"),
            ("work_experience", "Work experience:"),
            ("projects", "Projects:"),
            ("skills", "Skills:"),
        ];
        Self {
            goal: RESUME_GOAL.to_string(),
            stages: stages
                .into_iter()
                .enumerate()
                .map(|(index, (name, instructions))| StageSpec {
                    index,
                    name: name.to_string(),
                    instructions: instructions.to_string(),
                })
                .collect(),
        }
    }

    /// Build from configuration, falling back to the resume plan
    pub fn from_config(config: &PlanConfig) -> Result<Self> {
        if config.stages.is_empty() {
            let mut plan = Self::resume();
            if !config.goal.trim().is_empty() {
                plan.goal = config.goal.clone();
            }
            return Ok(plan);
        }

        let goal = if config.goal.trim().is_empty() {
            RESUME_GOAL.to_string()
        } else {
            config.goal.clone()
        };

        Self::new(
            goal,
            config
                .stages
                .iter()
                .map(|s| (s.name.as_str(), s.instructions.as_str())),
        )
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_at(&self, index: usize) -> Result<&StageSpec> {
        self.stages.get(index).ok_or(TotError::IndexOutOfRange {
            index,
            len: self.stages.len(),
        })
    }

    pub fn stages(&self) -> impl Iterator<Item = &StageSpec> {
        self.stages.iter()
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;

    #[test]
    fn test_new_assigns_indices_in_order() {
        let plan = StagePlan::new("goal", [("a", "do a"), ("b", "do b")]).unwrap();
        assert_eq!(plan.stage_count(), 2);
        assert_eq!(plan.stage_at(0).unwrap().name, "a");
        assert_eq!(plan.stage_at(1).unwrap().index, 1);
        assert_eq!(plan.stage_at(1).unwrap().instructions, "do b");
    }

    #[test]
    fn test_stage_at_out_of_range() {
        let plan = StagePlan::resume();
        let err = plan.stage_at(5).unwrap_err();
        assert!(matches!(err, TotError::IndexOutOfRange { index: 5, len: 5 }));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_names() {
        let empty: Vec<(&str, &str)> = vec![];
        assert!(StagePlan::new("g", empty).is_err());
        assert!(StagePlan::new("g", [("a", ""), ("a", "")]).is_err());
        assert!(StagePlan::new("g", [(" ", "")]).is_err());
    }

    #[test]
    fn test_resume_plan() {
        let plan = StagePlan::resume();
        let names: Vec<_> = plan.stages().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "personal_information",
                "education",
                "work_experience",
                "projects",
                "skills"
            ]
        );
    }

    #[test]
    fn test_from_config() {
        let plan = StagePlan::from_config(&PlanConfig::default()).unwrap();
        assert_eq!(plan.stage_count(), 5);

        let config = PlanConfig {
            goal: "A haiku".to_string(),
            stages: vec![
                StageConfig {
                    name: "line1".to_string(),
                    instructions: "Five syllables".to_string(),
                },
                StageConfig {
                    name: "line2".to_string(),
                    instructions: "Seven syllables".to_string(),
                },
            ],
        };
        let plan = StagePlan::from_config(&config).unwrap();
        assert_eq!(plan.goal(), "A haiku");
        assert_eq!(plan.stage_count(), 2);
    }
}
