//! Plan Command
//!
//! Print the effective stage plan.

use crate::cli::OutputFormat;
use crate::config::ConfigLoader;
use crate::plan::StagePlan;
use crate::types::Result;

pub fn run(format: OutputFormat) -> Result<()> {
    let config = ConfigLoader::load()?;
    let plan = StagePlan::from_config(&config.plan)?;
    println!("{}", render(&plan, format)?);
    Ok(())
}

fn render(plan: &StagePlan, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(plan)?);
    }

    let mut out = format!("Goal: {}\n\nStages:\n", plan.goal());
    for stage in plan.stages() {
        out.push_str(&format!("  {}. {}", stage.index + 1, stage.name));
        if !stage.instructions.is_empty() {
            out.push_str(&format!("  ({})", stage.instructions.lines().next().unwrap_or("")));
        }
        out.push('\n');
    }
    Ok(out.trim_end().to_string())
}
