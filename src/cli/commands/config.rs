//! Config Command
//!
//! Manage totwriter configuration.
//!
//! Usage:
//!   totwriter config show [-f json]
//!   totwriter config path
//!   totwriter config init [-g] [--force]

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(format: OutputFormat) -> Result<()> {
    ConfigLoader::show_config(format == OutputFormat::Json)
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    let scope = if global { "global" } else { "project" };
    Output::new().success(&format!("Initialized {} configuration", scope));
    println!("  Config: {}", path.display());
    Ok(())
}
