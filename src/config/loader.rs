//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/totwriter/config.toml)
//! 3. Project config (.totwriter/config.toml)
//! 4. Environment variables (TOTWRITER_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, TotError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // TOTWRITER_SEARCH_MAX_CANDIDATES -> search.max_candidates
        figment = figment.merge(
            Env::prefixed("TOTWRITER_")
                .lowercase(true)
                .map(|key| env_key(key.as_str()).into()),
        );

        let config: Config = figment
            .extract()
            .map_err(|e| TotError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| TotError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/totwriter/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("totwriter"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".totwriter")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Print config file locations
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Print the effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;
        println!("{}", Self::render(&config, as_json)?);
        Ok(())
    }

    fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| TotError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a config file into `dir`, returning its path
    pub fn init_in(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            TotError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::init_in(&global_dir, force)
    }

    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::init_in(&Self::project_dir(), force)
    }

    /// Default config file content (TOML)
    fn default_config() -> String {
        r#"# totwriter configuration
# Project settings in .totwriter/config.toml override the global file.

version = "1.0"

[llm]
provider = "claude-code"
model = "claude-sonnet-4-20250514"
timeout_secs = 300
temperature = 1.0
max_retries = 3

[search]
max_candidates = 5
boundary = "plan"
# max_depth = 5
# deadline_secs = 900

# Leave [plan] empty to use the built-in resume plan.
# [plan]
# goal = "A concise one-page resume"
#
# [[plan.stages]]
# name = "personal_information"
# instructions = "Personal information:"
"#
        .to_string()
    }
}

/// First `_` separates the section from the (snake_case) field name
fn env_key(key: &str) -> String {
    match key.split_once('_') {
        Some((section, field)) => format!("{}.{}", section, field),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SuccessBoundary;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_in(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.search.max_candidates, 5);
        assert_eq!(config.search.boundary, SuccessBoundary::Plan);
        assert!(config.plan.stages.is_empty());
    }

    #[test]
    fn test_init_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::init_in(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::init_in(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[search]"));
    }

    #[test]
    fn test_load_from_file_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[search]\nmax_candidates = 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, TotError::Config(_)));
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(json.contains("\"max_candidates\": 5"));
        let toml = ConfigLoader::render(&config, false).unwrap();
        assert!(toml.contains("[search]"));
    }

    #[test]
    fn test_env_override() {
        // SAFETY: This test runs in isolation
        unsafe {
            std::env::set_var("TOTWRITER_LLM_MODEL", "test-model");
        }
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.llm.model, "test-model");
        unsafe {
            std::env::remove_var("TOTWRITER_LLM_MODEL");
        }
    }

    #[test]
    fn test_env_key_keeps_snake_case_fields() {
        assert_eq!(env_key("search_max_candidates"), "search.max_candidates");
        assert_eq!(env_key("llm_timeout_secs"), "llm.timeout_secs");
        assert_eq!(env_key("version"), "version");
    }

    #[test]
    fn test_env_override_snake_case_key() {
        // SAFETY: no other test touches these variables
        unsafe {
            std::env::set_var("TOTWRITER_SEARCH_MAX_CANDIDATES", "2");
            std::env::set_var("TOTWRITER_LLM_MAX_RETRIES", "7");
        }
        let config = ConfigLoader::load();
        unsafe {
            std::env::remove_var("TOTWRITER_SEARCH_MAX_CANDIDATES");
            std::env::remove_var("TOTWRITER_LLM_MAX_RETRIES");
        }
        let config = config.unwrap();
        assert_eq!(config.search.max_candidates, 2);
        assert_eq!(config.llm.max_retries, 7);
    }
}
