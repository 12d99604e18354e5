//! Declarative project and application configuration.
//!
//! The project document is TOML (`convoy.toml`): project identity and labels
//! at the top, one `[[app]]` table per application.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// What to do when a hook command fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookFailurePolicy {
    /// Abort the surrounding operation.
    #[default]
    Fail,
    /// Log and keep going.
    Continue,
}

/// Lifecycle hook attached to an application's components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    /// Phase the hook runs in, e.g. "before-build" or "after-deploy".
    pub when: String,
    /// Command line executed when the phase is reached.
    pub command: String,
    #[serde(default)]
    pub on_failure: HookFailurePolicy,
}

/// One application within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    /// Source path relative to the project root; the project root itself
    /// when omitted.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
}

impl AppConfig {
    /// Hooks grouped by their `when` phase, preserving declaration order
    /// within each phase.
    pub fn hooks_by_when(&self) -> HashMap<String, Vec<Hook>> {
        let mut grouped: HashMap<String, Vec<Hook>> = HashMap::new();
        for hook in &self.hooks {
            grouped.entry(hook.when.clone()).or_default().push(hook.clone());
        }
        grouped
    }
}

fn default_workspace() -> String {
    "default".to_string()
}

/// The project document parsed from `convoy.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default, rename = "app")]
    pub apps: Vec<AppConfig>,
}

impl ProjectConfig {
    /// Parse and validate a project document.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self =
            toml::from_str(raw).context("Failed to parse project configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.project.is_empty() {
            anyhow::bail!("Project name must not be empty");
        }
        let mut seen = std::collections::HashSet::new();
        for app in &self.apps {
            if app.name.is_empty() {
                anyhow::bail!("Application names must not be empty");
            }
            if !seen.insert(app.name.as_str()) {
                anyhow::bail!("Duplicate application name '{}'", app.name);
            }
            if let Some(path) = &app.path
                && path.is_absolute()
            {
                anyhow::bail!(
                    "Application '{}' path must be relative to the project root",
                    app.name
                );
            }
        }
        Ok(())
    }

    /// Look up one application's configuration by name.
    pub fn app(&self, name: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| app.name == name)
    }
}
