//! Scoped data directories for projects, apps, and components.
//!
//! Each scope owns a root with stable `cache` and `data` subdirectories,
//! created on first acquisition. Child scopes are derived from their parent,
//! so every component's files live under its app, and every app's under its
//! project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::component::Kind;

/// A directory scope with stable cache/data subdirectories.
#[derive(Debug, Clone)]
struct ScopedDir {
    root: PathBuf,
}

impl ScopedDir {
    fn create(root: PathBuf) -> anyhow::Result<Self> {
        for dir in [root.clone(), root.join("cache"), root.join("data")] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        }
        Ok(Self { root })
    }
}

/// Data directory tree for one project.
#[derive(Debug, Clone)]
pub struct ProjectDir {
    scope: ScopedDir,
}

impl ProjectDir {
    /// Open the project tree rooted at `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            scope: ScopedDir::create(root.into())?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.scope.root
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.scope.root.join("cache")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.scope.root.join("data")
    }

    /// Acquire the private directory for the named application.
    pub fn app(&self, name: &str) -> anyhow::Result<AppDir> {
        ensure_scope_name(name)?;
        Ok(AppDir {
            scope: ScopedDir::create(self.scope.root.join("app").join(name))?,
        })
    }
}

/// Private data directory for one application.
#[derive(Debug, Clone)]
pub struct AppDir {
    scope: ScopedDir,
}

impl AppDir {
    pub fn root(&self) -> &Path {
        &self.scope.root
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.scope.root.join("cache")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.scope.root.join("data")
    }

    /// Acquire the private directory for one loaded component.
    pub fn component(&self, kind: Kind, name: &str) -> anyhow::Result<ComponentDir> {
        ensure_scope_name(name)?;
        let dir = format!("{}-{}", kind, name);
        Ok(ComponentDir {
            scope: ScopedDir::create(self.scope.root.join("component").join(dir))?,
        })
    }
}

/// Private data directory for one loaded plugin component.
#[derive(Debug, Clone)]
pub struct ComponentDir {
    scope: ScopedDir,
}

impl ComponentDir {
    pub fn root(&self) -> &Path {
        &self.scope.root
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.scope.root.join("cache")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.scope.root.join("data")
    }
}

fn ensure_scope_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("Scope names must not be empty");
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        anyhow::bail!("Path separators not allowed in scope name '{}'", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_dir_creates_tree() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dir = ProjectDir::new(temp.path().join(".convoy")).unwrap();

        assert!(dir.root().is_dir());
        assert!(dir.cache_dir().is_dir());
        assert!(dir.data_dir().is_dir());
    }

    #[test]
    fn test_app_and_component_scopes_nest() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let project = ProjectDir::new(temp.path().join(".convoy")).unwrap();

        let app = project.app("web").unwrap();
        assert!(app.root().starts_with(project.root()));
        assert!(app.cache_dir().is_dir());

        let component = app.component(Kind::Platform, "nomad").unwrap();
        assert!(component.root().starts_with(app.root()));
        assert!(component.root().ends_with("component/platform-nomad"));
        assert!(component.data_dir().is_dir());
    }

    #[test]
    fn test_scope_names_reject_separators() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let project = ProjectDir::new(temp.path().join(".convoy")).unwrap();

        assert!(project.app("").is_err());
        assert!(project.app("../escape").is_err());
        assert!(project.app("a/b").is_err());
    }

    #[test]
    fn test_reacquiring_scope_is_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let project = ProjectDir::new(temp.path().join(".convoy")).unwrap();

        let first = project.app("web").unwrap();
        let second = project.app("web").unwrap();
        assert_eq!(first.root(), second.root());
    }
}
