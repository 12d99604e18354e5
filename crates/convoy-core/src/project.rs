//! Project: the owning collaborator and sole factory for Apps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use convoy_sdk::component::{JobInfo, Kind};
use convoy_sdk::datadir::ProjectDir;
use convoy_sdk::dynfunc::DynFunc;
use convoy_sdk::terminal::{ConsoleUI, UiHandle};

use crate::app::{App, ConstructionError};
use crate::config::ProjectConfig;
use crate::labels;
use crate::plugin::Launcher;
use crate::server::{NullClient, ServerClient, WorkspaceRef};

/// One project session: identity, ambient services, the base converter
/// chain, and the applications built from it.
///
/// A `Project` is the only way to obtain an [`App`]; it returns the same
/// instance for the same application name for the lifetime of the session.
pub struct Project {
    config: ProjectConfig,
    root: PathBuf,
    workspace: WorkspaceRef,
    client: Arc<dyn ServerClient>,
    job_info: JobInfo,
    mappers: Vec<DynFunc>,
    launchers: HashMap<Kind, Arc<dyn Launcher>>,
    dir: ProjectDir,
    ui: UiHandle,
    apps: Mutex<HashMap<String, Arc<App>>>,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.config.project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace_ref(&self) -> &WorkspaceRef {
        &self.workspace
    }

    pub fn ui(&self) -> UiHandle {
        self.ui.clone()
    }

    /// Merge label sets over the project's own labels. See [`labels::merge`].
    pub fn merge_labels(&self, sets: &[&HashMap<String, String>]) -> HashMap<String, String> {
        labels::merge(&self.config.labels, sets)
    }

    /// Get or build the App for the named application.
    ///
    /// Exactly one App exists per application name within a session; repeated
    /// calls return the same instance.
    pub fn app(&self, name: &str) -> Result<Arc<App>, ConstructionError> {
        let mut apps = self.apps.lock().expect("apps lock");
        if let Some(existing) = apps.get(name) {
            return Ok(existing.clone());
        }

        let config = self
            .config
            .app(name)
            .ok_or_else(|| ConstructionError::UnknownApp(name.to_string()))?
            .clone();
        let app = Arc::new(App::new(self, config)?);
        apps.insert(name.to_string(), app.clone());
        Ok(app)
    }

    /// Tear down every App this project produced.
    pub fn close(&self) -> anyhow::Result<()> {
        let apps: Vec<Arc<App>> = {
            let mut guard = self.apps.lock().expect("apps lock");
            guard.drain().map(|(_, app)| app).collect()
        };
        for app in apps {
            app.close()?;
        }
        Ok(())
    }

    pub(crate) fn labels(&self) -> &HashMap<String, String> {
        &self.config.labels
    }

    pub(crate) fn client(&self) -> Arc<dyn ServerClient> {
        self.client.clone()
    }

    pub(crate) fn job_info(&self) -> &JobInfo {
        &self.job_info
    }

    pub(crate) fn mappers(&self) -> &[DynFunc] {
        &self.mappers
    }

    pub(crate) fn launchers(&self) -> &HashMap<Kind, Arc<dyn Launcher>> {
        &self.launchers
    }

    pub(crate) fn dir(&self) -> &ProjectDir {
        &self.dir
    }
}

/// Builder wiring a [`Project`] from its configuration and collaborators.
pub struct ProjectBuilder {
    config: ProjectConfig,
    root: PathBuf,
    client: Option<Arc<dyn ServerClient>>,
    job_info: Option<JobInfo>,
    mappers: Vec<DynFunc>,
    launchers: HashMap<Kind, Arc<dyn Launcher>>,
    ui: Option<UiHandle>,
    state_dir: Option<PathBuf>,
}

impl ProjectBuilder {
    pub fn new(config: ProjectConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
            client: None,
            job_info: None,
            mappers: Vec::new(),
            launchers: HashMap::new(),
            ui: None,
            state_dir: None,
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ServerClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_job_info(mut self, job_info: JobInfo) -> Self {
        self.job_info = Some(job_info);
        self
    }

    /// Seed the project-level converter chain. Entries keep their
    /// registration order, ahead of any app-scoped converters.
    pub fn with_base_converters(mut self, converters: impl IntoIterator<Item = DynFunc>) -> Self {
        self.mappers.extend(converters);
        self
    }

    /// Register the launcher used for plugins of `kind`.
    pub fn with_launcher(mut self, kind: Kind, launcher: Arc<dyn Launcher>) -> Self {
        self.launchers.insert(kind, launcher);
        self
    }

    pub fn with_ui(mut self, ui: UiHandle) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Override the state directory (defaults to `.convoy` under the project
    /// root). Primarily for testing.
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(state_dir.into());
        self
    }

    pub fn build(self) -> anyhow::Result<Project> {
        self.config.validate()?;
        if !self.root.is_absolute() {
            anyhow::bail!(
                "Project root must be an absolute path, got '{}'",
                self.root.display()
            );
        }

        let state_dir = self
            .state_dir
            .unwrap_or_else(|| self.root.join(".convoy"));
        let dir = ProjectDir::new(state_dir)?;

        let workspace = WorkspaceRef::new(self.config.workspace.clone());
        let job_info = self
            .job_info
            .unwrap_or_else(|| JobInfo::local(self.config.workspace.clone()));

        Ok(Project {
            config: self.config,
            root: self.root,
            workspace,
            client: self.client.unwrap_or_else(|| Arc::new(NullClient)),
            job_info,
            mappers: self.mappers,
            launchers: self.launchers,
            dir,
            ui: self.ui.unwrap_or_else(|| Arc::new(ConsoleUI)),
            apps: Mutex::new(HashMap::new()),
        })
    }
}
