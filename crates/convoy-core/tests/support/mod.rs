//! Shared fixtures for convoy-core integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use convoy_core::config::ProjectConfig;
use convoy_core::plugin::{Launcher, PluginError, ShutdownHandle, StartedPlugin};
use convoy_core::project::{Project, ProjectBuilder};
use convoy_core::server::{AppRef, OperationRecord, ServerClient};
use convoy_sdk::component::{ComponentInfo, Kind};
use convoy_sdk::dynfunc::DynFunc;
use convoy_sdk::terminal::{Status, StatusSink, UI};
use tempfile::TempDir;

pub const PROJECT_TOML: &str = r#"
    project = "acme"
    workspace = "staging"

    [labels]
    env = "dev"
    team = "infra"

    [[app]]
    name = "web"
    path = "services/web"

    [app.labels]
    env = "staging"
    tier = "frontend"

    [[app.hooks]]
    when = "before-deploy"
    command = "make preflight"

    [[app]]
    name = "worker"
"#;

/// Description of one plugin a [`FakeLauncher`] can start.
pub struct FakePlugin {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub converters: Vec<DynFunc>,
    pub operations: HashMap<String, DynFunc>,
    pub fail_start: bool,
    pub fail_shutdown: bool,
}

impl FakePlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: HashMap::new(),
            converters: Vec::new(),
            operations: HashMap::new(),
            fail_start: false,
            fail_shutdown: false,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_converter(mut self, converter: DynFunc) -> Self {
        self.converters.push(converter);
        self
    }

    pub fn with_operation(mut self, name: &str, operation: DynFunc) -> Self {
        self.operations.insert(name.to_string(), operation);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }
}

/// In-process launcher standing in for the subprocess plugin registry.
///
/// Started plugins append their name to a shared shutdown log when their
/// handle runs, so tests can assert exactly-once teardown.
#[derive(Default)]
pub struct FakeLauncher {
    plugins: HashMap<Kind, Vec<FakePlugin>>,
    shutdowns: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, kind: Kind, plugin: FakePlugin) -> Self {
        self.plugins.entry(kind).or_default().push(plugin);
        self
    }

    /// Names of the plugins whose shutdown handles have run, in invocation
    /// order.
    pub fn shutdown_log(&self) -> Vec<String> {
        self.shutdowns.lock().expect("shutdown log lock").clone()
    }
}

impl Launcher for FakeLauncher {
    fn registered(&self, kind: Kind) -> Vec<String> {
        self.plugins
            .get(&kind)
            .map(|plugins| plugins.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    fn start(&self, kind: Kind, name: &str) -> Result<StartedPlugin, PluginError> {
        let plugin = self
            .plugins
            .get(&kind)
            .and_then(|plugins| plugins.iter().find(|p| p.name == name))
            .ok_or_else(|| PluginError::UnknownPlugin {
                kind,
                name: name.to_string(),
            })?;

        if plugin.fail_start {
            return Err(PluginError::Spawn {
                kind,
                name: name.to_string(),
                source: anyhow::anyhow!("plugin binary exited during handshake"),
            });
        }

        let log = self.shutdowns.clone();
        let logged_name = name.to_string();
        let fail_shutdown = plugin.fail_shutdown;
        Ok(StartedPlugin {
            info: ComponentInfo {
                kind,
                name: name.to_string(),
                version: "0.1.0".to_string(),
            },
            labels: plugin.labels.clone(),
            converters: plugin.converters.clone(),
            operations: plugin.operations.clone(),
            shutdown: ShutdownHandle::new(move || {
                log.lock().expect("shutdown log lock").push(logged_name);
                if fail_shutdown {
                    anyhow::bail!("plugin process refused to exit");
                }
                Ok(())
            }),
        })
    }
}

/// UI that counts status opens/closes and captures output lines.
#[derive(Default)]
pub struct CountingUI {
    pub status_opens: Arc<AtomicUsize>,
    pub status_closes: Arc<AtomicUsize>,
    pub output: Arc<Mutex<Vec<String>>>,
}

struct CountingStatusSink {
    closes: Arc<AtomicUsize>,
}

impl StatusSink for CountingStatusSink {
    fn update(&mut self, _message: &str) {}

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl UI for CountingUI {
    fn output(&self, message: &str) {
        self.output
            .lock()
            .expect("output lock")
            .push(message.to_string());
    }

    fn status(&self) -> Status {
        self.status_opens.fetch_add(1, Ordering::SeqCst);
        Status::new(Box::new(CountingStatusSink {
            closes: self.status_closes.clone(),
        }))
    }
}

/// Server client that captures every record it receives.
#[derive(Default)]
pub struct RecordingClient {
    pub records: Mutex<Vec<(AppRef, OperationRecord)>>,
}

impl ServerClient for RecordingClient {
    fn record_operation(&self, app: &AppRef, record: OperationRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .expect("records lock")
            .push((app.clone(), record));
        Ok(())
    }
}

/// Build a project over `temp` with the shared sample configuration.
pub fn project_with(
    temp: &TempDir,
    launcher: Option<Arc<FakeLauncher>>,
    ui: Option<Arc<CountingUI>>,
    client: Option<Arc<RecordingClient>>,
) -> Project {
    let config = ProjectConfig::from_toml_str(PROJECT_TOML).expect("sample config parses");
    let mut builder = ProjectBuilder::new(config, temp.path());

    if let Some(launcher) = launcher {
        for kind in [
            Kind::Mapper,
            Kind::Builder,
            Kind::Registry,
            Kind::Platform,
            Kind::ReleaseManager,
        ] {
            builder = builder.with_launcher(kind, launcher.clone());
        }
    }
    if let Some(ui) = ui {
        builder = builder.with_ui(ui);
    }
    if let Some(client) = client {
        builder = builder.with_client(client);
    }

    builder.build().expect("project builds")
}
