//! App: the aggregate root for one application.
//!
//! An App owns its configuration, its identity within the project, its
//! private data directory, the converter chain, and the lifecycle of every
//! plugin process started on its behalf. All plugin operations are invoked
//! through [`App::invoke`], which resolves the operation's declared inputs
//! from ambient values and the chain before dispatching.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use convoy_sdk::component::{ComponentInfo, JobInfo, Kind, LabelSet, Source};
use convoy_sdk::context::OpContext;
use convoy_sdk::datadir::{AppDir, ComponentDir};
use convoy_sdk::dynfunc::{
    ArgPool, DynFunc, DynValue, IntoDynFunc, ResolutionError, ResolveFailure, resolve_args,
};
use convoy_sdk::terminal::UiHandle;

use crate::config::{AppConfig, Hook};
use crate::labels;
use crate::plugin::{Launcher, PluginError, ShutdownHandle};
use crate::project::Project;
use crate::server::{AppRef, ServerClient, WorkspaceRef};

/// Errors building an App or loading one of its components.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("project has no application named '{0}'")]
    UnknownApp(String),

    #[error("failed to prepare data directory for application '{app}'")]
    Directory {
        app: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to start {kind} plugin '{name}' for application '{app}'")]
    Plugin {
        app: String,
        kind: Kind,
        name: String,
        #[source]
        source: PluginError,
    },

    #[error("no launcher is registered for {0} plugins")]
    NoLauncher(Kind),

    #[error("mapper plugins are loaded during App construction and cannot be loaded on demand")]
    LateMapper,
}

/// Errors from dynamic invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The invocation's declared inputs could not be satisfied. Structural;
    /// never retried.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The invoked function itself failed. Propagated unchanged.
    #[error(transparent)]
    Call(anyhow::Error),

    /// The produced result does not satisfy the capability the caller
    /// required.
    #[error("operation expected a result with capability {expected}, got {actual}")]
    CapabilityMismatch { expected: Kind, actual: &'static str },

    #[error("operation cancelled")]
    Cancelled,
}

/// Local bookkeeping for one loaded plugin instance.
#[derive(Debug)]
pub struct ComponentRecord {
    info: ComponentInfo,
    dir: ComponentDir,
    /// Labels resolved for this component; not yet merged with ancestor
    /// scopes. [`App::merge_labels`] produces the effective set.
    labels: HashMap<String, String>,
    /// Hooks keyed by their `when` phase.
    hooks: HashMap<String, Vec<Hook>>,
}

impl ComponentRecord {
    pub fn new(
        info: ComponentInfo,
        dir: ComponentDir,
        labels: HashMap<String, String>,
        hooks: HashMap<String, Vec<Hook>>,
    ) -> Self {
        Self {
            info,
            dir,
            labels,
            hooks,
        }
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    pub fn dir(&self) -> &ComponentDir {
        &self.dir
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    pub fn hooks_for(&self, when: &str) -> &[Hook] {
        self.hooks.get(when).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A component started through [`App::load_component`]: its record plus the
/// operations the plugin exposes.
pub struct LoadedComponent {
    pub record: Arc<ComponentRecord>,
    pub operations: HashMap<String, DynFunc>,
}

impl std::fmt::Debug for LoadedComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedComponent")
            .field("record", &self.record)
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One application within a project.
///
/// An App is only valid if it was returned by [`Project::app`]; it cannot be
/// constructed any other way.
pub struct App {
    ui: UiHandle,
    config: AppConfig,
    ref_: AppRef,
    workspace: WorkspaceRef,
    client: Arc<dyn ServerClient>,
    source: Source,
    job_info: JobInfo,
    project_labels: HashMap<String, String>,
    launchers: HashMap<Kind, Arc<dyn Launcher>>,
    dir: AppDir,
    mappers: Vec<DynFunc>,
    closers: Mutex<Vec<ShutdownHandle>>,
    components: Mutex<Vec<Arc<ComponentRecord>>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl App {
    pub(crate) fn new(project: &Project, config: AppConfig) -> Result<Self, ConstructionError> {
        let name = config.name.clone();
        tracing::debug!(app = %name, "initializing application");

        let mut path = project.root().to_path_buf();
        if let Some(rel) = &config.path {
            path = path.join(rel);
        }
        let source = Source {
            app: name.clone(),
            path: normalize(&path),
        };

        let dir = project
            .dir()
            .app(&name)
            .map_err(|source| ConstructionError::Directory {
                app: name.clone(),
                source,
            })?;

        let mut app = App {
            ui: project.ui(),
            ref_: AppRef {
                project: project.name().to_string(),
                application: name,
            },
            workspace: project.workspace_ref().clone(),
            client: project.client(),
            source,
            job_info: project.job_info().clone(),
            project_labels: project.labels().clone(),
            launchers: project.launchers().clone(),
            dir,
            // App-scoped converters append to a copy; the project chain is
            // shared by every other app in the session.
            mappers: project.mappers().to_vec(),
            closers: Mutex::new(Vec::new()),
            components: Mutex::new(Vec::new()),
            config,
        };

        if let Some(launcher) = app.launchers.get(&Kind::Mapper).cloned() {
            app.init_mappers(launcher.as_ref())?;
        }

        Ok(app)
    }

    /// Load every registered mapper plugin, appending its converters to the
    /// chain. A single failure aborts construction; plugins already started
    /// by this attempt are closed before the error surfaces.
    fn init_mappers(&mut self, launcher: &dyn Launcher) -> Result<(), ConstructionError> {
        for name in launcher.registered(Kind::Mapper) {
            tracing::debug!(app = %self.ref_.application, plugin = %name, "loading mapper plugin");

            let started = match launcher.start(Kind::Mapper, &name) {
                Ok(started) => started,
                Err(source) => {
                    let _ = self.close();
                    return Err(ConstructionError::Plugin {
                        app: self.ref_.application.clone(),
                        kind: Kind::Mapper,
                        name,
                        source,
                    });
                }
            };

            self.mappers.extend(started.converters);
            self.closers
                .lock()
                .expect("closers lock")
                .push(started.shutdown);
        }
        Ok(())
    }

    /// The stable reference to this application for use in server calls.
    pub fn app_ref(&self) -> &AppRef {
        &self.ref_
    }

    pub fn workspace_ref(&self) -> &WorkspaceRef {
        &self.workspace
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dir(&self) -> &AppDir {
        &self.dir
    }

    pub fn ui(&self) -> UiHandle {
        self.ui.clone()
    }

    /// Client handle for recording operation results against
    /// [`App::app_ref`].
    pub fn client(&self) -> Arc<dyn ServerClient> {
        self.client.clone()
    }

    /// Records of every component currently loaded for this App.
    pub fn components(&self) -> Vec<Arc<ComponentRecord>> {
        self.components.lock().expect("components lock").clone()
    }

    /// Merge label sets with this app's labels above the project's and below
    /// `sets`. See [`labels::merge`].
    pub fn merge_labels(&self, sets: &[&HashMap<String, String>]) -> HashMap<String, String> {
        let mut layered: Vec<&HashMap<String, String>> = vec![&self.config.labels];
        layered.extend_from_slice(sets);
        labels::merge(&self.project_labels, &layered)
    }

    /// Start one plugin component of `kind` and register it with this App;
    /// its process is released at App teardown.
    pub fn load_component(
        &self,
        kind: Kind,
        name: &str,
    ) -> Result<LoadedComponent, ConstructionError> {
        if kind == Kind::Mapper {
            return Err(ConstructionError::LateMapper);
        }
        let launcher = self
            .launchers
            .get(&kind)
            .ok_or(ConstructionError::NoLauncher(kind))?;

        tracing::debug!(app = %self.ref_.application, %kind, plugin = %name, "loading plugin");
        let started =
            launcher
                .start(kind, name)
                .map_err(|source| ConstructionError::Plugin {
                    app: self.ref_.application.clone(),
                    kind,
                    name: name.to_string(),
                    source,
                })?;

        let dir = self
            .dir
            .component(kind, name)
            .map_err(|source| ConstructionError::Directory {
                app: self.ref_.application.clone(),
                source,
            })?;

        let record = Arc::new(ComponentRecord::new(
            started.info,
            dir,
            started.labels,
            self.config.hooks_by_when(),
        ));

        self.closers
            .lock()
            .expect("closers lock")
            .push(started.shutdown);
        self.components
            .lock()
            .expect("components lock")
            .push(record.clone());

        Ok(LoadedComponent {
            record,
            operations: started.operations,
        })
    }

    /// Invoke a plugin- or converter-declared function.
    ///
    /// The function's declared inputs are resolved from, in this order:
    /// ambient values this App always supplies (the operation context, the
    /// invocation span, [`Source`], [`JobInfo`], [`AppDir`], the UI handle),
    /// the merged [`LabelSet`] of `component`, derivations through the
    /// converter chain, and `extras`, which replace direct values of the
    /// same type. The function is called exactly once, synchronously.
    ///
    /// With `expected` set, the produced result must carry that capability
    /// in the function's declared set or the call fails with
    /// [`InvokeError::CapabilityMismatch`]; with `None` the raw value is
    /// returned unvalidated. The status resource opened against the UI is
    /// released on every exit path.
    pub fn invoke<Args>(
        &self,
        ctx: &OpContext,
        expected: Option<Kind>,
        component: &ComponentRecord,
        func: impl IntoDynFunc<Args>,
        extras: ArgPool,
    ) -> Result<DynValue, InvokeError> {
        let func = func.into_dyn_func();
        let span = tracing::debug_span!(
            "invoke",
            app = %self.ref_.application,
            func = %func.name()
        );
        let _entered = span.enter();

        // Held for the duration of the call so the status is released on
        // every exit path below, including the early returns.
        let _status = self.ui.status();

        if ctx.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }

        let mut args = ArgPool::new();
        args.insert(ctx.clone());
        args.insert(span.clone());
        args.insert(self.source.clone());
        args.insert(self.job_info.clone());
        args.insert(self.dir.clone());
        args.insert(self.ui.clone());
        args.insert(LabelSet::new(self.merge_labels(&[component.labels()])));
        args.merge(extras);

        match resolve_args(&func, &mut args, &self.mappers) {
            Ok(()) => {}
            Err(ResolveFailure::Unresolvable(err)) => return Err(InvokeError::Resolution(err)),
            Err(ResolveFailure::Converter(err)) => return Err(InvokeError::Call(err)),
        }

        if ctx.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }

        let raw = func.call_with(&args).map_err(InvokeError::Call)?;

        let Some(expected) = expected else {
            return Ok(raw);
        };
        if func.capabilities().contains(&expected) {
            Ok(raw)
        } else {
            Err(InvokeError::CapabilityMismatch {
                expected,
                actual: raw.type_name(),
            })
        }
    }

    /// Release every resource associated with started plugins.
    ///
    /// Each shutdown handle is invoked exactly once; a second `close` is a
    /// no-op. Individual handle failures are logged at warning level and not
    /// surfaced, so this always returns success.
    pub fn close(&self) -> anyhow::Result<()> {
        let handles: Vec<ShutdownHandle> =
            std::mem::take(&mut *self.closers.lock().expect("closers lock"));
        for mut handle in handles {
            if let Err(err) = handle.close() {
                tracing::warn!(
                    app = %self.ref_.application,
                    error = %err,
                    "plugin shutdown failed"
                );
            }
        }
        self.components.lock().expect("components lock").clear();
        Ok(())
    }
}

/// Lexically normalize a path, removing `.` and resolving `..` segments.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
