//! Root Dioxus application component
//!
//! Holds the shared application state and the top-level App component.
//! All state mutation happens on the single UI event context; background
//! tasks only feed lines and results back through signals.

use crate::launch::command::CommandPreview;
use crate::launch::params::LaunchParams;
use crate::logs::stream::LogConsole;
use crate::runtime::CapabilityReport;
use crate::server::ServerHandle;
use crate::storage::settings::{load_settings, AppSettings};
use dioxus::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle of the supervised server process. "Start requested" and
/// "start confirmed" are distinct so the start trigger stays disabled
/// while a request is outstanding.
#[derive(Clone, PartialEq, Debug)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Failed(String),
}

impl ServerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ServerState::Running)
    }

    pub fn can_start(&self) -> bool {
        !matches!(self, ServerState::Starting | ServerState::Running)
    }
}

/// Global application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<Mutex<ServerHandle>>,
    pub settings: Signal<AppSettings>,
    pub params: Signal<LaunchParams>,
    pub preview: Signal<CommandPreview>,
    pub console: Signal<LogConsole>,
    pub report: Signal<Option<CapabilityReport>>,
    pub server_state: Signal<ServerState>,
    pub scanned_models: Signal<Vec<PathBuf>>,
    /// Last collaborator failure, shown as a blocking notice until dismissed.
    pub notice: Signal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        tracing::info!("AppState initialized");
        let settings = load_settings();
        let params = settings.params.clone();
        let preview = CommandPreview::new(&params);

        Self {
            server: Arc::new(Mutex::new(ServerHandle::new())),
            settings: Signal::new(settings),
            params: Signal::new(params),
            preview: Signal::new(preview),
            console: Signal::new(LogConsole::new()),
            report: Signal::new(None),
            server_state: Signal::new(ServerState::Stopped),
            scanned_models: Signal::new(Vec::new()),
            notice: Signal::new(None),
        }
    }

    /// Recompile the command preview from the current parameters and
    /// persist them. Every parameter edit funnels through here.
    pub fn params_changed(&mut self) {
        let params = self.params.read().clone();
        self.preview.write().recompile(&params);

        let mut settings = self.settings.write();
        settings.params = params;
        if let Err(error) = crate::storage::settings::save_settings(&settings) {
            tracing::error!("Failed to save settings: {}", error);
        }
    }

    /// Apply a capability report: store it and move the backend selection
    /// off any option the report disabled.
    pub fn apply_report(&mut self, report: CapabilityReport) {
        let current = self.params.read().backend;
        let reselected = report.reselect(current);
        self.report.set(Some(report));
        if reselected != current {
            tracing::info!(
                "backend selection moved: {} -> {}",
                current.key(),
                reselected.key()
            );
            self.params.write().backend = reselected;
            self.params_changed();
        }
    }
}

#[component]
pub fn App() -> Element {
    let app_state = AppState::new();
    use_context_provider(|| app_state);

    // Probe the runtime once on startup, like hitting Detect by hand.
    {
        let state = use_context::<AppState>();
        use_effect(move || {
            let mut state = state.clone();
            spawn(async move {
                let server_path = {
                    let params = state.params.read();
                    crate::system::executable::resolve_server_path(&params.server_path)
                };
                match crate::runtime::probe(&server_path).await {
                    Ok(report) => state.apply_report(report),
                    Err(e) => tracing::warn!("startup runtime probe failed: {}", e),
                }
            });
        });
    }

    rsx! {
        crate::ui::Layout {}
    }
}
