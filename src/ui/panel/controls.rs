//! Server start/stop controls and the failure notice bar.

use crate::app::{AppState, ServerState};
use crate::storage::settings::save_settings;
use crate::system::executable::resolve_server_path;
use dioxus::prelude::*;
use std::process::Command;

pub fn ServerControls() -> Element {
    let app_state = use_context::<AppState>();
    let server_state = app_state.server_state.read().clone();
    let state_start = app_state.clone();
    let state_stop = app_state.clone();
    let state_browser = app_state.clone();

    let start_label = match &server_state {
        ServerState::Starting => "Starting...",
        ServerState::Running => "Running",
        _ => "Start Server",
    };

    rsx! {
        div {
            class: "p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08] flex items-center gap-3",

            button {
                class: "px-4 py-2 rounded-xl bg-[var(--accent-primary)] text-white text-sm font-medium disabled:opacity-40",
                disabled: !server_state.can_start(),
                onclick: move |_| start_server(state_start.clone()),
                "{start_label}"
            }

            button {
                class: "px-4 py-2 rounded-xl bg-white/[0.05] border border-[var(--border-subtle)] text-sm font-medium disabled:opacity-40",
                disabled: !server_state.is_running(),
                onclick: move |_| {
                    let state = state_stop.clone();
                    spawn(async move {
                        state.server.lock().await.stop().await;
                        let mut server_state = state.server_state;
                        server_state.set(ServerState::Stopped);
                        tracing::info!("server stopped by user");
                    });
                },
                "Stop Server"
            }

            button {
                class: "px-4 py-2 rounded-xl bg-white/[0.05] border border-[var(--border-subtle)] text-sm font-medium disabled:opacity-40",
                disabled: !server_state.is_running(),
                onclick: move |_| {
                    let params = state_browser.params.read();
                    open_in_browser(&params.host, params.port);
                },
                "Open in Browser"
            }

            if let ServerState::Failed(ref message) = server_state {
                span { class: "text-xs text-[var(--error-color)] truncate", "{message}" }
            }
        }
    }
}

/// Blocking notice for collaborator failures. Dismissing it returns the
/// panel to a normal, re-triggerable state.
pub fn Notice() -> Element {
    let app_state = use_context::<AppState>();
    let notice = app_state.notice.read().clone();
    let mut state_dismiss = app_state.clone();

    rsx! {
        if let Some(message) = notice {
            div {
                class: "mx-4 mt-3 px-4 py-2.5 rounded-xl border border-[var(--error-color)] bg-[var(--error-color)]/10 flex items-center justify-between",
                span { class: "text-sm text-[var(--error-color)]", "{message}" }
                button {
                    class: "text-xs px-2 py-1 rounded-lg bg-white/[0.05]",
                    onclick: move |_| state_dismiss.notice.set(None),
                    "Dismiss"
                }
            }
        }
    }
}

fn start_server(mut state: AppState) {
    let params = state.params.read().clone();
    if params.model.trim().is_empty() {
        state
            .notice
            .set(Some("Please select or enter a model first.".to_string()));
        return;
    }
    if !state.server_state.read().can_start() {
        return;
    }

    // Remember field history at the moment of launch.
    {
        let mut settings = state.settings.write();
        settings.remember_fields();
        if let Err(error) = save_settings(&settings) {
            tracing::error!("Failed to save settings: {}", error);
        }
    }

    state.server_state.set(ServerState::Starting);
    let args = state.preview.read().launch_args(&params);

    spawn(async move {
        let server_path = resolve_server_path(&params.server_path);
        let started = {
            let mut handle = state.server.lock().await;
            handle.start(&server_path, &args, &params)
        };

        match started {
            Ok(mut rx) => {
                state.console.write().begin_session();
                state.server_state.set(ServerState::Running);

                let mut console = state.console;
                let mut server_state = state.server_state;
                spawn(async move {
                    // Strict FIFO: every line lands in the console in
                    // arrival order until the stream terminates.
                    while let Some(line) = rx.recv().await {
                        console.write().push(line);
                    }
                    tracing::info!("log stream terminated");
                    if server_state.read().is_running() {
                        server_state.set(ServerState::Stopped);
                    }
                });
            }
            Err(e) => {
                tracing::error!("failed to start llama-server: {}", e);
                state.notice.set(Some(format!("Error: {}", e)));
                state.server_state.set(ServerState::Failed(e.to_string()));
            }
        }
    });
}

fn open_in_browser(host: &str, port: u16) {
    let url = format!("http://{}:{}", host, port);
    let result = if cfg!(target_os = "windows") {
        Command::new("explorer").arg(&url).spawn()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(&url).spawn()
    } else {
        Command::new("xdg-open").arg(&url).spawn()
    };

    if let Err(error) = result {
        tracing::error!("Failed to open browser: {}", error);
    }
}
