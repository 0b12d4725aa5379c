//! UI components for LlamaHelm
//!
//! All user interface components, built with Dioxus. Thin glue: state
//! transitions live in the core modules, these components only wire events
//! to them.

pub mod panel;

use crate::app::AppState;
use dioxus::prelude::*;

/// Two-column control panel: configuration on the left, runtime status and
/// the live log console on the right.
pub fn Layout() -> Element {
    let app_state = use_context::<AppState>();
    let theme = app_state.settings.read().theme.clone();
    let mut app_state_theme = app_state.clone();

    rsx! {
        div {
            class: "app-shell min-h-screen flex flex-col",
            "data-theme": "{theme}",

            header {
                class: "flex items-center justify-between px-6 py-3 border-b border-[var(--border-subtle)]",
                h1 { class: "text-lg font-semibold text-[var(--text-primary)]", "LlamaHelm" }
                button {
                    class: "px-3 py-1.5 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                    onclick: move |_| {
                        let mut settings = app_state_theme.settings.write();
                        settings.theme = if settings.theme == "dark" { "light".into() } else { "dark".into() };
                        if let Err(error) = crate::storage::settings::save_settings(&settings) {
                            tracing::error!("Failed to save settings: {}", error);
                        }
                    },
                    if theme == "dark" { "Light mode" } else { "Dark mode" }
                }
            }

            panel::controls::Notice {}

            div {
                class: "flex flex-1 gap-4 p-4 overflow-hidden",

                div {
                    class: "w-[420px] flex flex-col gap-4 overflow-y-auto",
                    panel::models::ModelBrowser {}
                    panel::parameters::ParameterForm {}
                    panel::preview::CommandPreviewPanel {}
                }

                div {
                    class: "flex-1 flex flex-col gap-4 min-w-0",
                    panel::runtime::RuntimePanel {}
                    panel::controls::ServerControls {}
                    panel::logs::LogPanel {}
                }
            }
        }
    }
}
