//! Live log console: per-category filters, clear, and auto-scroll.

use crate::app::AppState;
use crate::logs::classify::LogCategory;
use dioxus::prelude::*;

fn category_class(category: LogCategory) -> &'static str {
    match category {
        LogCategory::Error => "log-line text-[var(--error-color)]",
        LogCategory::Warning => "log-line text-[var(--warn-color)]",
        LogCategory::TokenMetric => "log-line text-[var(--success-color)]",
        LogCategory::System => "log-line text-[var(--info-color)]",
    }
}

pub fn LogPanel() -> Element {
    let app_state = use_context::<AppState>();

    // Follow the tail as lines arrive, while the toggle is on.
    {
        let state = app_state.clone();
        use_effect(move || {
            let count = state.console.read().len();
            let auto = state.settings.read().auto_scroll;
            if auto && count > 0 {
                let _ = dioxus::document::eval(
                    "var el = document.getElementById('log-scroll'); if (el) { el.scrollTop = el.scrollHeight; }",
                );
            }
        });
    }

    let console = app_state.console.read();
    let auto_scroll = app_state.settings.read().auto_scroll;

    let visible: Vec<_> = console.visible_events().cloned().collect();
    let filters: Vec<(LogCategory, bool)> = LogCategory::ALL
        .into_iter()
        .map(|c| (c, console.is_visible(c)))
        .collect();
    drop(console);

    let mut state_clear = app_state.clone();
    let mut state_scroll = app_state.clone();

    rsx! {
        div {
            class: "flex-1 flex flex-col p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08] min-h-0",

            div {
                class: "flex items-center justify-between mb-2",
                h3 { class: "text-sm font-semibold text-[var(--text-primary)]", "Server Logs" }
                div {
                    class: "flex items-center gap-3",

                    for (category, visible_now) in filters {
                        {
                            let mut state_toggle = app_state.clone();
                            rsx! {
                                label {
                                    class: "flex items-center gap-1 text-xs text-[var(--text-secondary)]",
                                    input {
                                        r#type: "checkbox",
                                        checked: visible_now,
                                        onchange: move |e| {
                                            // Applies retroactively: hidden events stay
                                            // buffered and reappear when re-enabled.
                                            state_toggle.console.write().set_visible(category, e.checked());
                                        },
                                    }
                                    "{category.label()}"
                                }
                            }
                        }
                    }

                    label {
                        class: "flex items-center gap-1 text-xs text-[var(--text-secondary)]",
                        input {
                            r#type: "checkbox",
                            checked: auto_scroll,
                            onchange: move |e| {
                                let mut settings = state_scroll.settings.write();
                                settings.auto_scroll = e.checked();
                                if let Err(error) = crate::storage::settings::save_settings(&settings) {
                                    tracing::error!("Failed to save settings: {}", error);
                                }
                            },
                        }
                        "Auto-scroll"
                    }

                    button {
                        class: "px-3 py-1 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs",
                        onclick: move |_| state_clear.console.write().clear(),
                        "Clear"
                    }
                }
            }

            div {
                class: "flex-1 overflow-y-auto rounded-lg bg-black/40 border border-[var(--border-subtle)] p-3 font-mono text-xs",
                id: "log-scroll",
                for event in visible.iter() {
                    span {
                        class: category_class(event.category),
                        "{event.text}\n"
                    }
                }
            }
        }
    }
}
