//! Runtime detection panel: probe trigger, detected runtime list, backend
//! selector gated by availability, and the active-backend indicator.

use crate::app::AppState;
use crate::launch::params::Backend;
use crate::runtime::RuntimeStatus;
use crate::system::executable::resolve_server_path;
use dioxus::prelude::*;

pub fn RuntimePanel() -> Element {
    let app_state = use_context::<AppState>();
    let report = app_state.report.read().clone();
    let active_backend = app_state.console.read().active_backend();
    let selected = app_state.params.read().backend;
    let probing = use_signal(|| false);

    let state_detect = app_state.clone();
    let mut probing_detect = probing.clone();
    let mut state_select = app_state.clone();

    rsx! {
        div {
            class: "p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08]",

            div {
                class: "flex items-center justify-between mb-3",
                h3 { class: "text-sm font-semibold text-[var(--text-primary)]", "Runtime" }
                button {
                    class: "px-3 py-1.5 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs disabled:opacity-40",
                    disabled: probing(),
                    onclick: move |_| {
                        let mut state = state_detect.clone();
                        let mut probing = probing_detect.clone();
                        probing.set(true);
                        spawn(async move {
                            let server_path = {
                                let params = state.params.read();
                                resolve_server_path(&params.server_path)
                            };
                            match crate::runtime::probe(&server_path).await {
                                Ok(report) => state.apply_report(report),
                                Err(e) => state.notice.set(Some(e.to_string())),
                            }
                            probing.set(false);
                        });
                    },
                    if probing() { "Detecting..." } else { "Detect Runtime" }
                }
            }

            // The backend seen in the log stream outranks the static probe.
            if let Some(name) = active_backend {
                div {
                    class: "mb-2 px-3 py-2 rounded-lg border border-[var(--success-color)] text-[var(--success-color)] text-xs",
                    strong { "Active Backend: " }
                    "{name}"
                }
            }

            div {
                class: "flex flex-wrap gap-2 mb-4",
                if let Some(ref report) = report {
                    for runtime in report.runtimes.iter() {
                        div {
                            class: match runtime.status {
                                RuntimeStatus::Ok => "px-3 py-1.5 rounded-lg text-xs border border-[var(--success-color)] text-[var(--success-color)]",
                                RuntimeStatus::Warning => "px-3 py-1.5 rounded-lg text-xs border border-[var(--warn-color)] text-[var(--warn-color)]",
                                RuntimeStatus::Error => "px-3 py-1.5 rounded-lg text-xs border border-[var(--error-color)] text-[var(--error-color)]",
                            },
                            title: "{runtime.tooltip}",
                            "{runtime.name}"
                        }
                    }
                } else {
                    div { class: "text-xs text-[var(--text-tertiary)]", "Not detected yet" }
                }
            }

            div {
                label { class: "text-xs font-medium text-[var(--text-primary)] block mb-1", "Acceleration Backend" }
                select {
                    class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                    value: "{selected.key()}",
                    onchange: move |e| {
                        state_select.params.write().backend = Backend::from_key(&e.value());
                        state_select.params_changed();
                    },
                    for backend in Backend::ALL {
                        {
                            let (disabled, label) = match report.as_ref() {
                                Some(report) => match report.unavailable_reason(backend) {
                                    Some(reason) => (true, format!("{} ({})", backend.label(), reason)),
                                    None => (false, backend.label().to_string()),
                                },
                                None => (false, backend.label().to_string()),
                            };
                            rsx! {
                                option {
                                    value: "{backend.key()}",
                                    disabled: disabled,
                                    selected: backend == selected,
                                    "{label}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
