//! Command preview with the manual-edit escape hatch.
//!
//! The preview text is the exact string a launch will use. Editing
//! snapshots the current command; Apply commits the override, Discard
//! restores the snapshot, and any parameter change supersedes an override.

use crate::app::AppState;
use dioxus::prelude::*;

pub fn CommandPreviewPanel() -> Element {
    let app_state = use_context::<AppState>();
    let preview_text = app_state.preview.read().text().to_string();
    let overridden = app_state.preview.read().is_overridden();

    let editing = use_signal(|| false);
    let draft = use_signal(String::new);

    let mut state_edit = app_state.clone();
    let mut editing_edit = editing.clone();
    let mut draft_edit = draft.clone();

    let mut state_apply = app_state.clone();
    let mut editing_apply = editing.clone();
    let draft_apply = draft.clone();

    let mut state_discard = app_state.clone();
    let mut editing_discard = editing.clone();

    let mut draft_input = draft.clone();

    rsx! {
        div {
            class: "p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08]",

            div {
                class: "flex items-center justify-between mb-2",
                h3 { class: "text-sm font-semibold text-[var(--text-primary)]", "Launch Command" }
                div {
                    class: "flex items-center gap-2",
                    if overridden {
                        span { class: "text-[10px] uppercase tracking-wide px-2 py-0.5 rounded bg-[var(--warn-color)]/15 text-[var(--warn-color)]", "edited" }
                    }
                    if !editing() {
                        button {
                            class: "px-3 py-1 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs",
                            onclick: move |_| {
                                let text = state_edit.preview.write().enter_edit();
                                draft_edit.set(text);
                                editing_edit.set(true);
                            },
                            "Edit"
                        }
                    } else {
                        button {
                            class: "px-3 py-1 rounded-lg bg-[var(--accent-primary)] text-white text-xs",
                            onclick: move |_| {
                                state_apply.preview.write().apply(draft_apply());
                                editing_apply.set(false);
                            },
                            "Apply Changes"
                        }
                        button {
                            class: "px-3 py-1 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs",
                            onclick: move |_| {
                                state_discard.preview.write().discard();
                                editing_discard.set(false);
                            },
                            "Discard"
                        }
                    }
                }
            }

            if editing() {
                textarea {
                    class: "w-full h-28 p-3 rounded-lg bg-black/40 border border-[var(--border-subtle)] font-mono text-xs resize-y",
                    value: "{draft}",
                    oninput: move |e| draft_input.set(e.value()),
                }
            } else {
                pre {
                    class: "w-full p-3 rounded-lg bg-black/40 border border-[var(--border-subtle)] font-mono text-xs whitespace-pre-wrap break-all",
                    "{preview_text}"
                }
            }
        }
    }
}
