//! Model selection: directory scanning, the model reference input, the
//! server executable path, deletion, and HuggingFace downloads.

use crate::app::AppState;
use crate::storage::huggingface::{download_model, HubModelRef};
use crate::storage::models::{delete_model, display_name, scan_models};
use dioxus::prelude::*;
use std::path::{Path, PathBuf};

pub fn ModelBrowser() -> Element {
    let app_state = use_context::<AppState>();
    let params = app_state.params.read().clone();
    let scanned = app_state.scanned_models.read().clone();
    let selected_model = params.model.clone();
    let server_path_history = app_state
        .settings
        .read()
        .history
        .suggestions("server_path", "");

    let scanning = use_signal(|| false);
    let download_ref = use_signal(String::new);
    let download_progress = use_signal(|| None::<(u64, u64)>);

    let mut st_model = app_state.clone();
    let mut st_server_path = app_state.clone();
    let mut st_scan_path = app_state.clone();
    let st_browse_dir = app_state.clone();
    let st_browse_file = app_state.clone();
    let st_scan = app_state.clone();
    let scanning_scan = scanning.clone();
    let mut st_select = app_state.clone();
    let st_delete = app_state.clone();
    let st_download = app_state.clone();
    let mut download_ref_input = download_ref.clone();
    let download_ref_btn = download_ref.clone();
    let download_progress_btn = download_progress.clone();

    rsx! {
        div {
            class: "p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08] space-y-3",

            h3 { class: "text-sm font-semibold text-[var(--text-primary)]", "Model" }

            datalist { id: "server-path-history",
                for value in server_path_history.iter() {
                    option { value: "{value}" }
                }
            }

            div {
                label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Server Executable" }
                div {
                    class: "flex gap-2",
                    input {
                        r#type: "text",
                        value: "{params.server_path}",
                        placeholder: "auto-detect llama-server",
                        list: "server-path-history",
                        class: "flex-1 p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_server_path.params.write().server_path = e.value();
                            st_server_path.params_changed();
                        },
                    }
                    button {
                        class: "px-3 py-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs",
                        onclick: move |_| {
                            let mut state = st_browse_file.clone();
                            spawn(async move {
                                if let Some(file) = rfd::AsyncFileDialog::new()
                                    .set_title("Select llama-server executable")
                                    .pick_file()
                                    .await
                                {
                                    state.params.write().server_path =
                                        file.path().to_string_lossy().to_string();
                                    state.params_changed();
                                }
                            });
                        },
                        "Browse"
                    }
                }
            }

            div {
                label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Model Directory" }
                div {
                    class: "flex gap-2",
                    input {
                        r#type: "text",
                        value: "{params.cache_path}",
                        placeholder: "directory to scan for .gguf files",
                        class: "flex-1 p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_scan_path.params.write().cache_path = e.value();
                            st_scan_path.params_changed();
                        },
                    }
                    button {
                        class: "px-3 py-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs",
                        onclick: move |_| {
                            let mut state = st_browse_dir.clone();
                            spawn(async move {
                                if let Some(folder) = rfd::AsyncFileDialog::new()
                                    .set_title("Select Model Directory")
                                    .pick_folder()
                                    .await
                                {
                                    state.params.write().cache_path =
                                        folder.path().to_string_lossy().to_string();
                                    state.params_changed();
                                }
                            });
                        },
                        "Browse"
                    }
                    button {
                        class: "px-3 py-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs disabled:opacity-40",
                        disabled: scanning(),
                        onclick: move |_| {
                            let mut state = st_scan.clone();
                            let mut scanning = scanning_scan.clone();
                            scanning.set(true);
                            spawn(async move {
                                let dir = state.params.read().cache_path.clone();
                                let result = tokio::task::spawn_blocking(move || scan_models(&dir)).await;
                                match result {
                                    Ok(Ok(models)) => state.scanned_models.set(models),
                                    Ok(Err(e)) => state.notice.set(Some(format!("Scan failed: {}", e))),
                                    Err(e) => state.notice.set(Some(format!("Scan failed: {}", e))),
                                }
                                scanning.set(false);
                            });
                        },
                        if scanning() { "Scanning..." } else { "Scan" }
                    }
                }
            }

            if !scanned.is_empty() {
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Scanned Models" }
                    select {
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        onchange: move |e| {
                            if !e.value().is_empty() {
                                st_select.params.write().model = e.value();
                                st_select.params_changed();
                            }
                        },
                        option { value: "", "Select Scanned Model" }
                        for model in scanned.iter() {
                            option {
                                value: "{model.display()}",
                                selected: model.to_string_lossy() == selected_model,
                                "{display_name(model)}"
                            }
                        }
                    }
                }
            }

            div {
                label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Model Reference" }
                div {
                    class: "flex gap-2",
                    input {
                        r#type: "text",
                        value: "{params.model}",
                        placeholder: "path to .gguf, or -hf user/repo",
                        class: "flex-1 p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_model.params.write().model = e.value();
                            st_model.params_changed();
                        },
                    }
                    button {
                        class: "px-3 py-2 rounded-lg bg-white/[0.05] border border-[var(--error-color)] text-[var(--error-color)] text-xs disabled:opacity-40",
                        disabled: !Path::new(&params.model).is_file(),
                        onclick: move |_| {
                            let state = st_delete.clone();
                            let path = PathBuf::from(state.params.read().model.clone());
                            spawn(async move {
                                delete_scanned_model(state, path).await;
                            });
                        },
                        "Delete"
                    }
                }
            }

            div {
                label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Download from HuggingFace" }
                div {
                    class: "flex gap-2",
                    input {
                        r#type: "text",
                        value: "{download_ref}",
                        placeholder: "user/repo/model.gguf",
                        class: "flex-1 p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| download_ref_input.set(e.value()),
                    }
                    button {
                        class: "px-3 py-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-xs disabled:opacity-40",
                        disabled: download_progress_btn.read().is_some(),
                        onclick: move |_| {
                            let mut state = st_download.clone();
                            let reference = download_ref_btn();
                            let mut progress = download_progress_btn.clone();
                            spawn(async move {
                                let parsed = match HubModelRef::parse(&reference) {
                                    Ok(parsed) => parsed,
                                    Err(e) => {
                                        state.notice.set(Some(format!("Error: {}", e)));
                                        return;
                                    }
                                };
                                let dest = state.params.read().cache_path.clone();
                                let dest = if dest.trim().is_empty() { ".".to_string() } else { dest };
                                progress.set(Some((0, 0)));

                                let mut progress_cb = progress.clone();
                                let result = download_model(&parsed, Path::new(&dest), move |done, total| {
                                    progress_cb.set(Some((done, total)));
                                })
                                .await;
                                progress.set(None);

                                match result {
                                    Ok(path) => {
                                        state.params.write().model = path.to_string_lossy().to_string();
                                        state.params_changed();
                                    }
                                    Err(e) => state.notice.set(Some(format!("Download failed: {}", e))),
                                }
                            });
                        },
                        "Download"
                    }
                }
                if let Some((done, total)) = *download_progress.read() {
                    {
                        let done_mb = done / 1024 / 1024;
                        let total_mb = total / 1024 / 1024;
                        rsx! {
                            p {
                                class: "text-xs text-[var(--text-tertiary)] mt-1",
                                if total > 0 {
                                    "Downloading... {done_mb} / {total_mb} MB"
                                } else {
                                    "Starting download..."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Confirm, delete, and rescan. The confirmation is a native dialog; a
/// missing file surfaces as a collaborator error.
async fn delete_scanned_model(mut state: AppState, path: PathBuf) {
    let name = display_name(&path);
    let confirmed = rfd::AsyncMessageDialog::new()
        .set_title("Delete model")
        .set_description(format!(
            "Are you sure you want to delete \"{}\"?\nThis cannot be undone.",
            name
        ))
        .set_buttons(rfd::MessageButtons::OkCancel)
        .show()
        .await;

    if confirmed != rfd::MessageDialogResult::Ok {
        return;
    }

    if let Err(e) = delete_model(&path) {
        state.notice.set(Some(format!("Error: {}", e)));
        return;
    }

    state.params.write().model = String::new();
    state.params_changed();

    let dir = state.params.read().cache_path.clone();
    match tokio::task::spawn_blocking(move || scan_models(&dir)).await {
        Ok(Ok(models)) => state.scanned_models.set(models),
        Ok(Err(e)) => tracing::warn!("rescan after delete failed: {}", e),
        Err(e) => tracing::warn!("rescan after delete failed: {}", e),
    }
}
