//! Launch parameter form.
//!
//! Every control writes through `AppState::params_changed`, so the command
//! preview recompiles and the configuration persists on each edit.
//! Malformed numeric input falls back to the field's documented default.

use crate::app::AppState;
use crate::launch::params::{defaults, field_or, CacheType, SplitMode};
use dioxus::prelude::*;

pub fn ParameterForm() -> Element {
    let app_state = use_context::<AppState>();
    let params = app_state.params.read().clone();

    // Remembered values feed the input datalists, newest first.
    let history = app_state.settings.read().history.clone();
    let threads_history = history.suggestions("threads", "8");
    let gpu_layers_history = history.suggestions("gpu_layers", "50");
    let ctx_history = history.suggestions("ctx_size", "4096");
    let port_history = history.suggestions("port", "8080");
    let host_history = history.suggestions("host", "127.0.0.1");

    let mut st_threads = app_state.clone();
    let mut st_gpu_layers = app_state.clone();
    let mut st_port = app_state.clone();
    let mut st_host = app_state.clone();
    let mut st_ctx = app_state.clone();
    let mut st_batch = app_state.clone();
    let mut st_parallel = app_state.clone();
    let mut st_split = app_state.clone();
    let mut st_no_mmap = app_state.clone();
    let mut st_mlock = app_state.clone();
    let mut st_flash = app_state.clone();
    let mut st_jinja = app_state.clone();
    let mut st_temp = app_state.clone();
    let mut st_top_k = app_state.clone();
    let mut st_top_p = app_state.clone();
    let mut st_min_p = app_state.clone();
    let mut st_repeat = app_state.clone();
    let mut st_rope_base = app_state.clone();
    let mut st_rope_scale = app_state.clone();
    let mut st_cache_k = app_state.clone();
    let mut st_cache_v = app_state.clone();

    rsx! {
        div {
            class: "p-4 rounded-2xl bg-white/[0.03] border border-white/[0.08] space-y-4",

            h3 { class: "text-sm font-semibold text-[var(--text-primary)]", "Parameters" }

            datalist { id: "threads-history",
                for value in threads_history.iter() {
                    option { value: "{value}" }
                }
            }
            datalist { id: "gpu-layers-history",
                for value in gpu_layers_history.iter() {
                    option { value: "{value}" }
                }
            }
            datalist { id: "ctx-size-history",
                for value in ctx_history.iter() {
                    option { value: "{value}" }
                }
            }
            datalist { id: "port-history",
                for value in port_history.iter() {
                    option { value: "{value}" }
                }
            }
            datalist { id: "host-history",
                for value in host_history.iter() {
                    option { value: "{value}" }
                }
            }

            div {
                class: "grid grid-cols-2 gap-3",

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Threads" }
                    input {
                        r#type: "number",
                        min: "1",
                        value: "{params.threads}",
                        list: "threads-history",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_threads.params.write().threads = field_or(&e.value(), defaults::THREADS);
                            st_threads.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "GPU Layers" }
                    input {
                        r#type: "number",
                        min: "0",
                        value: "{params.gpu_layers}",
                        list: "gpu-layers-history",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_gpu_layers.params.write().gpu_layers = field_or(&e.value(), defaults::GPU_LAYERS);
                            st_gpu_layers.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Port" }
                    input {
                        r#type: "number",
                        min: "1",
                        max: "65535",
                        value: "{params.port}",
                        list: "port-history",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_port.params.write().port = field_or(&e.value(), defaults::PORT);
                            st_port.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Host" }
                    input {
                        r#type: "text",
                        value: "{params.host}",
                        list: "host-history",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            let value = e.value();
                            st_host.params.write().host = if value.trim().is_empty() {
                                defaults::HOST.to_string()
                            } else {
                                value
                            };
                            st_host.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Context Size" }
                    input {
                        r#type: "number",
                        min: "1",
                        value: "{params.ctx_size}",
                        list: "ctx-size-history",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_ctx.params.write().ctx_size = field_or(&e.value(), defaults::CTX_SIZE);
                            st_ctx.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Batch Size" }
                    input {
                        r#type: "number",
                        min: "1",
                        value: "{params.batch_size}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_batch.params.write().batch_size = field_or(&e.value(), defaults::BATCH_SIZE);
                            st_batch.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Parallel Slots" }
                    input {
                        r#type: "number",
                        min: "1",
                        value: "{params.parallel}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_parallel.params.write().parallel = field_or(&e.value(), defaults::PARALLEL);
                            st_parallel.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Split Mode" }
                    select {
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        value: "{params.split_mode.as_arg()}",
                        onchange: move |e| {
                            st_split.params.write().split_mode = SplitMode::from_key(&e.value());
                            st_split.params_changed();
                        },
                        option { value: "layer", "Layer" }
                        option { value: "row", "Row" }
                        option { value: "none", "None" }
                    }
                }
            }

            div {
                class: "grid grid-cols-2 gap-2",

                label {
                    class: "flex items-center gap-2 text-xs text-[var(--text-secondary)]",
                    input {
                        r#type: "checkbox",
                        checked: params.no_mmap,
                        onchange: move |e| {
                            st_no_mmap.params.write().no_mmap = e.checked();
                            st_no_mmap.params_changed();
                        },
                    }
                    "Disable mmap"
                }
                label {
                    class: "flex items-center gap-2 text-xs text-[var(--text-secondary)]",
                    input {
                        r#type: "checkbox",
                        checked: params.mlock,
                        onchange: move |e| {
                            st_mlock.params.write().mlock = e.checked();
                            st_mlock.params_changed();
                        },
                    }
                    "Lock in memory"
                }
                label {
                    class: "flex items-center gap-2 text-xs text-[var(--text-secondary)]",
                    input {
                        r#type: "checkbox",
                        checked: params.flash_attn,
                        onchange: move |e| {
                            st_flash.params.write().flash_attn = e.checked();
                            st_flash.params_changed();
                        },
                    }
                    "Flash attention"
                }
                label {
                    class: "flex items-center gap-2 text-xs text-[var(--text-secondary)]",
                    input {
                        r#type: "checkbox",
                        checked: params.jinja,
                        onchange: move |e| {
                            st_jinja.params.write().jinja = e.checked();
                            st_jinja.params_changed();
                        },
                    }
                    "Jinja templates"
                }
            }

            h4 { class: "text-xs font-semibold text-[var(--text-primary)] pt-1", "Sampling" }
            div {
                class: "grid grid-cols-2 gap-3",

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Temperature" }
                    input {
                        r#type: "number",
                        step: "0.05",
                        value: "{params.temp}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_temp.params.write().temp = field_or(&e.value(), defaults::TEMP);
                            st_temp.params_changed();
                        },
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Top K" }
                    input {
                        r#type: "number",
                        min: "0",
                        value: "{params.top_k}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_top_k.params.write().top_k = field_or(&e.value(), defaults::TOP_K);
                            st_top_k.params_changed();
                        },
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Top P" }
                    input {
                        r#type: "number",
                        step: "0.05",
                        value: "{params.top_p}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_top_p.params.write().top_p = field_or(&e.value(), defaults::TOP_P);
                            st_top_p.params_changed();
                        },
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Min P" }
                    input {
                        r#type: "number",
                        step: "0.01",
                        value: "{params.min_p}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_min_p.params.write().min_p = field_or(&e.value(), defaults::MIN_P);
                            st_min_p.params_changed();
                        },
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "Repeat Penalty" }
                    input {
                        r#type: "number",
                        step: "0.05",
                        value: "{params.repeat_penalty}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_repeat.params.write().repeat_penalty = field_or(&e.value(), defaults::REPEAT_PENALTY);
                            st_repeat.params_changed();
                        },
                    }
                }
            }

            h4 { class: "text-xs font-semibold text-[var(--text-primary)] pt-1", "RoPE / KV Cache" }
            div {
                class: "grid grid-cols-2 gap-3",

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "RoPE Freq Base (0 = auto)" }
                    input {
                        r#type: "number",
                        min: "0",
                        value: "{params.rope_freq_base}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_rope_base.params.write().rope_freq_base = field_or(&e.value(), defaults::ROPE_FREQ_BASE);
                            st_rope_base.params_changed();
                        },
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "RoPE Freq Scale (0 = auto)" }
                    input {
                        r#type: "number",
                        min: "0",
                        step: "0.05",
                        value: "{params.rope_freq_scale}",
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        oninput: move |e| {
                            st_rope_scale.params.write().rope_freq_scale = field_or(&e.value(), defaults::ROPE_FREQ_SCALE);
                            st_rope_scale.params_changed();
                        },
                    }
                }

                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "KV Cache Type (K)" }
                    select {
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        value: "{params.cache_type_k.as_arg()}",
                        onchange: move |e| {
                            st_cache_k.params.write().cache_type_k = CacheType::from_key(&e.value());
                            st_cache_k.params_changed();
                        },
                        for cache_type in CacheType::ALL {
                            option { value: "{cache_type.as_arg()}", "{cache_type.as_arg()}" }
                        }
                    }
                }
                div {
                    label { class: "text-xs text-[var(--text-secondary)] block mb-1", "KV Cache Type (V)" }
                    select {
                        class: "w-full p-2 rounded-lg bg-white/[0.05] border border-[var(--border-subtle)] text-sm",
                        value: "{params.cache_type_v.as_arg()}",
                        onchange: move |e| {
                            st_cache_v.params.write().cache_type_v = CacheType::from_key(&e.value());
                            st_cache_v.params_changed();
                        },
                        for cache_type in CacheType::ALL {
                            option { value: "{cache_type.as_arg()}", "{cache_type.as_arg()}" }
                        }
                    }
                }
            }
        }
    }
}
