//! Command compiler
//!
//! Pure translation from [`LaunchParams`] to a llama-server invocation.
//! `compile` produces the display string, `compile_args` the argv form the
//! process manager actually spawns. Both are total: every input produces a
//! command, never an error.

use crate::launch::params::{Backend, LaunchParams};

/// Environment variable binding the model cache/scan directory.
pub const CACHE_ENV_VAR: &str = "LLAMA_CACHE";

/// Executable token emitted in the display command.
pub const SERVER_TOKEN: &str = "llama-server";

/// True when the model field is a pre-formatted invocation fragment rather
/// than a bare filesystem path. Markers are matched as whole tokens so a
/// filename like `qwen2-math.gguf` is not mistaken for a `-m` fragment.
fn is_fragment(model: &str) -> bool {
    model
        .split_whitespace()
        .any(|token| token == "-hf" || token == "-m")
}

/// Strip one redundant leading `llama-server ` token from a fragment.
/// At most one strip, never more.
fn strip_invocation(model: &str) -> &str {
    model
        .strip_prefix("llama-server ")
        .unwrap_or(model)
        .trim_start()
}

/// GPU layer count as emitted: CPU-only execution never claims GPU layers.
fn effective_gpu_layers(params: &LaunchParams) -> u32 {
    if params.backend == Backend::Cpu {
        0
    } else {
        params.gpu_layers
    }
}

/// Compile the launch parameters into the display command string.
///
/// Deterministic and side-effect free; calling twice on an unchanged model
/// yields an identical string.
pub fn compile(params: &LaunchParams) -> String {
    let mut cmd = format!(
        "{}=\"{}\" {} ",
        CACHE_ENV_VAR, params.cache_path, SERVER_TOKEN
    );

    if is_fragment(&params.model) {
        cmd.push_str(strip_invocation(&params.model));
    } else {
        cmd.push_str(&format!("-m \"{}\"", params.model));
    }

    cmd.push_str(&format!(
        " -t {} -ngl {} --port {} --host {}",
        params.threads,
        effective_gpu_layers(params),
        params.port,
        params.host
    ));
    cmd.push_str(&format!(
        " -c {} -b {} -np {} -sm {}",
        params.ctx_size,
        params.batch_size,
        params.parallel,
        params.split_mode.as_arg()
    ));

    if params.no_mmap {
        cmd.push_str(" --no-mmap");
    }
    if params.mlock {
        cmd.push_str(" --mlock");
    }
    if params.flash_attn {
        cmd.push_str(" -fa");
    }
    if params.jinja {
        cmd.push_str(" --jinja");
    }

    cmd.push_str(&format!(
        " --cache-type-k {} --cache-type-v {}",
        params.cache_type_k.as_arg(),
        params.cache_type_v.as_arg()
    ));
    cmd.push_str(&format!(
        " --temp {} --top-k {} --top-p {} --min-p {} --repeat-penalty {}",
        params.temp, params.top_k, params.top_p, params.min_p, params.repeat_penalty
    ));

    if params.rope_freq_base > 0.0 {
        cmd.push_str(&format!(" --rope-freq-base {}", params.rope_freq_base));
    }
    if params.rope_freq_scale > 0.0 {
        cmd.push_str(&format!(" --rope-freq-scale {}", params.rope_freq_scale));
    }

    cmd
}

/// Compile to argv form: same decisions as [`compile`], without the env
/// prefix and executable token.
pub fn compile_args(params: &LaunchParams) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    if is_fragment(&params.model) {
        args.extend(tokenize(strip_invocation(&params.model)));
    } else {
        args.push("-m".to_string());
        args.push(params.model.clone());
    }

    let pairs = [
        ("-t", params.threads.to_string()),
        ("-ngl", effective_gpu_layers(params).to_string()),
        ("--port", params.port.to_string()),
        ("--host", params.host.clone()),
        ("-c", params.ctx_size.to_string()),
        ("-b", params.batch_size.to_string()),
        ("-np", params.parallel.to_string()),
        ("-sm", params.split_mode.as_arg().to_string()),
    ];
    for (flag, value) in pairs {
        args.push(flag.to_string());
        args.push(value);
    }

    if params.no_mmap {
        args.push("--no-mmap".to_string());
    }
    if params.mlock {
        args.push("--mlock".to_string());
    }
    if params.flash_attn {
        args.push("-fa".to_string());
    }
    if params.jinja {
        args.push("--jinja".to_string());
    }

    let tail = [
        ("--cache-type-k", params.cache_type_k.as_arg().to_string()),
        ("--cache-type-v", params.cache_type_v.as_arg().to_string()),
        ("--temp", params.temp.to_string()),
        ("--top-k", params.top_k.to_string()),
        ("--top-p", params.top_p.to_string()),
        ("--min-p", params.min_p.to_string()),
        ("--repeat-penalty", params.repeat_penalty.to_string()),
    ];
    for (flag, value) in tail {
        args.push(flag.to_string());
        args.push(value);
    }

    if params.rope_freq_base > 0.0 {
        args.push("--rope-freq-base".to_string());
        args.push(params.rope_freq_base.to_string());
    }
    if params.rope_freq_scale > 0.0 {
        args.push("--rope-freq-scale".to_string());
        args.push(params.rope_freq_scale.to_string());
    }

    args
}

/// Split free-form text into tokens, honoring double quotes so paths with
/// spaces survive as single entries.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split an edited command string into argv for the process manager.
///
/// Leading `NAME=value` environment bindings and the executable token are
/// dropped; the server path and environment are supplied separately at
/// spawn time.
pub fn split_command_line(command: &str) -> Vec<String> {
    let mut tokens = tokenize(command).into_iter().peekable();
    let mut args = Vec::new();

    while let Some(token) = tokens.peek() {
        if is_env_binding(token) {
            tokens.next();
        } else {
            break;
        }
    }

    // The first remaining token is the executable unless the user removed it.
    if let Some(first) = tokens.peek() {
        if !first.starts_with('-') {
            tokens.next();
        }
    }

    args.extend(tokens);
    args
}

fn is_env_binding(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Command preview state: either derived from the current parameters or
/// manually overridden in the editor. The text returned by [`text`] is
/// what gets displayed and what gets launched.
///
/// [`text`]: CommandPreview::text
#[derive(Debug, Clone, PartialEq)]
pub enum CommandText {
    Derived(String),
    Overridden(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandPreview {
    current: CommandText,
    /// Snapshot taken on enter_edit; discarding restores it.
    snapshot: Option<CommandText>,
}

impl CommandPreview {
    pub fn new(params: &LaunchParams) -> Self {
        Self {
            current: CommandText::Derived(compile(params)),
            snapshot: None,
        }
    }

    pub fn text(&self) -> &str {
        match &self.current {
            CommandText::Derived(s) | CommandText::Overridden(s) => s,
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self.current, CommandText::Overridden(_))
    }

    /// A parameter change supersedes any manual override.
    pub fn recompile(&mut self, params: &LaunchParams) {
        self.current = CommandText::Derived(compile(params));
        self.snapshot = None;
    }

    /// Begin editing: snapshot the current state and hand the text to the
    /// editor.
    pub fn enter_edit(&mut self) -> String {
        self.snapshot = Some(self.current.clone());
        self.text().to_string()
    }

    /// Commit edited text as the value used for launch.
    pub fn apply(&mut self, edited: impl Into<String>) {
        self.current = CommandText::Overridden(edited.into());
        self.snapshot = None;
    }

    /// Abandon the edit, restoring the snapshot taken at `enter_edit`.
    pub fn discard(&mut self) {
        if let Some(previous) = self.snapshot.take() {
            self.current = previous;
        }
    }

    /// Argv used for launch: derived commands recompile from the
    /// parameters, overridden commands are split from the edited text.
    pub fn launch_args(&self, params: &LaunchParams) -> Vec<String> {
        match &self.current {
            CommandText::Derived(_) => compile_args(params),
            CommandText::Overridden(text) => split_command_line(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::params::CacheType;

    fn params_with_model(model: &str) -> LaunchParams {
        LaunchParams {
            model: model.to_string(),
            ..LaunchParams::default()
        }
    }

    #[test]
    fn test_compile_deterministic() {
        let params = params_with_model("/models/llama-7b.gguf");
        assert_eq!(compile(&params), compile(&params));
    }

    #[test]
    fn test_bare_path_wrapped_as_model_arg() {
        let params = params_with_model("/models/qwen2-math.gguf");
        let cmd = compile(&params);
        assert!(cmd.contains("-m \"/models/qwen2-math.gguf\""));
    }

    #[test]
    fn test_fragment_passed_through() {
        let params = params_with_model("-hf unsloth/Qwen3-8B-GGUF");
        let cmd = compile(&params);
        assert!(cmd.contains("llama-server -hf unsloth/Qwen3-8B-GGUF -t"));
        assert!(!cmd.contains("-m \""));
    }

    #[test]
    fn test_fragment_strips_one_leading_invocation() {
        let params = params_with_model("llama-server -hf unsloth/Qwen3-8B-GGUF");
        let cmd = compile(&params);
        // Exactly one llama-server token: the one the compiler itself emits.
        assert_eq!(cmd.matches("llama-server").count(), 1);
        assert!(cmd.contains("-hf unsloth/Qwen3-8B-GGUF"));
    }

    #[test]
    fn test_cpu_backend_forces_zero_gpu_layers() {
        let mut params = params_with_model("/models/a.gguf");
        params.gpu_layers = 99;
        params.backend = Backend::Cpu;
        let cmd = compile(&params);
        assert!(cmd.contains("-ngl 0"));
        assert!(!cmd.contains("-ngl 99"));

        let args = compile_args(&params);
        let ngl = args.iter().position(|a| a == "-ngl").unwrap();
        assert_eq!(args[ngl + 1], "0");
    }

    #[test]
    fn test_gpu_layers_kept_for_other_backends() {
        let mut params = params_with_model("/models/a.gguf");
        params.gpu_layers = 33;
        params.backend = Backend::Vulkan;
        assert!(compile(&params).contains("-ngl 33"));
    }

    #[test]
    fn test_rope_args_present_iff_positive() {
        let mut params = params_with_model("/models/a.gguf");
        assert!(!compile(&params).contains("--rope-freq-base"));
        assert!(!compile(&params).contains("--rope-freq-scale"));

        params.rope_freq_base = 10000.0;
        let cmd = compile(&params);
        assert!(cmd.contains("--rope-freq-base 10000"));
        assert!(!cmd.contains("--rope-freq-scale"));

        params.rope_freq_scale = 0.5;
        assert!(compile(&params).contains("--rope-freq-scale 0.5"));
    }

    #[test]
    fn test_boolean_flags_only_when_set() {
        let mut params = params_with_model("/models/a.gguf");
        let cmd = compile(&params);
        assert!(!cmd.contains("--no-mmap"));
        assert!(!cmd.contains("--mlock"));
        assert!(!cmd.contains("-fa"));
        assert!(!cmd.contains("--jinja"));

        params.no_mmap = true;
        params.flash_attn = true;
        let cmd = compile(&params);
        assert!(cmd.contains("--no-mmap"));
        assert!(cmd.contains("-fa"));
        assert!(!cmd.contains("--mlock"));
    }

    #[test]
    fn test_cache_types_and_sampling_always_present() {
        let mut params = params_with_model("/models/a.gguf");
        params.cache_type_v = CacheType::Q8_0;
        let cmd = compile(&params);
        assert!(cmd.contains("--cache-type-k f16"));
        assert!(cmd.contains("--cache-type-v q8_0"));
        assert!(cmd.contains("--temp 0.8"));
        assert!(cmd.contains("--top-k 40"));
        assert!(cmd.contains("--min-p 0.05"));
        assert!(cmd.contains("--repeat-penalty 1.1"));
    }

    #[test]
    fn test_env_prefix_binds_cache_path() {
        let mut params = params_with_model("/models/a.gguf");
        params.cache_path = "/data/models".to_string();
        let cmd = compile(&params);
        assert!(cmd.starts_with("LLAMA_CACHE=\"/data/models\" llama-server "));
    }

    #[test]
    fn test_tokenize_honors_quotes() {
        let tokens = tokenize("-m \"C:\\models\\my model.gguf\" -t 8");
        assert_eq!(
            tokens,
            vec!["-m", "C:\\models\\my model.gguf", "-t", "8"]
        );
    }

    #[test]
    fn test_split_command_line_drops_env_and_executable() {
        let args = split_command_line(
            "LLAMA_CACHE=\"/data\" llama-server -m \"/models/a b.gguf\" --port 8081",
        );
        assert_eq!(args, vec!["-m", "/models/a b.gguf", "--port", "8081"]);
    }

    #[test]
    fn test_split_command_line_without_executable() {
        let args = split_command_line("-m /models/a.gguf -t 4");
        assert_eq!(args, vec!["-m", "/models/a.gguf", "-t", "4"]);
    }

    #[test]
    fn test_preview_edit_discard_round_trip() {
        let params = params_with_model("/models/a.gguf");
        let mut preview = CommandPreview::new(&params);
        let derived = preview.text().to_string();

        let editable = preview.enter_edit();
        assert_eq!(editable, derived);
        preview.discard();
        assert_eq!(preview.text(), derived);
        assert!(!preview.is_overridden());
    }

    #[test]
    fn test_preview_apply_overrides_until_recompile() {
        let params = params_with_model("/models/a.gguf");
        let mut preview = CommandPreview::new(&params);
        preview.enter_edit();
        preview.apply("llama-server -m /models/a.gguf --port 9999");
        assert!(preview.is_overridden());
        assert!(preview.text().contains("--port 9999"));

        // A parameter change supersedes the override.
        let mut changed = params.clone();
        changed.port = 8082;
        preview.recompile(&changed);
        assert!(!preview.is_overridden());
        assert!(preview.text().contains("--port 8082"));
    }

    #[test]
    fn test_overridden_launch_args_come_from_edited_text() {
        let params = params_with_model("/models/a.gguf");
        let mut preview = CommandPreview::new(&params);
        preview.enter_edit();
        preview.apply("llama-server -m \"/models/other.gguf\" -t 2");
        assert_eq!(
            preview.launch_args(&params),
            vec!["-m", "/models/other.gguf", "-t", "2"]
        );
    }

    #[test]
    fn test_derived_launch_args_match_compile_args() {
        let params = params_with_model("/models/a.gguf");
        let preview = CommandPreview::new(&params);
        assert_eq!(preview.launch_args(&params), compile_args(&params));
    }
}
