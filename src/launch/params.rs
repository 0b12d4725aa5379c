//! Launch parameters
//!
//! Every user-configurable llama-server option, with a documented default
//! for each field. The model is always fully defined: malformed input falls
//! back to the field default instead of producing an error.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default values used whenever a control is absent, unset, or malformed.
pub mod defaults {
    pub const THREADS: u32 = 8;
    pub const GPU_LAYERS: u32 = 0;
    pub const PORT: u16 = 8080;
    pub const HOST: &str = "127.0.0.1";
    pub const CTX_SIZE: u32 = 4096;
    pub const BATCH_SIZE: u32 = 512;
    pub const PARALLEL: u32 = 1;
    pub const TEMP: f32 = 0.8;
    pub const TOP_K: u32 = 40;
    pub const TOP_P: f32 = 0.9;
    pub const MIN_P: f32 = 0.05;
    pub const REPEAT_PENALTY: f32 = 1.1;
    pub const ROPE_FREQ_BASE: f32 = 0.0;
    pub const ROPE_FREQ_SCALE: f32 = 0.0;
}

/// Parse a numeric field, falling back to the documented default on
/// malformed input. Recovery is local; the caller never sees an error.
pub fn field_or<T: FromStr>(text: &str, default: T) -> T {
    text.trim().parse().unwrap_or(default)
}

/// Strategy for distributing model layers across compute devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    #[default]
    Layer,
    Row,
    None,
}

impl SplitMode {
    pub fn as_arg(&self) -> &'static str {
        match self {
            SplitMode::Layer => "layer",
            SplitMode::Row => "row",
            SplitMode::None => "none",
        }
    }

    /// Lenient parse; unknown text yields the default.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "row" => SplitMode::Row,
            "none" => SplitMode::None,
            _ => SplitMode::Layer,
        }
    }
}

/// Numeric precision for attention KV-cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    #[default]
    F16,
    F32,
    #[serde(rename = "q8_0")]
    Q8_0,
    #[serde(rename = "q4_0")]
    Q4_0,
    #[serde(rename = "q4_1")]
    Q4_1,
    #[serde(rename = "q5_0")]
    Q5_0,
    #[serde(rename = "q5_1")]
    Q5_1,
}

impl CacheType {
    pub const ALL: [CacheType; 7] = [
        CacheType::F16,
        CacheType::F32,
        CacheType::Q8_0,
        CacheType::Q4_0,
        CacheType::Q4_1,
        CacheType::Q5_0,
        CacheType::Q5_1,
    ];

    pub fn as_arg(&self) -> &'static str {
        match self {
            CacheType::F16 => "f16",
            CacheType::F32 => "f32",
            CacheType::Q8_0 => "q8_0",
            CacheType::Q4_0 => "q4_0",
            CacheType::Q4_1 => "q4_1",
            CacheType::Q5_0 => "q5_0",
            CacheType::Q5_1 => "q5_1",
        }
    }

    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_arg() == key.trim())
            .unwrap_or_default()
    }
}

/// Hardware acceleration path the server may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Auto,
    Cpu,
    Cuda,
    Rocm,
    Vulkan,
    Sycl,
}

impl Backend {
    /// Selectable backends, in UI order.
    pub const ALL: [Backend; 6] = [
        Backend::Auto,
        Backend::Cpu,
        Backend::Cuda,
        Backend::Rocm,
        Backend::Vulkan,
        Backend::Sycl,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Backend::Auto => "auto",
            Backend::Cpu => "cpu",
            Backend::Cuda => "cuda",
            Backend::Rocm => "rocm",
            Backend::Vulkan => "vulkan",
            Backend::Sycl => "sycl",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Auto => "Auto",
            Backend::Cpu => "CPU",
            Backend::Cuda => "CUDA (NVIDIA)",
            Backend::Rocm => "ROCm (AMD)",
            Backend::Vulkan => "Vulkan",
            Backend::Sycl => "SYCL (Intel)",
        }
    }

    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|b| b.key() == key.trim())
            .unwrap_or_default()
    }
}

/// All user-configurable launch options for llama-server.
///
/// Persisted between runs as the last-used configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchParams {
    /// Model reference: a .gguf path, or a pre-formatted fragment such as
    /// `-hf unsloth/Qwen3-8B-GGUF`.
    pub model: String,
    /// Path to the llama-server executable. Empty = auto-discover.
    #[serde(default)]
    pub server_path: String,
    pub threads: u32,
    pub gpu_layers: u32,
    pub port: u16,
    pub host: String,
    pub ctx_size: u32,
    pub batch_size: u32,
    pub parallel: u32,
    pub split_mode: SplitMode,
    pub no_mmap: bool,
    pub mlock: bool,
    pub flash_attn: bool,
    pub jinja: bool,
    pub temp: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub min_p: f32,
    pub repeat_penalty: f32,
    /// 0 = unset; the server uses its own default and the flag is omitted.
    pub rope_freq_base: f32,
    /// 0 = unset; same omission rule as the base.
    pub rope_freq_scale: f32,
    pub cache_type_k: CacheType,
    pub cache_type_v: CacheType,
    pub backend: Backend,
    /// Model scan directory, bound to LLAMA_CACHE at launch.
    #[serde(default)]
    pub cache_path: String,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            server_path: String::new(),
            threads: defaults::THREADS,
            gpu_layers: defaults::GPU_LAYERS,
            port: defaults::PORT,
            host: defaults::HOST.to_string(),
            ctx_size: defaults::CTX_SIZE,
            batch_size: defaults::BATCH_SIZE,
            parallel: defaults::PARALLEL,
            split_mode: SplitMode::default(),
            no_mmap: false,
            mlock: false,
            flash_attn: false,
            jinja: false,
            temp: defaults::TEMP,
            top_k: defaults::TOP_K,
            top_p: defaults::TOP_P,
            min_p: defaults::MIN_P,
            repeat_penalty: defaults::REPEAT_PENALTY,
            rope_freq_base: defaults::ROPE_FREQ_BASE,
            rope_freq_scale: defaults::ROPE_FREQ_SCALE,
            cache_type_k: CacheType::default(),
            cache_type_v: CacheType::default(),
            backend: Backend::default(),
            cache_path: String::new(),
        }
    }
}

impl LaunchParams {
    /// Clamp fields to their valid ranges.
    ///
    /// Called after loading persisted values so a hand-edited or stale
    /// settings file can never produce an unusable configuration.
    pub fn validate(&mut self) {
        if self.threads == 0 {
            self.threads = defaults::THREADS;
        }
        if self.port == 0 {
            self.port = defaults::PORT;
        }
        if self.host.trim().is_empty() {
            self.host = defaults::HOST.to_string();
        }
        if self.ctx_size == 0 {
            self.ctx_size = defaults::CTX_SIZE;
        }
        if self.batch_size == 0 {
            self.batch_size = defaults::BATCH_SIZE;
        }
        if self.parallel == 0 {
            self.parallel = defaults::PARALLEL;
        }
        if self.rope_freq_base < 0.0 {
            self.rope_freq_base = defaults::ROPE_FREQ_BASE;
        }
        if self.rope_freq_scale < 0.0 {
            self.rope_freq_scale = defaults::ROPE_FREQ_SCALE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = LaunchParams::default();
        assert_eq!(params.threads, 8);
        assert_eq!(params.port, 8080);
        assert_eq!(params.host, "127.0.0.1");
        assert_eq!(params.ctx_size, 4096);
        assert_eq!(params.batch_size, 512);
        assert_eq!(params.split_mode, SplitMode::Layer);
        assert_eq!(params.cache_type_k, CacheType::F16);
        assert_eq!(params.backend, Backend::Auto);
        assert_eq!(params.temp, 0.8);
        assert_eq!(params.rope_freq_base, 0.0);
    }

    #[test]
    fn test_field_or_recovers_malformed_input() {
        assert_eq!(field_or("12", defaults::THREADS), 12u32);
        assert_eq!(field_or(" 12 ", defaults::THREADS), 12u32);
        assert_eq!(field_or("abc", defaults::THREADS), 8u32);
        assert_eq!(field_or("", defaults::PORT), 8080u16);
        assert_eq!(field_or("1.5x", defaults::TEMP), 0.8f32);
    }

    #[test]
    fn test_enum_lenient_parse() {
        assert_eq!(Backend::from_key("rocm"), Backend::Rocm);
        assert_eq!(Backend::from_key("nonsense"), Backend::Auto);
        assert_eq!(SplitMode::from_key("row"), SplitMode::Row);
        assert_eq!(SplitMode::from_key(""), SplitMode::Layer);
        assert_eq!(CacheType::from_key("q8_0"), CacheType::Q8_0);
        assert_eq!(CacheType::from_key("int4"), CacheType::F16);
    }

    #[test]
    fn test_validate_clamps_zeroes() {
        let mut params = LaunchParams::default();
        params.threads = 0;
        params.port = 0;
        params.ctx_size = 0;
        params.parallel = 0;
        params.host = "  ".to_string();
        params.validate();
        assert_eq!(params.threads, 8);
        assert_eq!(params.port, 8080);
        assert_eq!(params.ctx_size, 4096);
        assert_eq!(params.parallel, 1);
        assert_eq!(params.host, "127.0.0.1");
    }

    #[test]
    fn test_serde_round_trip() {
        let params = LaunchParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let loaded: LaunchParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, loaded);
        assert!(json.contains("\"backend\":\"auto\""));
        assert!(json.contains("\"cache_type_k\":\"f16\""));
    }
}
