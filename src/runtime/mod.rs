//! Runtime capability detection
//!
//! Probes which acceleration backends the installed llama-server can use:
//! runtime libraries sitting next to the executable decide availability,
//! and a `--list-devices` run reports what actually initializes. The
//! resulting report gates the backend selector; a backend observed later in
//! the live log stream overrides this static picture.

use crate::launch::params::Backend;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// How long a `--list-devices` run may take before it is abandoned.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("llama-server executable not found. Install llama.cpp or set the server path.")]
    ServerNotFound,
}

/// Probe-time status of a detected runtime entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    Ok,
    Warning,
    Error,
}

/// One row in the detected-runtime list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEntry {
    pub name: String,
    pub status: RuntimeStatus,
    pub tooltip: String,
}

/// Availability of a selectable backend. A value type so re-applying an
/// unchanged report to the option set is a comparison, not a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAvailability {
    Available,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOption {
    pub backend: Backend,
    pub availability: BackendAvailability,
}

impl BackendOption {
    pub fn is_available(&self) -> bool {
        matches!(self.availability, BackendAvailability::Available)
    }
}

/// Result of a capability probe: selectable options plus the ordered list
/// of runtimes the server reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityReport {
    options: Vec<BackendOption>,
    pub runtimes: Vec<RuntimeEntry>,
}

/// Runtime library files that must sit next to the server executable for a
/// backend to be selectable. First name is the canonical one shown in the
/// unavailability reason.
const BACKEND_LIBRARIES: [(Backend, &[&str]); 4] = [
    (Backend::Cuda, &["ggml-cuda.dll", "libggml-cuda.so"]),
    (Backend::Rocm, &["ggml-hip.dll", "libggml-hip.so"]),
    (Backend::Vulkan, &["ggml-vk.dll", "libggml-vulkan.so"]),
    (Backend::Sycl, &["ggml-sycl.dll", "libggml-sycl.so"]),
];

impl CapabilityReport {
    /// Report claiming only CPU support, used when probing is impossible.
    pub fn cpu_only() -> Self {
        Self::from_available(|backend| {
            (
                false,
                format!("{} runtime not detected", backend.label()),
            )
        })
        .with_runtimes(vec![cpu_fallback_entry()])
    }

    fn from_available(check: impl Fn(Backend) -> (bool, String)) -> Self {
        let mut options = vec![
            BackendOption {
                backend: Backend::Auto,
                availability: BackendAvailability::Available,
            },
            // CPU is always reported installed.
            BackendOption {
                backend: Backend::Cpu,
                availability: BackendAvailability::Available,
            },
        ];
        for (backend, _) in BACKEND_LIBRARIES {
            let (available, reason) = check(backend);
            options.push(BackendOption {
                backend,
                availability: if available {
                    BackendAvailability::Available
                } else {
                    BackendAvailability::Unavailable { reason }
                },
            });
        }
        Self {
            options,
            runtimes: Vec::new(),
        }
    }

    fn with_runtimes(mut self, runtimes: Vec<RuntimeEntry>) -> Self {
        self.runtimes = runtimes;
        self
    }

    /// Selectable options in fixed UI order.
    pub fn options(&self) -> &[BackendOption] {
        &self.options
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.options
            .iter()
            .find(|o| o.backend == backend)
            .map(BackendOption::is_available)
            .unwrap_or(false)
    }

    pub fn unavailable_reason(&self, backend: Backend) -> Option<&str> {
        self.options.iter().find(|o| o.backend == backend).and_then(
            |o| match &o.availability {
                BackendAvailability::Available => None,
                BackendAvailability::Unavailable { reason } => Some(reason.as_str()),
            },
        )
    }

    /// Deterministic reselection after a report lands: a selection that is
    /// unavailable (or was Auto) moves to the first available backend in
    /// fixed priority order, falling back to Auto's CPU semantics. No
    /// selection may remain on a disabled option.
    pub fn reselect(&self, current: Backend) -> Backend {
        if current != Backend::Auto && self.is_available(current) {
            return current;
        }
        for candidate in [Backend::Rocm, Backend::Cuda, Backend::Vulkan] {
            if self.is_available(candidate) {
                return candidate;
            }
        }
        Backend::Auto
    }
}

fn cpu_fallback_entry() -> RuntimeEntry {
    RuntimeEntry {
        name: "CPU (Fallback)".to_string(),
        status: RuntimeStatus::Ok,
        tooltip: "CPU is always available as fallback.".to_string(),
    }
}

/// Check which backend runtime libraries sit next to the server executable.
pub fn detect_available(server_dir: &Path) -> CapabilityReport {
    CapabilityReport::from_available(|backend| {
        let names = BACKEND_LIBRARIES
            .iter()
            .find(|(b, _)| *b == backend)
            .map(|(_, names)| *names)
            .unwrap_or(&[]);
        let available = names.iter().any(|name| server_dir.join(name).exists());
        (
            available,
            format!("{} not found in server directory", names.first().unwrap_or(&"runtime library")),
        )
    })
}

/// Keywords announcing a backend in `--list-devices` output, with display
/// names for the runtime list. Order is the display order.
const RUNTIME_KEYWORDS: [(&[&str], &str); 5] = [
    (&["cuda"], "CUDA (NVIDIA GPUs)"),
    (&["hip", "rocm", "amd"], "ROCm (AMD GPUs)"),
    (&["vulkan"], "Vulkan (Cross-platform)"),
    (&["metal"], "Metal (Apple Silicon)"),
    (&["sycl"], "SYCL (Intel GPUs/Accelerators)"),
];

/// Parse combined `--list-devices` output into the detected-runtime list.
///
/// A backend counts as active when its keyword co-occurs with "device" or
/// "init" on a line that is not an error report. `ggml_cuda_init` banner
/// lines are skipped entirely: ROCm builds print them too, and they caused
/// false CUDA positives on AMD machines.
pub fn parse_runtime_info(output: &str) -> Vec<RuntimeEntry> {
    let mut active = [false; RUNTIME_KEYWORDS.len()];

    for line in output.lines() {
        let lower = line.to_lowercase();

        if lower.contains("ggml_cuda_init") {
            continue;
        }
        if lower.contains("error") || lower.contains("failed") || lower.contains("not found") {
            continue;
        }
        if !(lower.contains("device") || lower.contains("init")) {
            continue;
        }

        for (idx, (keywords, _)) in RUNTIME_KEYWORDS.iter().enumerate() {
            if keywords.iter().any(|k| lower.contains(k)) {
                active[idx] = true;
            }
        }
    }

    let mut runtimes: Vec<RuntimeEntry> = RUNTIME_KEYWORDS
        .iter()
        .zip(active)
        .filter(|(_, is_active)| *is_active)
        .map(|((_, name), _)| RuntimeEntry {
            name: name.to_string(),
            status: RuntimeStatus::Ok,
            tooltip: format!("{} is active and ready.", name),
        })
        .collect();

    runtimes.push(cpu_fallback_entry());
    runtimes
}

/// Probe the server executable for backend capabilities.
///
/// Library checks decide selectability; a `--list-devices` run fills the
/// detected-runtime list. A failing or slow run is not fatal — the report
/// degrades to the CPU fallback entry, matching a machine with no GPU
/// runtime at all.
pub async fn probe(server_path: &str) -> Result<CapabilityReport, ProbeError> {
    let server_path = server_path.trim();
    if server_path.is_empty() {
        return Err(ProbeError::ServerNotFound);
    }

    let server_dir = Path::new(server_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let report = detect_available(server_dir);

    let output = timeout(
        PROBE_TIMEOUT,
        Command::new(server_path).arg("--list-devices").output(),
    )
    .await;

    let runtimes = match output {
        Ok(Ok(output)) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
            combined.push('\n');
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            parse_runtime_info(&combined)
        }
        Ok(Err(e)) => {
            tracing::warn!("runtime check failed (safe to ignore if configuring): {}", e);
            vec![cpu_fallback_entry()]
        }
        Err(_) => {
            tracing::warn!("runtime check timed out after {:?}", PROBE_TIMEOUT);
            vec![cpu_fallback_entry()]
        }
    };

    Ok(report.with_runtimes(runtimes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(available: &[Backend]) -> CapabilityReport {
        CapabilityReport::from_available(|backend| {
            (
                available.contains(&backend),
                format!("{} missing", backend.key()),
            )
        })
    }

    #[test]
    fn test_cpu_and_auto_always_available() {
        let report = CapabilityReport::cpu_only();
        assert!(report.is_available(Backend::Cpu));
        assert!(report.is_available(Backend::Auto));
        assert!(!report.is_available(Backend::Cuda));
        assert!(report.unavailable_reason(Backend::Cuda).is_some());
    }

    #[test]
    fn test_reselect_auto_picks_priority_order() {
        let report = report_with(&[Backend::Cuda, Backend::Vulkan]);
        assert_eq!(report.reselect(Backend::Auto), Backend::Cuda);

        let report = report_with(&[Backend::Rocm, Backend::Cuda]);
        assert_eq!(report.reselect(Backend::Auto), Backend::Rocm);
    }

    #[test]
    fn test_reselect_auto_with_only_vulkan() {
        // rocm and cuda unavailable, vulkan available, selection = auto.
        let report = report_with(&[Backend::Vulkan]);
        assert_eq!(report.reselect(Backend::Auto), Backend::Vulkan);
    }

    #[test]
    fn test_reselect_keeps_valid_selection() {
        let report = report_with(&[Backend::Vulkan, Backend::Cuda]);
        assert_eq!(report.reselect(Backend::Vulkan), Backend::Vulkan);
        assert_eq!(report.reselect(Backend::Cpu), Backend::Cpu);
    }

    #[test]
    fn test_reselect_moves_off_disabled_selection() {
        let report = report_with(&[Backend::Vulkan]);
        assert_eq!(report.reselect(Backend::Cuda), Backend::Vulkan);

        let report = report_with(&[]);
        assert_eq!(report.reselect(Backend::Cuda), Backend::Auto);
    }

    #[test]
    fn test_report_application_is_idempotent() {
        // Two probes over the same inputs produce equal reports, so
        // re-applying one to the option set is a no-op.
        let a = report_with(&[Backend::Cuda]);
        let b = report_with(&[Backend::Cuda]);
        assert_eq!(a, b);
        assert_eq!(a.options(), b.options());
    }

    #[test]
    fn test_parse_detects_active_backends() {
        let output = "\
ggml_vulkan: Found 1 Vulkan devices:\n\
Vulkan0: AMD Radeon RX 7900 XT (device 0)\n";
        let runtimes = parse_runtime_info(output);
        assert!(runtimes.iter().any(|r| r.name.starts_with("Vulkan")));
        // CPU fallback is always last.
        assert_eq!(runtimes.last().unwrap().name, "CPU (Fallback)");
    }

    #[test]
    fn test_parse_ignores_cuda_init_banner() {
        // ROCm builds print ggml_cuda_init too; it must not count as CUDA.
        let output = "ggml_cuda_init: found 1 ROCm devices\n";
        let runtimes = parse_runtime_info(output);
        assert!(!runtimes.iter().any(|r| r.name.starts_with("CUDA")));
        assert!(!runtimes.iter().any(|r| r.name.starts_with("ROCm")));
    }

    #[test]
    fn test_parse_ignores_error_lines() {
        let output = "cuda device init failed: out of memory\n";
        let runtimes = parse_runtime_info(output);
        assert_eq!(runtimes.len(), 1);
        assert_eq!(runtimes[0].name, "CPU (Fallback)");
    }

    #[test]
    fn test_parse_requires_device_or_init_context() {
        let output = "compiled with cuda support\n";
        let runtimes = parse_runtime_info(output);
        assert!(!runtimes.iter().any(|r| r.name.starts_with("CUDA")));
    }

    #[test]
    fn test_parse_dedupes_repeated_announcements() {
        let output = "cuda device 0\ncuda device 1\ncuda init ok\n";
        let runtimes = parse_runtime_info(output);
        let cuda_count = runtimes
            .iter()
            .filter(|r| r.name.starts_with("CUDA"))
            .count();
        assert_eq!(cuda_count, 1);
    }

    #[test]
    fn test_detect_available_checks_library_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-vk.dll"), b"").unwrap();

        let report = detect_available(dir.path());
        assert!(report.is_available(Backend::Vulkan));
        assert!(!report.is_available(Backend::Cuda));
        assert!(report
            .unavailable_reason(Backend::Cuda)
            .unwrap()
            .contains("ggml-cuda.dll"));
    }

    #[tokio::test]
    async fn test_probe_rejects_empty_path() {
        assert!(matches!(probe("").await, Err(ProbeError::ServerNotFound)));
        assert!(matches!(probe("  ").await, Err(ProbeError::ServerNotFound)));
    }
}
