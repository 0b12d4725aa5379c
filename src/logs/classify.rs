//! Log line classification
//!
//! Pure, case-insensitive matching over raw server output. Two independent
//! rules run per line: a severity/category rule and a backend-load signal
//! rule. A single line can carry both.

/// Severity/category of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Error,
    Warning,
    /// Performance figures: eval times, token throughput.
    TokenMetric,
    System,
}

impl LogCategory {
    pub const ALL: [LogCategory; 4] = [
        LogCategory::Error,
        LogCategory::Warning,
        LogCategory::TokenMetric,
        LogCategory::System,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LogCategory::Error => "Errors",
            LogCategory::Warning => "Warnings",
            LogCategory::TokenMetric => "Token metrics",
            LogCategory::System => "System",
        }
    }
}

/// Phrases that mark a line as a performance metric.
const METRIC_PHRASES: [&str; 4] = [
    "eval time",
    "tokens per second",
    "total time",
    "prompt eval time",
];

/// Backend-load announcements and the canonical display name each one maps
/// to. Matched independently of the category rule.
const BACKEND_ANNOUNCEMENTS: [(&str, &str); 5] = [
    ("loaded cuda backend", "CUDA (NVIDIA)"),
    ("loaded rocm backend", "ROCm (AMD)"),
    ("loaded vulkan backend", "Vulkan"),
    ("loaded metal backend", "Metal"),
    ("loaded sycl backend", "SYCL"),
];

/// Classification result for one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub category: LogCategory,
    /// Canonical display name of a backend announced by this line, if any.
    pub backend: Option<&'static str>,
}

/// Classify a raw log line. First category match wins; the backend signal
/// is evaluated regardless of the category outcome.
pub fn classify(line: &str) -> Classified {
    let lower = line.to_lowercase();

    let category = if lower.contains("error") || lower.contains("failed") {
        LogCategory::Error
    } else if lower.contains("warn") {
        LogCategory::Warning
    } else if METRIC_PHRASES.iter().any(|p| lower.contains(p)) {
        LogCategory::TokenMetric
    } else {
        LogCategory::System
    };

    let backend = BACKEND_ANNOUNCEMENTS
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, name)| *name);

    Classified { category, backend }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines() {
        assert_eq!(
            classify("error: failed to load model").category,
            LogCategory::Error
        );
        assert_eq!(
            classify("llama_model_load: FAILED to open file").category,
            LogCategory::Error
        );
    }

    #[test]
    fn test_error_wins_over_warning() {
        // "warn" also matches, but error/failed is checked first.
        assert_eq!(
            classify("warning: load failed").category,
            LogCategory::Error
        );
    }

    #[test]
    fn test_warning_lines() {
        assert_eq!(classify("warning: low vram").category, LogCategory::Warning);
        assert_eq!(
            classify("WARN: deprecated option").category,
            LogCategory::Warning
        );
    }

    #[test]
    fn test_token_metric_lines() {
        assert_eq!(
            classify("prompt eval time = 120ms").category,
            LogCategory::TokenMetric
        );
        assert_eq!(
            classify("32.5 tokens per second").category,
            LogCategory::TokenMetric
        );
        assert_eq!(
            classify("total time = 4022.56 ms").category,
            LogCategory::TokenMetric
        );
    }

    #[test]
    fn test_system_fallback() {
        assert_eq!(
            classify("server listening on port 8080").category,
            LogCategory::System
        );
    }

    #[test]
    fn test_backend_signal_is_case_insensitive() {
        assert_eq!(
            classify("loaded CUDA backend").backend,
            Some("CUDA (NVIDIA)")
        );
        assert_eq!(classify("Loaded Vulkan Backend").backend, Some("Vulkan"));
        assert_eq!(classify("loaded metal backend").backend, Some("Metal"));
        assert_eq!(classify("loaded rocm backend").backend, Some("ROCm (AMD)"));
        assert_eq!(classify("loaded sycl backend").backend, Some("SYCL"));
    }

    #[test]
    fn test_backend_signal_independent_of_category() {
        // A metric line announcing a backend carries both results.
        let result = classify("loaded CUDA backend, prompt eval time = 80ms");
        assert_eq!(result.category, LogCategory::TokenMetric);
        assert_eq!(result.backend, Some("CUDA (NVIDIA)"));
    }

    #[test]
    fn test_plain_lines_carry_no_signal() {
        assert_eq!(classify("server listening on port 8080").backend, None);
    }
}
