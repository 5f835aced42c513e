use crate::error::{PipelineError, Result};
use candle_core::Device;

/// Which device a model backend should run on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    /// CPU inference (default).
    #[default]
    Cpu,
    /// A specific CUDA GPU.
    Cuda(usize),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(&self) -> Result<Device> {
        match self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => {
                let device = Device::new_cuda(*i).map_err(|e| {
                    PipelineError::Device(format!(
                        "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                    ))
                })?;
                tracing::info!(index = i, "Using CUDA device");
                Ok(device)
            }
        }
    }
}

/// Lowercase a label and replace spaces with underscores.
///
/// Zero-shot models echo candidate labels back verbatim, so both the
/// candidate list and the returned labels go through this before matching.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Append `suffix` to every name.
pub fn with_suffix<S: AsRef<str>>(names: &[S], suffix: &str) -> Vec<String> {
    names
        .iter()
        .map(|name| format!("{}{}", name.as_ref(), suffix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_spaces() {
        assert_eq!(normalize_label("Mental Health"), "mental_health");
        assert_eq!(normalize_label("pay"), "pay");
        assert_eq!(normalize_label("Work  Life"), "work__life");
    }

    #[test]
    fn suffixes_in_order() {
        assert_eq!(
            with_suffix(&["pay", "culture"], "_bert"),
            vec!["pay_bert".to_string(), "culture_bert".to_string()]
        );
    }

    #[test]
    fn cpu_request_resolves() {
        let device = DeviceRequest::default().resolve().unwrap();
        assert!(matches!(device, Device::Cpu));
    }
}
