use std::fmt;
use std::panic::Location;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

// ── debug message taxonomy ────────────────────────────────────────────────

/// Subsystem that produced a debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MessageSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

/// What a debug message is about.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MessageKind {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Notification,
    Low,
    Medium,
    High,
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageSource::Api => "API",
            MessageSource::WindowSystem => "WINDOW SYSTEM",
            MessageSource::ShaderCompiler => "SHADER COMPILER",
            MessageSource::ThirdParty => "THIRD PARTY",
            MessageSource::Application => "APPLICATION",
            MessageSource::Other => "OTHER",
        })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageKind::Error => "ERROR",
            MessageKind::DeprecatedBehavior => "DEPRECATED BEHAVIOR",
            MessageKind::UndefinedBehavior => "UNDEFINED BEHAVIOR",
            MessageKind::Portability => "PORTABILITY",
            MessageKind::Performance => "PERFORMANCE",
            MessageKind::Other => "OTHER",
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Notification => "NOTIFICATION",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        })
    }
}

/// One message posted to the GPU debug channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugMessage {
    pub source: MessageSource,
    pub kind: MessageKind,
    pub severity: Severity,
    pub id: u32,
    pub message: String,
}

impl DebugMessage {
    /// High-severity API error; the common case for validation failures.
    pub fn api_error(id: u32, message: impl Into<String>) -> Self {
        Self {
            source: MessageSource::Api,
            kind: MessageKind::Error,
            severity: Severity::High,
            id,
            message: message.into(),
        }
    }

    /// Translates an error raised by wgpu's own validation.
    pub fn from_wgpu(err: &wgpu::Error) -> Self {
        let (id, message) = match err {
            wgpu::Error::OutOfMemory { .. } => (ids::WGPU_OUT_OF_MEMORY, err.to_string()),
            wgpu::Error::Validation { description, .. } => (ids::WGPU_VALIDATION, description.clone()),
            wgpu::Error::Internal { description, .. } => (ids::WGPU_INTERNAL, description.clone()),
        };
        Self::api_error(id, message.trim_end())
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

/// A GPU call failed.
///
/// Carries the last error message drained from the debug channel and the
/// source location of the wrapped call.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "[{}:{}][{origin};{kind};{severity}][{id}]: {message}",
    location.file(),
    location.line()
)]
pub struct GpuError {
    pub origin: MessageSource,
    pub kind: MessageKind,
    pub severity: Severity,
    pub id: u32,
    pub message: String,
    pub location: &'static Location<'static>,
}

impl GpuError {
    pub(crate) fn from_message(msg: DebugMessage, location: &'static Location<'static>) -> Self {
        Self {
            origin: msg.source,
            kind: msg.kind,
            severity: msg.severity,
            id: msg.id,
            message: msg.message,
            location,
        }
    }
}

/// Message ids: engine pre-checks below 100, wgpu errors from 100.
pub mod ids {
    pub const OUT_OF_BOUNDS: u32 = 1;
    pub const MISALIGNED: u32 = 2;
    pub const TOO_LARGE: u32 = 3;
    pub const NOT_ALLOCATED: u32 = 4;

    pub const WGPU_OUT_OF_MEMORY: u32 = 100;
    pub const WGPU_VALIDATION: u32 = 101;
    pub const WGPU_INTERNAL: u32 = 102;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_error_display_names_location_and_taxonomy() {
        let location = Location::caller();
        let err = GpuError::from_message(DebugMessage::api_error(7, "bad write"), location);
        let text = err.to_string();

        assert!(text.starts_with(&format!("[{}:{}]", location.file(), location.line())));
        assert!(text.ends_with("[API;ERROR;HIGH][7]: bad write"), "{text}");
    }

    #[test]
    fn wgpu_validation_error_keeps_its_description() {
        let err = wgpu::Error::Validation {
            source: Box::new(fmt::Error),
            description: "Buffer is invalid\n".to_string(),
        };
        let msg = DebugMessage::from_wgpu(&err);
        assert!(msg.is_error());
        assert_eq!(msg.id, ids::WGPU_VALIDATION);
        assert_eq!(msg.message, "Buffer is invalid");
    }

    #[test]
    fn wgpu_out_of_memory_is_an_error() {
        let msg = DebugMessage::from_wgpu(&wgpu::Error::OutOfMemory {
            source: Box::new(fmt::Error),
        });
        assert!(msg.is_error());
        assert_eq!(msg.id, ids::WGPU_OUT_OF_MEMORY);
    }
}
