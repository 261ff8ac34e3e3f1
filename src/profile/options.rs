//! Per-pair behavior flags

use config::PipelineConfig;

/// Flags a profile may set; unset flags fall back to the pipeline defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub failed_to_find_is_error: Option<bool>,
    pub use_projection: Option<bool>,
    pub emit_signals: Option<bool>,
}

impl Options {
    /// Overwrite with every flag `other` sets
    pub fn merge(&mut self, other: &Options) {
        if other.failed_to_find_is_error.is_some() {
            self.failed_to_find_is_error = other.failed_to_find_is_error;
        }
        if other.use_projection.is_some() {
            self.use_projection = other.use_projection;
        }
        if other.emit_signals.is_some() {
            self.emit_signals = other.emit_signals;
        }
    }

    pub fn resolve(&self, defaults: &PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            failed_to_find_is_error: self
                .failed_to_find_is_error
                .unwrap_or(defaults.failed_to_find_is_error),
            use_projection: self.use_projection.unwrap_or(defaults.use_projection),
            emit_signals: self.emit_signals.unwrap_or(defaults.emit_signals),
        }
    }
}
