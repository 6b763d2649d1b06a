//! Open-call configuration.

use crate::{Error, OpenParams, Result};

/// Parsed configuration for opening a device.
///
/// These are the values the caller *requests*; hardware backends record what
/// the OS actually grants separately.
#[derive(Debug, Clone)]
pub struct OpenConfig {
    pub num_channels: usize,
    pub sample_rate: u32,
    pub period_size: usize,
    /// Generator only.
    pub frequency: f32,
    /// JACK only.
    pub client_name: String,
}

impl Default for OpenConfig {
    fn default() -> Self {
        Self {
            num_channels: 2,
            sample_rate: 48000,
            period_size: 1024,
            frequency: 440.0,
            client_name: "wavetap".to_string(),
        }
    }
}

impl OpenConfig {
    /// Parse from an open-call parameter map.
    ///
    /// Missing keys fall back to defaults; unknown keys are ignored.
    pub fn from_params(params: &OpenParams) -> Self {
        let defaults = Self::default();
        Self {
            num_channels: params
                .get("num-channels")
                .and_then(|v| v.as_i64())
                .map(|n| n.max(0) as usize)
                .unwrap_or(defaults.num_channels),
            sample_rate: params
                .get("sample-rate")
                .and_then(|v| v.as_i64())
                .map(|n| n.max(0) as u32)
                .unwrap_or(defaults.sample_rate),
            period_size: params
                .get("period-size")
                .and_then(|v| v.as_i64())
                .map(|n| n.max(0) as usize)
                .unwrap_or(defaults.period_size),
            frequency: params
                .get("frequency")
                .and_then(|v| v.as_f32())
                .unwrap_or(defaults.frequency),
            client_name: params
                .get("client-name")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(defaults.client_name),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_channels == 0 || self.num_channels > 64 {
            return Err(Error::InvalidConfig(format!(
                "num-channels {} out of range (1-64)",
                self.num_channels
            )));
        }
        if self.sample_rate < 8000 || self.sample_rate > 384_000 {
            return Err(Error::InvalidConfig(format!(
                "sample-rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.period_size < 16 || self.period_size > 1 << 20 {
            return Err(Error::InvalidConfig(format!(
                "period-size {} out of range (16-1048576)",
                self.period_size
            )));
        }
        if self.frequency <= 0.0 || self.frequency >= self.sample_rate as f32 / 2.0 {
            return Err(Error::InvalidConfig(format!(
                "frequency {} outside (0, nyquist)",
                self.frequency
            )));
        }
        Ok(())
    }

    /// Ring capacity used for each channel of a live device.
    ///
    /// Enough for several periods so a slow consumer still sees a full
    /// window between reads.
    pub fn ring_capacity(&self) -> usize {
        self.period_size * 8
    }
}
