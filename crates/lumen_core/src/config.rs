//! Render configuration.
//!
//! Every tunable of the tracer and the progressive integrator lives here,
//! with documented defaults. Each struct deserializes from the optional
//! `render` / `preview` sections of a scene file; missing fields fall back
//! to [`Default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration cannot drive a render.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("alpha must lie in (0, 1), got {0}")]
    Alpha(f32),

    #[error("initial radius must be positive, got {0}")]
    Radius(f32),

    #[error("initial photon count must be positive, got {0}")]
    InitialCount(f32),

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("diffuse bounce probability must lie in [0, 1], got {0}")]
    BounceProbability(f32),

    #[error("{name} must be non-negative and finite, got {value}")]
    Threshold { name: &'static str, value: f32 },
}

/// Thresholds shared by every ray the photon tracer follows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Intersections nearer than this are ignored (self-intersection guard)
    pub min_time: f32,
    /// Power magnitudes at or below this are dropped
    pub min_power: f32,
    /// Probability of continuing a diffuse bounce when diffuse sampling is on
    pub diffuse_bounce_probability: f32,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            min_time: 1e-3,
            min_power: 1e-4,
            diffuse_bounce_probability: 0.2,
        }
    }
}

impl TracerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("min_time", self.min_time), ("min_power", self.min_power)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.diffuse_bounce_probability) {
            return Err(ConfigError::BounceProbability(self.diffuse_bounce_probability));
        }
        Ok(())
    }
}

/// Stochastic progressive photon mapping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SppmConfig {
    pub tracer: TracerConfig,
    /// Number of forward/update iterations after the initial camera pass
    pub passes: u32,
    /// Photons emitted by each light per pass
    pub photons_per_light: u32,
    /// Bounce budget of a photon path
    pub photon_depth: u32,
    /// Bounce budget of a camera path (specular chains only)
    pub view_depth: u32,
    /// Jittered camera rays per pixel in the initial pass
    pub samples_per_pixel: u32,
    /// Prior photon count `N0` of every view point
    pub initial_count: f32,
    /// Initial search radius `R0`
    pub initial_radius: f32,
    /// Fraction of newly gathered photons kept per pass
    pub alpha: f32,
    /// Scale of the deposit seeded at each emitted photon's origin
    pub light_origin_gain: f32,
    /// Photons traced per parallel work item during the forward pass
    pub photon_chunk_size: u32,
    /// Base seed; every pass, light and chunk derive their own stream from it
    pub seed: u64,
}

impl Default for SppmConfig {
    fn default() -> Self {
        Self {
            tracer: TracerConfig::default(),
            passes: 100,
            photons_per_light: 100_000,
            photon_depth: 20,
            view_depth: 5,
            samples_per_pixel: 10,
            initial_count: 50.0,
            initial_radius: 0.5,
            alpha: 0.7,
            light_origin_gain: 10.0,
            photon_chunk_size: 4096,
            seed: 0x5eed,
        }
    }
}

impl SppmConfig {
    /// Check every tunable before a render starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracer.validate()?;
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        if !(self.initial_radius > 0.0 && self.initial_radius.is_finite()) {
            return Err(ConfigError::Radius(self.initial_radius));
        }
        if !(self.initial_count > 0.0 && self.initial_count.is_finite()) {
            return Err(ConfigError::InitialCount(self.initial_count));
        }
        for (name, value) in [
            ("photons_per_light", self.photons_per_light),
            ("photon_depth", self.photon_depth),
            ("view_depth", self.view_depth),
            ("samples_per_pixel", self.samples_per_pixel),
            ("photon_chunk_size", self.photon_chunk_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if !(self.light_origin_gain >= 0.0 && self.light_origin_gain.is_finite()) {
            return Err(ConfigError::Threshold {
                name: "light_origin_gain",
                value: self.light_origin_gain,
            });
        }
        Ok(())
    }
}

/// Direct-lighting preview settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub tracer: TracerConfig,
    pub samples_per_pixel: u32,
    /// Mirror bounces followed before giving up
    pub max_depth: u32,
    /// Side length of a render bucket in pixels
    pub bucket_size: u32,
    pub seed: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            tracer: TracerConfig::default(),
            samples_per_pixel: 4,
            max_depth: 5,
            bucket_size: 32,
            seed: 0x5eed,
        }
    }
}

impl PreviewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracer.validate()?;
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::Zero("samples_per_pixel"));
        }
        if self.bucket_size == 0 {
            return Err(ConfigError::Zero("bucket_size"));
        }
        Ok(())
    }
}
