use crate::{color::Rgb, error::FieldError};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of a particle field.
///
/// Missing fields take their [`Default`] values when deserializing, so a
/// config file only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of particles in the pool.
    pub quantity: usize,
    /// Resistance to pointer attraction; higher means a weaker pull.
    pub staticity: f32,
    /// Smoothing divisor for the render offset; higher means slower response.
    pub ease: f32,
    /// Base particle radius; each particle adds 0 or 1 to it.
    pub size: f32,
    /// Tint as a 3- or 6-digit hex string, with or without `#`.
    pub color: String,
    /// Uniform velocity added to every particle each frame (`vx`, `vy`).
    pub drift: Vec2,
    /// Bumping this counter forces the pool to be regenerated.
    pub refresh: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            quantity: 100,
            staticity: 50.0,
            ease: 50.0,
            size: 0.4,
            color: "#ffffff".to_owned(),
            drift: Vec2::ZERO,
            refresh: 0,
        }
    }
}

impl FieldConfig {
    /// The tint this configuration resolves to. Never fails.
    pub fn tint(&self) -> Rgb {
        Rgb::from_hex_lossy(&self.color)
    }

    /// Checks that the configuration describes a well-behaved field.
    ///
    /// The engine runs with any configuration; this is for hosts that load
    /// settings from outside and want to reject nonsense early.
    pub fn validate(&self) -> Result<(), FieldError> {
        positive("staticity", self.staticity)?;
        positive("ease", self.ease)?;
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(FieldError::InvalidParameter {
                name: "size",
                value: self.size,
                reason: "must be finite and non-negative",
            });
        }
        for (name, value) in [("vx", self.drift.x), ("vy", self.drift.y)] {
            if !value.is_finite() {
                return Err(FieldError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
        }
        self.color.parse::<Rgb>()?;
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), FieldError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FieldError::InvalidParameter {
            name,
            value,
            reason: "must be finite and greater than zero",
        })
    }
}
