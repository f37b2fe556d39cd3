use serde::Deserialize;

use crate::collision::TieBreak;
use crate::geometry::Vec2;
use crate::tile_callback::UnknownCallbackPolicy;

pub const MAX_SCALING_FACTOR: u32 = 64;
/// Upper bound for source pixel sizes (character and tile).
pub const MAX_SOURCE_PIXELS: u32 = 4096;

/// World and character tuning. Every field is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Added to vertical velocity every frame.
    pub gravity: f32,
    /// Per-axis velocity limit applied before each tick. Keep it below the
    /// smallest solid tile extent.
    pub max_velocity: f32,
    pub character_speed: f32,
    pub jump_strength: f32,
    /// Character sprite size in pixels before scaling.
    pub character_width: u32,
    pub character_height: u32,
    /// Source tile edge in pixels before scaling.
    pub tile_size: u32,
    pub scaling_factor: u32,
    pub tie_break: TieBreak,
    pub unknown_callback: UnknownCallbackPolicy,
    /// Seed for level picks made by ladders. Random when absent.
    pub rng_seed: Option<u64>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.9,
            max_velocity: 15.0,
            character_speed: 5.0,
            jump_strength: 15.0,
            character_width: 16,
            character_height: 16,
            tile_size: 16,
            scaling_factor: 3,
            tie_break: TieBreak::LastCandidate,
            unknown_callback: UnknownCallbackPolicy::Reject,
            rng_seed: None,
        }
    }
}

impl PhysicsConfig {
    pub fn scale(&self) -> f32 {
        self.scaling_factor as f32
    }

    /// Edge of one grid cell in world units.
    pub fn cell_size(&self) -> f32 {
        self.tile_size as f32 * self.scale()
    }

    /// Character extent in world units.
    pub fn character_size(&self) -> Vec2 {
        Vec2::new(
            self.character_width as f32 * self.scale(),
            self.character_height as f32 * self.scale(),
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("gravity", self.gravity),
            ("max_velocity", self.max_velocity),
            ("character_speed", self.character_speed),
            ("jump_strength", self.jump_strength),
        ] {
            if !value.is_finite() {
                return Err(format!("{field} must be a finite number, got {value}"));
            }
        }
        if self.max_velocity < 0.0 {
            return Err(format!(
                "max_velocity must not be negative, got {}",
                self.max_velocity
            ));
        }
        if !(1..=MAX_SCALING_FACTOR).contains(&self.scaling_factor) {
            return Err(format!(
                "scaling_factor must be in 1..={MAX_SCALING_FACTOR}, got {}",
                self.scaling_factor
            ));
        }
        for (field, value) in [
            ("character_width", self.character_width),
            ("character_height", self.character_height),
            ("tile_size", self.tile_size),
        ] {
            if !(1..=MAX_SOURCE_PIXELS).contains(&value) {
                return Err(format!(
                    "{field} must be in 1..={MAX_SOURCE_PIXELS}, got {value}"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config: PhysicsConfig = serde_json::from_value(serde_json::json!({
            "gravity": 0.5,
            "tie_break": "nearest_boundary",
            "rng_seed": 9
        }))
        .expect("config");

        assert_eq!(config.gravity, 0.5);
        assert_eq!(config.tie_break, TieBreak::NearestBoundary);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.max_velocity, 15.0);
        assert_eq!(config.cell_size(), 48.0);
    }

    #[test]
    fn defaults_pass_validation() {
        let config = PhysicsConfig::default();
        config.validate().expect("defaults");
        assert_eq!(config.character_size(), Vec2::new(48.0, 48.0));
    }

    #[test]
    fn negative_or_nan_max_velocity_is_rejected() {
        let config = PhysicsConfig {
            max_velocity: -1.0,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("negative").contains("max_velocity"));

        let config = PhysicsConfig {
            max_velocity: f32::NAN,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("nan").contains("max_velocity"));

        let config = PhysicsConfig {
            gravity: f32::INFINITY,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("infinite").contains("gravity"));
    }

    #[test]
    fn sizes_and_scale_must_be_in_range() {
        let config = PhysicsConfig {
            scaling_factor: 4_000_000_000,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("huge").contains("scaling_factor"));
        assert_eq!(config.cell_size(), 16.0 * 4_000_000_000_f32);

        let config = PhysicsConfig {
            scaling_factor: 0,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("zero").contains("scaling_factor"));

        let config = PhysicsConfig {
            tile_size: 0,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("tile").contains("tile_size"));

        let config = PhysicsConfig {
            character_height: MAX_SOURCE_PIXELS + 1,
            ..PhysicsConfig::default()
        };
        assert!(config.validate().expect_err("tall").contains("character_height"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<PhysicsConfig>(serde_json::json!({
            "gravty": 0.5
        }));
        assert!(result.is_err());
    }
}
