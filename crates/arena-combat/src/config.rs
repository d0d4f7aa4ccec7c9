//! Combat tuning configuration.
//!
//! Every timing and meter constant of the combat core lives here so a match
//! can be retuned from a TOML file without rebuilding. Missing fields fall
//! back to defaults; [`CombatConfig::validate`] clamps everything to a sane
//! range.

use arena_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "arena.toml";

/// Full combat configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Round and match settings.
    #[serde(rename = "match")]
    pub match_tuning: MatchTuning,
    /// Hit resolution settings.
    pub hit: HitTuning,
    /// Combo scaling settings.
    pub combo: ComboTuning,
    /// Meter gain and regeneration.
    pub meter: MeterTuning,
    /// Input buffering.
    pub input: InputTuning,
    /// Transformation timings.
    pub transform: TransformTuning,
    /// Screen feel effects.
    pub feel: FeelTuning,
}

/// Round and match settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Round length in seconds.
    pub round_time: f32,
    /// Post-hit invincibility applied to the defender, in frames.
    pub invincibility_frames: u32,
    /// Largest wall-clock delta consumed per update, in seconds.
    pub max_delta: f32,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            round_time: 99.0,
            invincibility_frames: 10,
            max_delta: 0.25,
        }
    }
}

/// Hit resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTuning {
    /// Defender-side cooldown after being hit, in frames.
    pub hit_cooldown_frames: u32,
}

impl Default for HitTuning {
    fn default() -> Self {
        Self {
            hit_cooldown_frames: 6,
        }
    }
}

/// Combo scaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    /// Seconds without a hit before the combo drops.
    pub timeout: f32,
    /// Damage scale lost per prior combo hit.
    pub decay_per_hit: f32,
    /// Lowest damage scale.
    pub min_scale: f32,
    /// Every Nth combo hit grants bonus synergy.
    pub bonus_interval: u32,
    /// Synergy granted on every Nth hit.
    pub bonus_synergy: f32,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            timeout: 1.75,
            decay_per_hit: 0.05,
            min_scale: 0.3,
            bonus_interval: 5,
            bonus_synergy: 20.0,
        }
    }
}

/// Meter gain and regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterTuning {
    /// Special meter gained per point of scaled damage.
    pub special_gain: f32,
    /// Ultimate meter gained per point of scaled damage.
    pub ultimate_gain: f32,
    /// Synergy meter gained per point of scaled damage.
    pub synergy_gain: f32,
    /// Passive special regeneration per second.
    pub special_regen: f32,
    /// Passive ultimate regeneration per second.
    pub ultimate_regen: f32,
    /// Synergy lost per second while no combo is running.
    pub synergy_decay: f32,
}

impl Default for MeterTuning {
    fn default() -> Self {
        Self {
            special_gain: 0.5,
            ultimate_gain: 0.2,
            synergy_gain: 0.25,
            special_regen: 1.0,
            ultimate_regen: 0.5,
            synergy_decay: 0.5,
        }
    }
}

/// Input buffering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTuning {
    /// Buffered inputs held while an attack is not cancelable.
    pub buffer_capacity: usize,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self { buffer_capacity: 2 }
    }
}

/// Transformation timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformTuning {
    /// Cinematic window on activation, in frames.
    pub cinematic_frames: u32,
}

impl Default for TransformTuning {
    fn default() -> Self {
        Self {
            cinematic_frames: 45,
        }
    }
}

/// Screen feel effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeelTuning {
    /// Enable screen shake (accessibility).
    pub screen_shake: bool,
    /// Shake intensity multiplier.
    pub shake_intensity: f32,
    /// Enable hit flashes (accessibility).
    pub flash: bool,
    /// Damage at or above which a hit is a legendary blow.
    pub legendary_threshold: f32,
}

impl Default for FeelTuning {
    fn default() -> Self {
        Self {
            screen_shake: true,
            shake_intensity: 1.0,
            flash: true,
            legendary_threshold: 30.0,
        }
    }
}

impl CombatConfig {
    /// Load configuration from a path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to a path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Match
        let m = &mut self.match_tuning;
        m.round_time = m.round_time.clamp(10.0, 999.0);
        m.invincibility_frames = m.invincibility_frames.clamp(0, 60);
        m.max_delta = m.max_delta.clamp(1.0 / 60.0, 1.0);

        // Hit
        self.hit.hit_cooldown_frames = self.hit.hit_cooldown_frames.clamp(0, 60);

        // Combo
        let c = &mut self.combo;
        c.timeout = c.timeout.clamp(0.25, 10.0);
        c.decay_per_hit = c.decay_per_hit.clamp(0.0, 0.5);
        c.min_scale = c.min_scale.clamp(0.05, 1.0);
        c.bonus_interval = c.bonus_interval.clamp(1, 100);
        c.bonus_synergy = c.bonus_synergy.clamp(0.0, 100.0);

        // Meters
        let r = &mut self.meter;
        r.special_gain = r.special_gain.clamp(0.0, 10.0);
        r.ultimate_gain = r.ultimate_gain.clamp(0.0, 10.0);
        r.synergy_gain = r.synergy_gain.clamp(0.0, 10.0);
        r.special_regen = r.special_regen.clamp(0.0, 100.0);
        r.ultimate_regen = r.ultimate_regen.clamp(0.0, 100.0);
        r.synergy_decay = r.synergy_decay.clamp(0.0, 100.0);

        // Input
        self.input.buffer_capacity = self.input.buffer_capacity.clamp(1, 8);

        // Transformation
        self.transform.cinematic_frames = self.transform.cinematic_frames.clamp(0, 600);

        // Feel
        self.feel.shake_intensity = self.feel.shake_intensity.clamp(0.0, 2.0);
        self.feel.legendary_threshold = self.feel.legendary_threshold.max(0.0);
    }
}
