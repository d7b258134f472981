use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Steering tunables. All constants here are empirical; none of them is a
/// physical law of the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub id: String,
    pub description: String,

    /// Thrust floor. The look-ahead bots raise it on straight lines; the
    /// drift bots clamp their blended thrust to it.
    pub min_thrust: f64,
    pub max_thrust: f64,

    /// Multiplier turning the current speed into a braking distance. Must
    /// match the speed units of the bot: turns when velocity is reported,
    /// seconds when it is derived from wall-clock position deltas.
    pub speed_horizon: f64,

    /// Weight of the distance factor in the simple thrust blend; the angle
    /// factor gets the remainder.
    pub distance_weight: f64,

    // Look-ahead
    pub lookahead_cone_deg: f64,
    pub calibrate_aim: bool,

    // Boost gates
    pub boost_charges: u32,
    pub boost_min_dist_factor: f64,
    pub boost_max_bearing_deg: f64,
    pub boost_min_speed: f64,

    /// Lap count assumed when the protocol does not report it.
    pub laps: u32,
    pub use_library: bool,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            id: "squad-lookahead".to_string(),
            description: "Two-pod look-ahead racer on a known circuit.".to_string(),
            min_thrust: 10.0,
            max_thrust: 100.0,
            speed_horizon: 10.0,
            distance_weight: 0.7,
            lookahead_cone_deg: 30.0,
            calibrate_aim: true,
            boost_charges: 1,
            boost_min_dist_factor: 0.8,
            boost_max_bearing_deg: 10.0,
            boost_min_speed: 8_000.0,
            laps: 3,
            use_library: true,
        }
    }
}

impl SteeringConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "squad-lookahead" => Some(Self::default()),
            "circuit-scout" => Some(Self {
                id: "circuit-scout".to_string(),
                description: "Single pod that learns the circuit and looks one checkpoint ahead."
                    .to_string(),
                // 10 turns of 75ms each; speed is in units per second here.
                speed_horizon: 0.75,
                ..Self::default()
            }),
            "drift-blend" => Some(Self {
                id: "drift-blend".to_string(),
                description: "Single pod, 70/30 distance/angle thrust blend.".to_string(),
                min_thrust: 0.0,
                speed_horizon: 0.75,
                distance_weight: 0.7,
                calibrate_aim: false,
                use_library: false,
                ..Self::default()
            }),
            "drift-basic" => Some(Self {
                id: "drift-basic".to_string(),
                description: "Single pod, 80/20 distance/angle thrust blend.".to_string(),
                min_thrust: 0.0,
                speed_horizon: 0.75,
                distance_weight: 0.8,
                calibrate_aim: false,
                use_library: false,
                ..Self::default()
            }),
            _ => None,
        }
    }

    /// Loads the JSON object at `path` on top of `base`; fields the file
    /// leaves out keep the value from `base`.
    pub fn from_file(path: &Path, base: &Self) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        let overrides: serde_json::Value = serde_json::from_slice(&data)
            .with_context(|| format!("invalid config json {}", path.display()))?;
        let Some(overrides) = overrides.as_object() else {
            return Err(anyhow!("config {} must be a json object", path.display()));
        };

        let mut merged = serde_json::to_value(base).context("failed to serialize base config")?;
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in overrides {
                fields.insert(key.clone(), value.clone());
            }
        }
        let mut cfg: Self = serde_json::from_value(merged)
            .with_context(|| format!("invalid config fields in {}", path.display()))?;
        cfg.clamp();
        Ok(cfg)
    }

    /// Preset for `bot_id`, overridden field by field by the file at `path`.
    pub fn resolve(bot_id: &str, path: Option<&Path>) -> Result<Self> {
        let preset =
            Self::preset(bot_id).ok_or_else(|| anyhow!("no preset for bot '{bot_id}'"))?;
        match path {
            Some(path) => Self::from_file(path, &preset),
            None => Ok(preset),
        }
    }

    pub fn clamp(&mut self) {
        self.max_thrust = self.max_thrust.clamp(0.0, 100.0);
        self.min_thrust = self.min_thrust.clamp(0.0, self.max_thrust);
        self.speed_horizon = self.speed_horizon.clamp(0.01, 100.0);
        self.distance_weight = self.distance_weight.clamp(0.0, 1.0);
        self.lookahead_cone_deg = self.lookahead_cone_deg.clamp(0.0, 90.0);
        self.boost_min_dist_factor = self.boost_min_dist_factor.clamp(0.0, 1.0);
        self.boost_max_bearing_deg = self.boost_max_bearing_deg.clamp(0.0, 180.0);
        self.boost_min_speed = self.boost_min_speed.max(0.0);
        self.laps = self.laps.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_survives_clamping() {
        for name in ["squad-lookahead", "circuit-scout", "drift-blend", "drift-basic"] {
            let cfg = SteeringConfig::preset(name).unwrap();
            assert_eq!(cfg.id, name);
            let mut clamped = cfg.clone();
            clamped.clamp();
            assert_eq!(clamped, cfg, "preset {name} is outside clamp ranges");
        }
        assert!(SteeringConfig::preset("nope").is_none());
    }

    #[test]
    fn clamp_keeps_thrust_ordered() {
        let mut cfg = SteeringConfig {
            min_thrust: 150.0,
            max_thrust: 120.0,
            laps: 0,
            ..SteeringConfig::default()
        };
        cfg.clamp();
        assert_eq!(cfg.max_thrust, 100.0);
        assert_eq!(cfg.min_thrust, 100.0);
        assert_eq!(cfg.laps, 1);
    }

    #[test]
    fn partial_file_keeps_the_bot_preset() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cfg.json");
        fs::write(&path, br#"{ "id": "custom", "min_thrust": 25.0, "max_thrust": 400.0 }"#)?;

        let preset = SteeringConfig::preset("drift-basic").unwrap();
        let cfg = SteeringConfig::resolve("drift-basic", Some(&path))?;
        assert_eq!(cfg.id, "custom");
        assert_eq!(cfg.min_thrust, 25.0);
        assert_eq!(cfg.max_thrust, 100.0);
        assert_eq!(cfg.speed_horizon, 0.75);
        assert_eq!(cfg.distance_weight, preset.distance_weight);
        assert_eq!(cfg.calibrate_aim, preset.calibrate_aim);
        assert_eq!(cfg.use_library, preset.use_library);
        Ok(())
    }

    #[test]
    fn single_field_override_leaves_the_rest_of_the_preset() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cfg.json");
        fs::write(&path, br#"{ "max_thrust": 90.0 }"#)?;

        let cfg = SteeringConfig::resolve("drift-basic", Some(&path))?;
        assert_eq!(
            cfg,
            SteeringConfig {
                max_thrust: 90.0,
                ..SteeringConfig::preset("drift-basic").unwrap()
            }
        );
        Ok(())
    }

    #[test]
    fn config_file_must_be_an_object() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cfg.json");
        fs::write(&path, b"[1, 2]")?;
        assert!(SteeringConfig::resolve("drift-basic", Some(&path)).is_err());
        assert!(SteeringConfig::resolve("warp-drive", Some(&path)).is_err());
        Ok(())
    }
}
