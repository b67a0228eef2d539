use crate::domain::Domain;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for the simulation domain bounds
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DomainConfig {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

// Configuration for the two walker populations
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PopulationsConfig {
    pub count_red: u32,
    pub count_blue: u32,
    pub step_scale_red: f32,
    pub step_scale_blue: f32,
    pub bias_x_red: f32,
    pub bias_x_blue: f32,
    #[serde(default = "default_spread_fraction")]
    pub spread_fraction: f32,
    pub seed: u64,
}

fn default_spread_fraction() -> f32 {
    0.2 // Initial placement covers the central 20% of the domain extent
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_ticks: u32,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub frame_rate: u32,
    pub format: Option<String>, // Frame stream format: "bincode", "jsonl"
    #[serde(default = "default_save_positions")]
    pub save_positions: bool,
}

fn default_save_positions() -> bool {
    false
}

/// Per-population parameters handed to the engine at construction time.
#[derive(Debug, Clone, Copy)]
pub struct PopulationParams {
    pub count: u32,
    pub step_scale: f32,
    pub bias_x: f32,
    pub spread_fraction: f32,
    pub seed: u64,
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WalkConfig {
    pub domain: DomainConfig,
    pub populations: PopulationsConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl WalkConfig {
    /// Loads the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a TOML configuration string.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: WalkConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects precondition violations before the run starts.
    fn validate(&self) -> Result<()> {
        // Domain::new carries the degenerate-bounds checks.
        let _ = self.domain()?;

        if self.populations.count_red == 0 {
            anyhow::bail!("count_red must be greater than 0.");
        }
        if self.populations.count_blue == 0 {
            anyhow::bail!("count_blue must be greater than 0.");
        }
        if self.populations.step_scale_red <= 0.0 {
            anyhow::bail!("step_scale_red must be positive.");
        }
        if self.populations.step_scale_blue <= 0.0 {
            anyhow::bail!("step_scale_blue must be positive.");
        }
        let spread = self.populations.spread_fraction;
        if !(spread > 0.0 && spread <= 1.0) {
            anyhow::bail!("spread_fraction must lie in (0, 1], got {}.", spread);
        }
        if self.timing.total_ticks == 0 {
            anyhow::bail!("total_ticks must be greater than 0.");
        }
        if self.output.frame_rate == 0 {
            anyhow::bail!("frame_rate must be greater than 0.");
        }
        Ok(())
    }

    /// Builds the validated runtime domain value.
    pub fn domain(&self) -> Result<Domain> {
        Domain::new(
            self.domain.min_x,
            self.domain.max_x,
            self.domain.min_y,
            self.domain.max_y,
        )
    }

    /// Parameters for the red population.
    pub fn red_params(&self) -> PopulationParams {
        PopulationParams {
            count: self.populations.count_red,
            step_scale: self.populations.step_scale_red,
            bias_x: self.populations.bias_x_red,
            spread_fraction: self.populations.spread_fraction,
            seed: self.populations.seed,
        }
    }

    /// Parameters for the blue population. The seed is offset so the two
    /// populations draw from distinct deterministic streams.
    pub fn blue_params(&self) -> PopulationParams {
        PopulationParams {
            count: self.populations.count_blue,
            step_scale: self.populations.step_scale_blue,
            bias_x: self.populations.bias_x_blue,
            spread_fraction: self.populations.spread_fraction,
            seed: self.populations.seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        [domain]
        min_x = 0.0
        max_x = 10.0
        min_y = 0.0
        max_y = 10.0

        [populations]
        count_red = 50
        count_blue = 50
        step_scale_red = 0.05
        step_scale_blue = 0.10
        bias_x_red = 0.01
        bias_x_blue = -0.01
        seed = 42

        [timing]
        total_ticks = 1000

        [output]
        base_filename = "walkers"
        frame_rate = 15
    "#;

    #[test]
    fn test_parse_valid_config() {
        let config = WalkConfig::from_toml_str(VALID).unwrap();
        assert_eq!(config.populations.count_red, 50);
        assert_eq!(config.populations.spread_fraction, 0.2); // serde default
        assert!(!config.output.save_positions); // serde default
        assert_eq!(config.timing.total_ticks, 1000);
        assert!(config.output.format.is_none());

        let red = config.red_params();
        let blue = config.blue_params();
        assert_eq!(red.count, 50);
        assert_eq!(red.bias_x, 0.01);
        assert_eq!(blue.bias_x, -0.01);
        assert_ne!(red.seed, blue.seed);
    }

    #[test]
    fn test_rejects_inverted_domain() {
        let bad = VALID.replace("max_x = 10.0", "max_x = -1.0");
        assert!(WalkConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_rejects_zero_count() {
        let bad = VALID.replace("count_red = 50", "count_red = 0");
        assert!(WalkConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_rejects_nonpositive_step_scale() {
        let bad = VALID.replace("step_scale_blue = 0.10", "step_scale_blue = 0.0");
        assert!(WalkConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_rejects_bad_spread_fraction() {
        let bad = VALID.replace("seed = 42", "spread_fraction = 1.5\n        seed = 42");
        assert!(WalkConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_rejects_zero_ticks() {
        let bad = VALID.replace("total_ticks = 1000", "total_ticks = 0");
        assert!(WalkConfig::from_toml_str(&bad).is_err());
    }
}
