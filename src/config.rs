//! Engine configuration.
//!
//! Controls float printing precision, skip-list aggregation parameters and the
//! spare capacity reserved by appendable sequences.
use serde::de::Error;

/// Default number of decimal digits printed for floats.
pub const DEFAULT_FLOAT_DIGITS: usize = 15;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum number of decimal digits when printing floats
    #[serde(default = "Config::default_float_digits")]
    pub float_digits: usize,

    /// Skip-list aggregation parameters
    #[serde(default)]
    pub skiplist: SkipListConfig,

    /// Spare capacity of appendable sequences
    #[serde(default)]
    pub append: AppendConfig,
}

/// Parameters of the aggregation skip list
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkipListConfig {
    /// Maximum node height
    #[serde(default = "SkipListConfig::default_max_level")]
    pub max_level: usize,

    /// Number of node slots allocated up front
    #[serde(default = "SkipListConfig::default_initial_capacity")]
    pub initial_capacity: usize,

    /// Seed of the level generator; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SkipListConfig {
    const fn default_max_level() -> usize {
        32
    }

    const fn default_initial_capacity() -> usize {
        64
    }
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            max_level: Self::default_max_level(),
            initial_capacity: Self::default_initial_capacity(),
            seed: None,
        }
    }
}

/// Spare capacity reserved by appendable sequences
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendConfig {
    /// Instant slots reserved when a sequence starts growing by appends
    #[serde(default = "AppendConfig::default_initial_maxcount")]
    pub initial_maxcount: usize,

    /// Multiplier applied to `maxcount` when the slots are exhausted
    #[serde(default = "AppendConfig::default_growth_factor")]
    pub growth_factor: usize,
}

impl AppendConfig {
    const fn default_initial_maxcount() -> usize {
        64
    }

    const fn default_growth_factor() -> usize {
        2
    }
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            initial_maxcount: Self::default_initial_maxcount(),
            growth_factor: Self::default_growth_factor(),
        }
    }
}

impl Config {
    const fn default_float_digits() -> usize {
        DEFAULT_FLOAT_DIGITS
    }

    pub fn with_float_digits(mut self, digits: usize) -> Self {
        self.float_digits = digits;
        self
    }

    pub fn with_skiplist(mut self, skiplist: SkipListConfig) -> Self {
        self.skiplist = skiplist;
        self
    }

    pub fn with_skiplist_seed(mut self, seed: u64) -> Self {
        self.skiplist.seed = Some(seed);
        self
    }

    pub fn with_append(mut self, append: AppendConfig) -> Self {
        self.append = append;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.float_digits > 17 {
            return Err(format!(
                "Float digits must be at most 17, got {}",
                self.float_digits
            ));
        }

        if self.skiplist.max_level == 0 || self.skiplist.max_level > 64 {
            return Err("Skip list max level must be in [1, 64]".to_string());
        }

        if self.skiplist.initial_capacity < 2 {
            return Err("Skip list initial capacity must be at least 2".to_string());
        }

        if self.append.initial_maxcount == 0 {
            return Err("Initial maxcount must be greater than zero".to_string());
        }

        if self.append.growth_factor < 2 {
            return Err("Growth factor must be at least 2".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            float_digits: Self::default_float_digits(),
            skiplist: SkipListConfig::default(),
            append: AppendConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.float_digits, 15);
        assert_eq!(config.skiplist.max_level, 32);
        assert_eq!(config.append.growth_factor, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default().with_float_digits(6).with_skiplist_seed(7);
        let json = config.to_json().unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_json_defaults_and_validation() {
        let parsed = Config::from_json(r#"{"float_digits": 3}"#).unwrap();
        assert_eq!(parsed.float_digits, 3);
        assert_eq!(parsed.skiplist, SkipListConfig::default());

        assert!(Config::from_json(r#"{"skiplist": {"max_level": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"unknown": 1}"#).is_err());
    }
}
