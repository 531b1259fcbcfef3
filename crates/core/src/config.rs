use serde::Deserialize;

/// Root configuration for an audience context. Loaded from environment
/// variables with the prefix `AUDIENCE__` and an optional TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AudienceConfig {
    #[serde(default)]
    pub lookup_miss: MissPolicy,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// What a lookup of an unregistered segment name resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissPolicy {
    /// Fail with `AudienceError::NotFound`.
    #[default]
    Strict,
    /// Resolve to the built-in `none` segment.
    FallbackNone,
}

fn default_batch_size() -> usize {
    1000
}
fn default_log_filter() -> String {
    "audience=info".to_string()
}

impl Default for AudienceConfig {
    fn default() -> Self {
        Self {
            lookup_miss: MissPolicy::default(),
            batch_size: default_batch_size(),
            log_filter: default_log_filter(),
        }
    }
}

impl AudienceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, overridden by
    /// environment variables.
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("AUDIENCE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
