use thiserror::Error;

pub const REGION_VAR: &str = "REMOTION_APP_REGION";
pub const FUNCTION_NAME_VAR: &str = "REMOTION_APP_FUNCTION_NAME";
pub const SERVE_URL_VAR: &str = "REMOTION_APP_SERVE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Connection settings for one deployed render function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub region: String,
    pub function_name: String,
    pub serve_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads each variable through `lookup`. Absent and empty values are both
    /// treated as missing; only presence is checked.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            region: require(REGION_VAR)?,
            function_name: require(FUNCTION_NAME_VAR)?,
            serve_url: require(SERVE_URL_VAR)?,
        })
    }
}
