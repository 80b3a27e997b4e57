use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub api_keys: ApiKeySettings,
    pub compliance: ComplianceSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

/// Presence of a key decides whether the matching provider registers
/// enabled. The OpenAI key switches enrichment on.
#[derive(Deserialize, Clone, Default)]
pub struct ApiKeySettings {
    pub google_places: Option<String>,
    pub yelp: Option<String>,
    pub foursquare: Option<String>,
    pub openai: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct ComplianceSettings {
    pub kill_switch: bool,
}

#[derive(Deserialize, Clone)]
pub struct RateLimitSettings {
    pub capacity: u32,
    pub refill_interval_secs: u64,
}

impl RateLimitSettings {
    /// Tokens per millisecond for a full refill over the interval.
    pub fn refill_rate_per_ms(&self) -> f64 {
        self.capacity as f64 / (self.refill_interval_secs as f64 * 1000.0)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refill_rate_matches_production_posture() {
        let settings = RateLimitSettings {
            capacity: 10,
            refill_interval_secs: 3600,
        };
        // 10 tokens over one hour.
        let per_hour = settings.refill_rate_per_ms() * 3600.0 * 1000.0;
        assert!((per_hour - 10.0).abs() < 1e-9);
    }
}
