use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_key: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub cors_origin: String,
    pub scoreboard_size: usize,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            redis_url: try_load("REDIS_URL", "redis://redis:6379"),
            openai_base_url: try_load("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: try_load("OPENAI_MODEL", "gpt-4o-mini"),
            openai_key: read_secret("OPENAI_API_KEY"),
            supabase_url: try_load("SUPABASE_URL", "http://supabase:8000"),
            supabase_anon_key: read_secret("SUPABASE_ANON_KEY"),
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:5173"),
            scoreboard_size: try_load("SCOREBOARD_SIZE", "10"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Docker secret file first, then a plain env var for local runs.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            info!("Failed to read {secret_name} from file ({e}), trying environment");
            env::var(secret_name).map(|s| s.trim().to_string())
        })
        .map_err(|e| {
            warn!("Secret {secret_name} unavailable: {e}");
        })
        .expect("Secrets misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("RIDDLE_TEST_PORT_UNSET", "4242");
        assert_eq!(port, 4242);
    }

    #[test]
    #[should_panic(expected = "Environment misconfigured!")]
    fn test_try_load_rejects_unparsable_default() {
        let _: u16 = try_load("RIDDLE_TEST_PORT_UNSET_TOO", "not-a-port");
    }
}
