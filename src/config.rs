use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::types::Config;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }
    
    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }
    
    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let defaults = Config::default();

    let collect_interval = match env.get_var("COLLECT_INTERVAL_SECONDS") {
        Some(v) => {
            let secs: u64 = v.trim().parse().context("Invalid COLLECT_INTERVAL_SECONDS")?;
            if secs == 0 {
                return Err(anyhow!("COLLECT_INTERVAL_SECONDS must be greater than zero"));
            }
            Duration::from_secs(secs)
        }
        None => defaults.collect_interval,
    };

    let metrics_port: u16 = match env.get_var("METRICS_PORT") {
        Some(v) => v.trim().parse().context("Invalid METRICS_PORT")?,
        None => defaults.metrics_port,
    };

    // Unset means no timeout: a hung list call stalls that tick
    let fetch_timeout = match env.get_var("FETCH_TIMEOUT_SECONDS") {
        Some(v) if !v.trim().is_empty() => {
            let secs: u64 = v.trim().parse().context("Invalid FETCH_TIMEOUT_SECONDS")?;
            if secs == 0 {
                return Err(anyhow!("FETCH_TIMEOUT_SECONDS must be greater than zero"));
            }
            Some(Duration::from_secs(secs))
        }
        _ => defaults.fetch_timeout,
    };

    let evict_stale_series = env.get_var("EVICT_STALE_SERIES")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(defaults.evict_stale_series);

    Ok(Config {
        collect_interval,
        metrics_port,
        fetch_timeout,
        evict_stale_series,
    })
}
