use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use ridestream_sim::{GeneratorConfig, SimClock, SurgeConfig};
use ridestream_store::{is_valid_table_name, DEFAULT_TABLE};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOPIC: &str = "uber-ride-topic";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_db_path() -> String {
    "data/ridestream.db".to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Empty disables alert delivery; trips are still stored.
    #[serde(default)]
    pub webhook_url: String,
}

impl NotifyConfig {
    pub fn webhook(&self) -> Option<&str> {
        let url = self.webhook_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: Option<u64>,
    pub utc_offset_hours: i32,
    pub jump_min_secs: u32,
    pub jump_max_secs: u32,
    pub pace_ms: u64,
    pub surge_ceiling: f64,
    pub dq_missing_rate: f64,
    pub malformed_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            utc_offset_hours: 7,
            jump_min_secs: 15,
            jump_max_secs: 60,
            pace_ms: 200,
            surge_ceiling: ridestream_sim::DEFAULT_SURGE_CEILING,
            dq_missing_rate: ridestream_sim::DEFAULT_DQ_MISSING_RATE,
            malformed_rate: ridestream_sim::DEFAULT_MALFORMED_RATE,
        }
    }
}

impl SimulationConfig {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            surge: SurgeConfig {
                ceiling: self.surge_ceiling,
                ..SurgeConfig::default()
            },
            dq_missing_rate: self.dq_missing_rate,
            malformed_rate: self.malformed_rate,
        }
    }

    pub fn clock(&self) -> SimClock {
        SimClock::starting_now(self.utc_offset_hours, self.jump_min_secs, self.jump_max_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidestreamConfig {
    pub app: AppConfig,
    pub transport: TransportConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);

        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let key = &candidate[..end];
        output.push_str(&std::env::var(key).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

pub fn load_config(root: &Path) -> Result<RidestreamConfig> {
    let mut config: RidestreamConfig = read_yaml_file(&root.join("main.yaml"))?;
    resolve_config_env(&mut config);
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &RidestreamConfig) -> Result<()> {
    if config.transport.capacity == 0 {
        return Err(anyhow!("transport.capacity must be greater than zero"));
    }

    if !is_valid_table_name(&config.storage.table) {
        return Err(anyhow!("invalid storage.table: {:?}", config.storage.table));
    }

    let sim = &config.simulation;
    if sim.jump_min_secs > sim.jump_max_secs {
        return Err(anyhow!(
            "simulation.jump_min_secs ({}) exceeds jump_max_secs ({})",
            sim.jump_min_secs,
            sim.jump_max_secs
        ));
    }
    if sim.surge_ceiling.is_nan() || sim.surge_ceiling < 1.0 {
        return Err(anyhow!(
            "simulation.surge_ceiling must be at least 1.0, got {}",
            sim.surge_ceiling
        ));
    }
    for (name, rate) in [
        ("dq_missing_rate", sim.dq_missing_rate),
        ("malformed_rate", sim.malformed_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(anyhow!("simulation.{name} must be within [0, 1], got {rate}"));
        }
    }

    Ok(())
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn resolve_config_env(config: &mut RidestreamConfig) {
    config.app.name = resolve_env_var(&config.app.name);
    config.app.env = resolve_env_var(&config.app.env);

    config.transport.topic = resolve_env_var(&config.transport.topic);
    if config.transport.topic.trim().is_empty() {
        config.transport.topic = default_topic();
    }

    config.storage.db_path = resolve_env_var(&config.storage.db_path);
    if config.storage.db_path.trim().is_empty() {
        config.storage.db_path = default_db_path();
    }
    config.storage.table = resolve_env_var(&config.storage.table);
    if config.storage.table.trim().is_empty() {
        config.storage.table = default_table();
    }

    config.notify.webhook_url = resolve_env_var(&config.notify.webhook_url);
}
