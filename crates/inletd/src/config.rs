use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides. `INLET__QUEUE__ADDRESS` overrides the
/// `queue.address` key, `INLET__OBJECT__S3__ACCESS_ID` the
/// `object.s3.access_id` key, and so on.
pub const ENV_PREFIX: &str = "INLET__";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: api::ApiConfig,
    pub pipeline: pipeline::PipelineConfig,
    pub registry: registry::RedisConfig,
    pub queue: queue::AmqpConfig,
    pub object: ObjectConfig,
    pub indexer: indexer::IndexerConfig,
    pub recognizer: recognizer::RecognizerConfig,
    pub telemetry: ops::TelemetryConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectConfig {
    pub s3: cloud::S3Config,
}

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    apply_overrides(&mut value, std::env::vars());

    Config::deserialize(value).context("invalid configuration")
}

fn apply_overrides(root: &mut toml::Value, vars: impl Iterator<Item = (String, String)>) {
    for (key, raw) in vars {
        let Some(path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = path.split("__").map(str::to_ascii_lowercase).collect();
        if segments.iter().any(String::is_empty) {
            continue;
        }
        set_path(root, &segments, parse_scalar(&raw));
    }
}

fn set_path(root: &mut toml::Value, segments: &[String], value: toml::Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        node = table_of(node)
            .entry(segment.clone())
            .or_insert_with(|| toml::Value::Table(Default::default()));
    }
    table_of(node).insert(last.clone(), value);
}

fn table_of(node: &mut toml::Value) -> &mut toml::value::Table {
    if !node.is_table() {
        *node = toml::Value::Table(Default::default());
    }
    match node {
        toml::Value::Table(table) => table,
        _ => unreachable!("node was just made a table"),
    }
}

/// Environment values keep their most specific TOML type.
fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(value) = raw.parse::<bool>() {
        return value.into();
    }
    if let Ok(value) = raw.parse::<i64>() {
        return value.into();
    }
    if let Ok(value) = raw.parse::<f64>() {
        return value.into();
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod test {
    use super::{apply_overrides, Config};
    use serde::Deserialize;

    const FIXTURE: &str = r#"
        [pipeline]
        semaphore_width = 4

        [registry]
        address = "redis://cache:6379"
        ttl = "2h"

        [queue]
        address = "amqp://broker:5672"
        exchange = "inlet"
        routing_key = "inlet.tasks"
        queue_name = "inlet-tasks"

        [object.s3]
        address = "store:9000"
        access_id = "minio"
        secret_key = "minio-secret"
        enable_ssl = false

        [indexer]
        address = "http://searcher:2892"
        timeout = "300s"

        [recognizer]
        address = "http://ocr:8004"
        timeout = "90s"

        [telemetry]
        logger_level = "debug"
        enable_tracer = false
    "#;

    #[test]
    fn test_load_from_toml() {
        let value: toml::Value = toml::from_str(FIXTURE).unwrap();
        let config = Config::deserialize(value).unwrap();

        assert_eq!(config.pipeline.semaphore_width, 4);
        assert_eq!(config.registry.ttl, std::time::Duration::from_secs(7200));
        assert_eq!(config.queue.exchange, "inlet");
        assert_eq!(config.object.s3.address, "store:9000");
        assert_eq!(
            config.recognizer.timeout,
            std::time::Duration::from_secs(90)
        );
        assert_eq!(config.telemetry.logger_level, ops::LogLevel::Debug);
        // Unset sections fall back to defaults.
        assert_eq!(config.api.address, "0.0.0.0:2893");
    }

    #[test]
    fn test_environment_overrides() {
        let mut value: toml::Value = toml::from_str(FIXTURE).unwrap();

        let vars = [
            ("INLET__QUEUE__ADDRESS", "amqp://failover:5672"),
            ("INLET__PIPELINE__SEMAPHORE_WIDTH", "32"),
            ("INLET__OBJECT__S3__ENABLE_SSL", "true"),
            ("INLET__TELEMETRY__LOGGER_LEVEL", "warn"),
            ("UNRELATED_VARIABLE", "ignored"),
        ];
        apply_overrides(
            &mut value,
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        );

        let config = Config::deserialize(value).unwrap();
        assert_eq!(config.queue.address, "amqp://failover:5672");
        assert_eq!(config.pipeline.semaphore_width, 32);
        assert!(config.object.s3.enable_ssl);
        assert_eq!(config.telemetry.logger_level, ops::LogLevel::Warn);
        // Keys not overridden keep their file values.
        assert_eq!(config.registry.address, "redis://cache:6379");
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let value: toml::Value = toml::from_str("").unwrap();
        let config = Config::deserialize(value).unwrap();
        assert_eq!(config.pipeline.semaphore_width, 10);
        assert_eq!(config.registry.ttl, std::time::Duration::from_secs(3600));
    }
}
