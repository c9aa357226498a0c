use anyhow::Context;
use serde::Deserialize;

use crate::http::parser::{ParserLimits, DEFAULT_MAX_HEADERS, DEFAULT_MAX_HEAD_BYTES};

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "RESTLINE_CONFIG";

/// Environment variable overriding `logging.level`.
pub const LOG_ENV: &str = "RESTLINE_LOG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub parser: ParserConfig,
    pub transport: TransportConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. `info` or `restline=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_head_bytes: usize,
    pub max_headers: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_headers: DEFAULT_MAX_HEADERS,
        }
    }
}

impl ParserConfig {
    pub fn limits(&self) -> ParserLimits {
        ParserLimits {
            max_head_bytes: self.max_head_bytes,
            max_headers: self.max_headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub buffer_size: usize,
    pub pool_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            pool_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Size of the fragments the demo writes responses in.
    pub chunk_size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { chunk_size: 7 }
    }
}

impl Config {
    /// Loads the file named by `RESTLINE_CONFIG`, or defaults when unset.
    /// `RESTLINE_LOG` overrides the log level either way.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml_str(&text).with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(level) = std::env::var(LOG_ENV) {
            cfg.logging.level = level;
        }
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.parser.max_head_bytes == 0 {
            anyhow::bail!("parser.max_head_bytes must be positive");
        }
        if self.transport.buffer_size == 0 {
            anyhow::bail!("transport.buffer_size must be positive");
        }
        if self.demo.chunk_size == 0 {
            anyhow::bail!("demo.chunk_size must be positive");
        }
        Ok(())
    }
}
