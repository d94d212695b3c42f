use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::delivery::SmtpConfig;
use crate::emotion::SamplingPolicy;
use crate::session::SessionConfig;
use crate::video::IceConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub ice: IceConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Without this section reports can be generated but not emailed
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
    /// Ended sessions kept around for summaries and reports
    #[serde(default = "default_max_ended_sessions")]
    pub max_ended_sessions: usize,
}

fn default_service_name() -> String {
    "neuronote".to_string()
}

fn default_max_ended_sessions() -> usize {
    32
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
            max_ended_sessions: default_max_ended_sessions(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    Interval,
    Stride,
    Hybrid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub mode: SamplingMode,
    pub interval_ms: u64,
    pub stride: u64,
    /// 0 keeps every sample for the life of the session
    pub max_history: usize,
    pub frame_buffer: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Interval,
            interval_ms: 2000,
            stride: 2,
            max_history: 10_000,
            frame_buffer: 32,
        }
    }
}

impl SamplingConfig {
    pub fn policy(&self) -> Result<SamplingPolicy> {
        let interval = Duration::from_millis(self.interval_ms);
        let policy = match self.mode {
            SamplingMode::Interval => SamplingPolicy::interval(interval),
            SamplingMode::Stride => SamplingPolicy::stride(self.stride)?,
            SamplingMode::Hybrid => SamplingPolicy::hybrid(self.stride, interval)?,
        };
        Ok(policy)
    }

    pub fn max_history(&self) -> Option<usize> {
        (self.max_history > 0).then_some(self.max_history)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub nats_url: String,
    pub subject: String,
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            subject: "emotion.classify".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
    pub file_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "static".to_string(),
            file_name: "neuro_report.pdf".to_string(),
        }
    }
}

impl ReportConfig {
    /// Output directory with `~` expanded
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output_dir).as_ref())
    }
}

impl Config {
    /// Load from `path` (any format the config crate knows, extension
    /// optional) layered under `NEURONOTE__SECTION__KEY` environment
    /// variables. A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("NEURONOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let config: Config = settings.try_deserialize()?;
        config.sampling.policy().context("Invalid [sampling] section")?;

        Ok(config)
    }

    /// Session template for new connections
    pub fn session_template(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            policy: self.sampling.policy()?,
            max_history: self.sampling.max_history(),
            frame_buffer: self.sampling.frame_buffer,
            max_reconnect_attempts: self.ice.max_reconnect_attempts,
            ..SessionConfig::default()
        })
    }
}
