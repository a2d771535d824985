use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default)]
    pub formula: FormulaConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FormulaConfig {
    /// Formula compiled when none is given on the command line
    #[serde(default = "default_source")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RenderConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default = "default_voices")]
    pub voices: usize,

    /// Run the render thread at maximum thread priority
    #[serde(default = "default_realtime_priority")]
    pub realtime_priority: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogConfig {
    #[serde(default = "default_log_mode")]
    pub mode: LogMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    Standalone,
    File,
    Dual,
}

pub(super) fn default_source() -> String {
    crate::evaluator::DEFAULT_SOURCE.to_owned()
}

pub(super) fn default_sample_rate() -> u32 {
    48_000
}

pub(super) fn default_block_size() -> usize {
    256
}

pub(super) fn default_voices() -> usize {
    1
}

pub(super) fn default_realtime_priority() -> bool {
    true
}

pub(super) fn default_log_mode() -> LogMode {
    LogMode::Standalone
}
