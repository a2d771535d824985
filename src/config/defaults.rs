use super::types::*;

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            voices: default_voices(),
            realtime_priority: default_realtime_priority(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: default_log_mode(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            formula: FormulaConfig::default(),
            render: RenderConfig::default(),
            log: LogConfig::default(),
        }
    }
}
