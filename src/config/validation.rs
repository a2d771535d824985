use super::types::{
    Config, FormulaConfig, RenderConfig, default_block_size, default_sample_rate, default_source,
};
use crate::log_warn;

pub const MAX_SAMPLE_RATE: u32 = 384_000;
pub const MAX_BLOCK_SIZE: usize = 8192;
pub const MAX_VOICES: usize = 64;

pub trait Validate {
    fn validate(&mut self);
}

impl Validate for FormulaConfig {
    fn validate(&mut self) {
        if self.source.trim().is_empty() {
            log_warn!("Invalid formula source: empty string. Using default: {}", default_source());
            self.source = default_source();
        }
    }
}

impl Validate for RenderConfig {
    fn validate(&mut self) {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            log_warn!(
                "Invalid sample_rate: {}. Using default: {}",
                self.sample_rate,
                default_sample_rate()
            );
            self.sample_rate = default_sample_rate();
        }

        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            log_warn!(
                "Invalid block_size: {}. Using default: {}",
                self.block_size,
                default_block_size()
            );
            self.block_size = default_block_size();
        }

        if self.voices == 0 || self.voices > MAX_VOICES {
            let clamped = self.voices.clamp(1, MAX_VOICES);
            log_warn!("Invalid voices: {}. Clamped to {}", self.voices, clamped);
            self.voices = clamped;
        }
    }
}

impl Validate for Config {
    fn validate(&mut self) {
        self.formula.validate();
        self.render.validate();
    }
}
