//! TOML configuration for the evaluator tool.

mod defaults;
mod loader;
mod types;
mod validation;

pub use loader::ConfigLoader;
pub use types::{Config, FormulaConfig, LogConfig, LogMode, RenderConfig};
pub use validation::Validate;
