use serde::{Deserialize, Serialize};

use crate::compiler::CompilationError;

/// Outcome of the most recent compilation request.
///
/// An `Error` only describes the last attempt: whatever program was
/// installed before keeps running.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub enum CompilationState {
    #[default]
    NotCompiled,
    Compiled,
    Error(CompilationError),
}

impl CompilationState {
    pub fn is_compiled(&self) -> bool {
        matches!(self, CompilationState::Compiled)
    }

    pub fn error(&self) -> Option<&CompilationError> {
        match self {
            CompilationState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Short human readable status, as shown next to the formula.
    pub fn status(&self) -> String {
        match self {
            CompilationState::NotCompiled => "not compiled".to_owned(),
            CompilationState::Compiled => "ok".to_owned(),
            CompilationState::Error(err) => err.to_string(),
        }
    }
}
