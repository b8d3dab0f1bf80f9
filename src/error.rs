// Compiler Error Handling

use crate::diagnostics::ValidationResult;
use std::fmt;

/// Internal/contract errors raised by the pipeline.
///
/// These are distinct from validator `Diagnostic`s: a `CompilerError` means
/// the caller handed the pipeline an inconsistent Model/IR (or asked it to
/// stop on validation failure), not that the authored game merely exceeds a
/// budget. They propagate to the outermost caller and are never swallowed.
#[derive(Debug, Clone)]
pub enum CompilerError {
    // Caller asked compile() to stop on an invalid model; carries every
    // diagnostic the validator produced, warnings included
    ValidationFailed(ValidationResult),

    // Emitter contract errors: IR referencing names absent from the Model
    UnknownSprite(String),
    UnknownAnimation(String),
    UnknownScene(String),
    UnknownVariable(String),
    UnknownPool(String),
    UnknownArray(String),

    // Statement used outside the context that gives it meaning
    DespawnOutsidePool,

    // Catch-all for emitter-internal inconsistencies
    EmitError(String),
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompilerError::ValidationFailed(result) => {
                write!(
                    f,
                    "validation failed with {} error(s), {} warning(s):",
                    result.errors.len(),
                    result.warnings.len()
                )?;
                for d in result.errors.iter().chain(result.warnings.iter()) {
                    write!(f, "\n  {}", d)?;
                }
                Ok(())
            }
            CompilerError::UnknownSprite(name) => {
                write!(f, "IR references sprite '{}' not present in the model", name)
            }
            CompilerError::UnknownAnimation(name) => {
                write!(
                    f,
                    "IR references animation '{}' not present in the model",
                    name
                )
            }
            CompilerError::UnknownScene(name) => {
                write!(f, "IR references scene '{}' not present in the model", name)
            }
            CompilerError::UnknownVariable(name) => {
                write!(
                    f,
                    "IR references variable '{}' not declared in any reachable namespace",
                    name
                )
            }
            CompilerError::UnknownPool(name) => {
                write!(f, "IR references pool '{}' not present in the model", name)
            }
            CompilerError::UnknownArray(name) => {
                write!(
                    f,
                    "IR references array '{}' (expected '<pool>.<field>' naming a declared pool field)",
                    name
                )
            }
            CompilerError::DespawnOutsidePool => {
                write!(f, "despawn statement used outside a pool lifecycle hook")
            }
            CompilerError::EmitError(msg) => {
                write!(f, "emission error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompilerError {}
