// retroforge - compiles declarative game models into VC-8 toolkit source text
//
// The pipeline is a pure, synchronous function of an immutable Model:
//
//   Model -> Validator (diagnostics)
//   Model -> Optimizer -> Emitter -> text (+ optional line mapping)
//
// Validation and emission are independent; caller policy decides whether
// diagnostics gate emission (see Compiler's three entry points).

pub mod asset;
pub mod diagnostics;
pub mod emitter;
mod emitter_decls;
mod emitter_exprs;
mod emitter_routines;
pub mod error;
pub mod ir;
pub mod limits;
pub mod mapping;
pub mod model;
pub mod optimizer;
pub mod suggestions;
pub mod validator;

pub use diagnostics::{Diagnostic, DiagnosticCategory, Severity, ValidationResult};
pub use error::CompilerError;
pub use mapping::MappingTable;
pub use model::Model;

/// Run every validator check against a model.
pub fn validate(model: &Model) -> ValidationResult {
    validator::validate(model)
}

/// Main compiler structure.
pub struct Compiler {
    // Stateless; each call is an independent pipeline run.
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {}
    }

    /// Compile a model to VC-8 script text.
    ///
    /// With `fail_on_validation_error` set, validation errors abort before
    /// emission and surface as `CompilerError::ValidationFailed` carrying
    /// the whole validation result, warnings included. Warnings never gate
    /// emission.
    pub fn compile(
        &self,
        model: &Model,
        fail_on_validation_error: bool,
    ) -> Result<String, CompilerError> {
        let result = validator::validate(model);
        if fail_on_validation_error && !result.is_valid() {
            return Err(CompilerError::ValidationFailed(result));
        }
        let optimized = optimizer::optimize_model(model);
        emitter::emit(&optimized)
    }

    /// Compile unconditionally and hand back the diagnostics alongside the
    /// text, for tooling that wants both.
    pub fn compile_with_diagnostics(
        &self,
        model: &Model,
    ) -> Result<(String, ValidationResult), CompilerError> {
        let result = validator::validate(model);
        let optimized = optimizer::optimize_model(model);
        let text = emitter::emit(&optimized)?;
        Ok((text, result))
    }

    /// Compile unconditionally and build the output-line-to-source mapping
    /// table described in `mapping`.
    pub fn compile_with_mapping(
        &self,
        model: &Model,
    ) -> Result<(String, MappingTable), CompilerError> {
        let optimized = optimizer::optimize_model(model);
        emitter::emit_with_mapping(&optimized)
    }
}
