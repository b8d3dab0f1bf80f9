// Validation Diagnostics
//
// Diagnostics are pure values. The validator produces them; callers decide
// whether they are fatal (compile), informational (compile_with_diagnostics)
// or ignored. Nothing here is ever thrown.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    ResourceBudget,
    StateMachine,
    DuplicateName,
    SceneReference,
    SpriteReference,
    AnimationReference,
    ArrayBounds,
    PhysicsRange,
    TweenRange,
    PaletteLimit,
    AssetFormat,
}

impl DiagnosticCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticCategory::ResourceBudget => "resource-budget",
            DiagnosticCategory::StateMachine => "state-machine",
            DiagnosticCategory::DuplicateName => "duplicate-name",
            DiagnosticCategory::SceneReference => "scene-reference",
            DiagnosticCategory::SpriteReference => "sprite-reference",
            DiagnosticCategory::AnimationReference => "animation-reference",
            DiagnosticCategory::ArrayBounds => "array-bounds",
            DiagnosticCategory::PhysicsRange => "physics-range",
            DiagnosticCategory::TweenRange => "tween-range",
            DiagnosticCategory::PaletteLimit => "palette-limit",
            DiagnosticCategory::AssetFormat => "asset-format",
        }
    }
}

/// One validation finding. The message always embeds the offending
/// name/value; reference findings carry a ranked suggestion string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(category: DiagnosticCategory, message: String) -> Diagnostic {
        Diagnostic {
            category,
            severity: Severity::Error,
            message,
            suggestion: None,
        }
    }

    pub fn warning(category: DiagnosticCategory, message: String) -> Diagnostic {
        Diagnostic {
            category,
            severity: Severity::Warning,
            message,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Diagnostic {
        self.suggestion = suggestion;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sev = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}]: {}", sev, self.category.label(), self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validator output: errors and warnings, collected without short-circuiting.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new() -> ValidationResult {
        ValidationResult::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors and warnings of one category, errors first.
    pub fn of_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|d| d.category == category)
            .collect()
    }
}
