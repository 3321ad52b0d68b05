//! Exercise validation engine.
//!
//! Exercises are static content: a description, some theory, a reference
//! topology and a list of weighted validation rules. Grading evaluates every
//! rule against a topology snapshot and passes at 70% of the available
//! points, the same threshold [`ProgressTracker`] uses to mark an exercise
//! completed.

pub mod catalog;
pub mod progress;
pub mod rules;
pub mod types;
pub mod validator;

pub use catalog::{CatalogError, ExerciseCatalog};
pub use progress::{ExerciseProgress, OverallStats, ProgressTracker};
pub use rules::{RuleCheck, ValidationRule};
pub use types::{
    Category, Difficulty, Exercise, ExerciseCable, ExerciseDevice, ExerciseResult, RequiredConfig,
    RuleResult, TargetTopology, TheorySection,
};
pub use validator::{evaluate_rule, meets_pass_threshold, validate, validate_at, PASS_PERCENT};
