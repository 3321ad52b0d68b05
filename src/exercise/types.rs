//! Exercise content and grading results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::ValidationRule;
use crate::topology::DeviceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Debutant,
    Intermediaire,
    Avance,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Debutant => "beginner",
            Difficulty::Intermediaire => "intermediate",
            Difficulty::Avance => "advanced",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Adressage,
    Dhcp,
    Dns,
    Routage,
    Switching,
    Subnetting,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Adressage => "addressing",
            Category::Dhcp => "dhcp",
            Category::Dns => "dns",
            Category::Routage => "routing",
            Category::Switching => "switching",
            Category::Subnetting => "subnetting",
        };
        f.write_str(label)
    }
}

/// A short lesson shown next to an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheorySection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
}

/// Addressing the reference solution expects on one device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_pool_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_pool_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDevice {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_config: Option<RequiredConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCable {
    pub from_device_id: String,
    pub to_device_id: String,
}

/// Reference solution drawn when the learner asks for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTopology {
    #[serde(default)]
    pub devices: Vec<ExerciseDevice>,
    #[serde(default)]
    pub cables: Vec<ExerciseCable>,
}

/// One graded exercise of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    /// Position in the unlock chain, starting at 1
    pub number: u32,
    pub title: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub theory: Vec<TheorySection>,
    #[serde(default)]
    pub target_topology: TargetTopology,
    pub validation_rules: Vec<ValidationRule>,
    #[serde(default)]
    pub hints: Vec<String>,
    /// Minutes
    pub estimated_time: u32,
    pub max_score: u32,
}

impl Exercise {
    /// Sum of the points of every validation rule, widened so it cannot overflow
    pub fn rule_points(&self) -> u64 {
        self.validation_rules.iter().map(|r| u64::from(r.points)).sum()
    }
}

/// Outcome of evaluating one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: ValidationRule,
    pub passed: bool,
    pub message: String,
}

/// Outcome of grading a topology against an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResult {
    pub exercise_id: String,
    pub passed: bool,
    pub score: u32,
    pub max_score: u32,
    pub validation_results: Vec<RuleResult>,
    pub completed_at: DateTime<Utc>,
}

impl ExerciseResult {
    /// Rules that did not hold
    pub fn failures(&self) -> impl Iterator<Item = &RuleResult> {
        self.validation_results.iter().filter(|r| !r.passed)
    }
}
