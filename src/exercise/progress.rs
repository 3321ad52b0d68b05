//! Per-user exercise progress.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::ExerciseCatalog;
use super::types::{Exercise, ExerciseResult};
use super::validator::meets_pass_threshold;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub exercise_number: u32,
    /// Sticky: once set it is never cleared
    pub completed: bool,
    pub best_score: u32,
    pub max_score: u32,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExerciseProgress {
    fn untouched(exercise: &Exercise) -> Self {
        ExerciseProgress {
            exercise_id: exercise.id.clone(),
            exercise_number: exercise.number,
            completed: false,
            best_score: 0,
            max_score: exercise.max_score,
            attempts: 0,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_exercises: usize,
    pub completed_count: usize,
    pub total_score: u32,
    pub max_possible_score: u32,
    /// Rounded to the nearest whole percent
    pub completion_percentage: u32,
}

/// Best scores and completion state of one user, keyed by exercise id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTracker {
    exercises: BTreeMap<String, ExerciseProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, exercise_id: &str) -> Option<&ExerciseProgress> {
        self.exercises.get(exercise_id)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Record one graded attempt
    pub fn record(&mut self, exercise: &Exercise, score: u32, max_score: u32) -> &ExerciseProgress {
        self.record_at(exercise, score, max_score, Utc::now())
    }

    /// Record the outcome of [`validate`](super::validate)
    pub fn record_result(&mut self, exercise: &Exercise, result: &ExerciseResult) -> &ExerciseProgress {
        self.record_at(exercise, result.score, result.max_score, result.completed_at)
    }

    /// [`record`](Self::record) with an explicit clock
    pub fn record_at(
        &mut self,
        exercise: &Exercise,
        score: u32,
        max_score: u32,
        now: DateTime<Utc>,
    ) -> &ExerciseProgress {
        self.last_updated = Some(now);
        let entry = self
            .exercises
            .entry(exercise.id.clone())
            .or_insert_with(|| ExerciseProgress::untouched(exercise));

        entry.attempts += 1;
        entry.best_score = entry.best_score.max(score);
        entry.max_score = max_score;
        if !entry.completed && meets_pass_threshold(score, max_score) {
            entry.completed = true;
            entry.completed_at = Some(now);
            info!("Exercise {} completed with {}/{}", exercise.id, score, max_score);
        }
        entry
    }

    /// Exercise 1 is always open; exercise n needs exercise n-1 completed
    pub fn is_unlocked(&self, exercise_number: u32) -> bool {
        if exercise_number <= 1 {
            return true;
        }
        self.exercises
            .values()
            .any(|p| p.exercise_number == exercise_number - 1 && p.completed)
    }

    /// Totals across `catalog`; exercises never attempted count with score zero
    pub fn overall_stats(&self, catalog: &ExerciseCatalog) -> OverallStats {
        let mut completed_count = 0;
        let mut total_score: u32 = 0;
        let mut max_possible_score: u32 = 0;

        for exercise in catalog.iter() {
            match self.exercises.get(&exercise.id) {
                Some(progress) => {
                    if progress.completed {
                        completed_count += 1;
                    }
                    total_score = total_score.saturating_add(progress.best_score);
                    max_possible_score = max_possible_score.saturating_add(progress.max_score);
                }
                None => max_possible_score = max_possible_score.saturating_add(exercise.max_score),
            }
        }

        let total_exercises = catalog.len();
        let completion_percentage = if total_exercises == 0 {
            0
        } else {
            ((completed_count as f64 / total_exercises as f64) * 100.0).round() as u32
        };

        OverallStats {
            total_exercises,
            completed_count,
            total_score,
            max_possible_score,
            completion_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> ExerciseCatalog {
        let yaml = r#"
- id: ex1
  number: 1
  title: One
  difficulty: debutant
  category: adressage
  description: first
  validationRules:
    - { type: cable_exists, params: {}, errorMessage: cable, points: 100 }
  estimatedTime: 5
  maxScore: 100
- id: ex2
  number: 2
  title: Two
  difficulty: debutant
  category: switching
  description: second
  validationRules:
    - { type: all_connected, params: {}, errorMessage: star, points: 50 }
  estimatedTime: 5
  maxScore: 50
- id: ex3
  number: 3
  title: Three
  difficulty: avance
  category: routage
  description: third
  validationRules:
    - { type: ping_success, params: { interNetwork: true }, errorMessage: route, points: 100 }
  estimatedTime: 5
  maxScore: 100
"#;
        ExerciseCatalog::from_exercises(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_record_keeps_best_and_counts_attempts() {
        let catalog = catalog();
        let ex1 = catalog.get("ex1").unwrap();
        let mut tracker = ProgressTracker::new();

        tracker.record(ex1, 40, 100);
        tracker.record(ex1, 90, 100);
        let progress = tracker.record(ex1, 60, 100).clone();

        assert_eq!(progress.attempts, 3);
        assert_eq!(progress.best_score, 90);
        assert!(progress.completed);
    }

    #[test]
    fn test_completion_is_sticky_and_stamped_once() {
        let catalog = catalog();
        let ex1 = catalog.get("ex1").unwrap();
        let mut tracker = ProgressTracker::new();
        let first = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 5, 2, 9, 0, 0).unwrap();

        assert!(!tracker.record_at(ex1, 69, 100, first).completed);
        assert!(tracker.record_at(ex1, 70, 100, first).completed);
        let progress = tracker.record_at(ex1, 0, 100, later);
        assert!(progress.completed);
        assert_eq!(progress.completed_at, Some(first));
        assert_eq!(tracker.last_updated(), Some(later));
    }

    #[test]
    fn test_unlock_chain() {
        let catalog = catalog();
        let mut tracker = ProgressTracker::new();
        assert!(tracker.is_unlocked(1));
        assert!(!tracker.is_unlocked(2));

        tracker.record(catalog.get("ex1").unwrap(), 100, 100);
        assert!(tracker.is_unlocked(2));
        assert!(!tracker.is_unlocked(3));

        tracker.record(catalog.get("ex2").unwrap(), 20, 50);
        assert!(!tracker.is_unlocked(3));
    }

    #[test]
    fn test_overall_stats() {
        let catalog = catalog();
        let mut tracker = ProgressTracker::new();
        tracker.record(catalog.get("ex1").unwrap(), 80, 100);
        tracker.record(catalog.get("ex2").unwrap(), 20, 50);

        let stats = tracker.overall_stats(&catalog);
        assert_eq!(
            stats,
            OverallStats {
                total_exercises: 3,
                completed_count: 1,
                total_score: 100,
                max_possible_score: 250,
                completion_percentage: 33,
            }
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_camel_case() {
        let catalog = catalog();
        let mut tracker = ProgressTracker::new();
        tracker.record(catalog.get("ex1").unwrap(), 100, 100);
        let json = serde_json::to_value(&tracker).unwrap();
        assert_eq!(json["exercises"]["ex1"]["bestScore"], 100);
        assert_eq!(json["exercises"]["ex1"]["exerciseNumber"], 1);
        let back: ProgressTracker = serde_json::from_value(json).unwrap();
        assert_eq!(back, tracker);
    }
}
