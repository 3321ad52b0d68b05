//! Static exercise catalog loading.
//!
//! A catalog is a YAML or JSON list of exercises. Loading checks that ids are
//! unique, that numbers form the unlock chain `1..=n`, and that every
//! exercise's declared maximum equals the points its rules can award.

use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;

use super::types::{Category, Difficulty, Exercise};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate exercise id: {0}")]
    DuplicateId(String),
    #[error("exercise numbers must run 1..={count} without gaps, found {found} at position {position}")]
    BrokenChain {
        count: usize,
        position: usize,
        found: u32,
    },
    #[error("exercise {id} declares maxScore {declared} but its rules award {computed}")]
    ScoreMismatch {
        id: String,
        declared: u32,
        computed: u64,
    },
}

/// Exercises in unlock order
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
}

impl ExerciseCatalog {
    /// Read a catalog file; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        info!("Loading exercise catalog from: {:?}", path);
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let exercises: Vec<Exercise> = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        let catalog = Self::from_exercises(exercises)?;
        info!("Loaded {} exercises", catalog.len());
        Ok(catalog)
    }

    /// Check and order a list of exercises
    pub fn from_exercises(mut exercises: Vec<Exercise>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for exercise in &exercises {
            if !ids.insert(exercise.id.as_str()) {
                return Err(CatalogError::DuplicateId(exercise.id.clone()));
            }
            let computed = exercise.rule_points();
            if computed != u64::from(exercise.max_score) {
                return Err(CatalogError::ScoreMismatch {
                    id: exercise.id.clone(),
                    declared: exercise.max_score,
                    computed,
                });
            }
        }

        exercises.sort_by_key(|e| e.number);
        let count = exercises.len();
        for (position, exercise) in exercises.iter().enumerate() {
            if exercise.number as usize != position + 1 {
                return Err(CatalogError::BrokenChain {
                    count,
                    position: position + 1,
                    found: exercise.number,
                });
            }
        }

        Ok(ExerciseCatalog { exercises })
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn by_number(&self, number: u32) -> Option<&Exercise> {
        number
            .checked_sub(1)
            .and_then(|index| self.exercises.get(index as usize))
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.category == category)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &Exercise> {
        self.exercises
            .iter()
            .filter(move |e| e.difficulty == difficulty)
    }

    /// Sum of every exercise's maximum score
    pub fn max_possible_score(&self) -> u32 {
        self.exercises
            .iter()
            .fold(0u32, |total, e| total.saturating_add(e.max_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"
- id: ex2-dhcp
  number: 2
  title: DHCP
  difficulty: intermediaire
  category: dhcp
  description: Hand out addresses automatically
  validationRules:
    - type: device_exists
      params: { type: dhcp-server }
      errorMessage: A DHCP server is required
      points: 40
    - type: dhcp_working
      params: {}
      errorMessage: The server must lease addresses
      points: 60
  estimatedTime: 15
  maxScore: 100
- id: ex1-lan
  number: 1
  title: Simple LAN
  difficulty: debutant
  category: adressage
  description: Two PCs on a switch
  validationRules:
    - type: device_count
      params: { type: pc, min: 2 }
      errorMessage: Two PCs are required
      points: 100
  estimatedTime: 10
  maxScore: 100
"#;

    fn write(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_sorts_by_number() {
        let file = write(".yaml", CATALOG);
        let catalog = ExerciseCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        let ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ex1-lan", "ex2-dhcp"]);
        assert_eq!(catalog.by_number(2).map(|e| e.id.as_str()), Some("ex2-dhcp"));
        assert!(catalog.by_number(0).is_none());
        assert_eq!(catalog.by_category(Category::Dhcp).count(), 1);
        assert_eq!(catalog.by_difficulty(Difficulty::Avance).count(), 0);
        assert_eq!(catalog.max_possible_score(), 200);
    }

    #[test]
    fn test_load_json() {
        let exercises: Vec<Exercise> = serde_yaml::from_str(CATALOG).unwrap();
        let file = write(".json", &serde_json::to_string(&exercises).unwrap());
        let catalog = ExerciseCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.get("ex1-lan").map(|e| e.number), Some(1));
    }

    #[test]
    fn test_integrity_errors() {
        let mut exercises: Vec<Exercise> = serde_yaml::from_str(CATALOG).unwrap();

        let mut duplicate = exercises.clone();
        duplicate[1].id = "ex2-dhcp".to_string();
        assert!(matches!(
            ExerciseCatalog::from_exercises(duplicate),
            Err(CatalogError::DuplicateId(_))
        ));

        let mut gap = exercises.clone();
        gap[0].number = 3;
        assert!(matches!(
            ExerciseCatalog::from_exercises(gap),
            Err(CatalogError::BrokenChain { found: 3, .. })
        ));

        exercises[1].max_score = 90;
        assert!(matches!(
            ExerciseCatalog::from_exercises(exercises),
            Err(CatalogError::ScoreMismatch { declared: 90, computed: 100, .. })
        ));
    }

    #[test]
    fn test_rule_points_beyond_u32_are_a_mismatch() {
        let mut exercises: Vec<Exercise> = serde_yaml::from_str(CATALOG).unwrap();
        for rule in &mut exercises[0].validation_rules {
            rule.points = 3_000_000_000;
        }
        exercises[0].max_score = u32::MAX;
        assert!(matches!(
            ExerciseCatalog::from_exercises(exercises),
            Err(CatalogError::ScoreMismatch {
                declared: u32::MAX,
                computed: 6_000_000_000,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_file() {
        let file = write(".yaml", "- id: [not, a, string]");
        assert!(matches!(
            ExerciseCatalog::load(file.path()),
            Err(CatalogError::Yaml(_))
        ));
    }
}
