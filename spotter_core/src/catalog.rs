//! Workout catalog: built-in templates plus user templates on disk.
//!
//! User templates live in `<data_dir>/workouts/<id>.toml` and take precedence
//! over built-in templates with the same id.

use crate::types::{ExerciseTemplate, WorkoutTemplate};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Collection of workout templates keyed by id
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub workouts: HashMap<String, WorkoutTemplate>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    muscle_group: &str,
    equipment: Option<&str>,
    sets: u32,
    target_reps: u32,
    rest_time: u32,
) -> ExerciseTemplate {
    ExerciseTemplate {
        id: id.into(),
        name: name.into(),
        muscle_group: muscle_group.into(),
        equipment: equipment.map(Into::into),
        sets,
        target_reps,
        rest_time,
    }
}

/// Builds the catalog of built-in workouts
pub fn build_default_catalog() -> Catalog {
    let templates = vec![
        WorkoutTemplate {
            id: "push_day".into(),
            name: "Push Day".into(),
            exercises: vec![
                exercise("bench_press", "Bench Press", "chest", Some("barbell"), 4, 8, 120),
                exercise("overhead_press", "Overhead Press", "shoulders", Some("barbell"), 3, 8, 90),
                exercise("incline_db_press", "Incline Dumbbell Press", "chest", Some("dumbbell"), 3, 10, 90),
                exercise("triceps_pushdown", "Triceps Pushdown", "triceps", Some("cable"), 3, 12, 60),
            ],
        },
        WorkoutTemplate {
            id: "pull_day".into(),
            name: "Pull Day".into(),
            exercises: vec![
                exercise("deadlift", "Deadlift", "back", Some("barbell"), 3, 5, 180),
                exercise("pullup", "Pull-up", "back", Some("pullup_bar"), 3, 8, 90),
                exercise("barbell_row", "Barbell Row", "back", Some("barbell"), 3, 8, 90),
                exercise("db_curl", "Dumbbell Curl", "biceps", Some("dumbbell"), 3, 12, 60),
            ],
        },
        WorkoutTemplate {
            id: "leg_day".into(),
            name: "Leg Day".into(),
            exercises: vec![
                exercise("back_squat", "Back Squat", "quads", Some("barbell"), 4, 6, 180),
                exercise("romanian_deadlift", "Romanian Deadlift", "hamstrings", Some("barbell"), 3, 8, 120),
                exercise("walking_lunge", "Walking Lunge", "glutes", Some("dumbbell"), 3, 12, 90),
                exercise("calf_raise", "Standing Calf Raise", "calves", None, 3, 15, 60),
            ],
        },
        WorkoutTemplate {
            id: "full_body".into(),
            name: "Full Body Express".into(),
            exercises: vec![
                exercise("goblet_squat", "Goblet Squat", "quads", Some("kettlebell"), 3, 10, 60),
                exercise("pushup", "Push-up", "chest", None, 3, 15, 60),
                exercise("kb_swing", "Kettlebell Swing", "posterior_chain", Some("kettlebell"), 3, 15, 60),
            ],
        },
    ];

    Catalog {
        workouts: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
    }
}

/// Check a single template, returning human-readable problems
pub fn validate_template(template: &WorkoutTemplate) -> Vec<String> {
    let mut errors = Vec::new();

    if template.id.trim().is_empty() {
        errors.push(format!("Workout '{}' has an empty id", template.name));
    }
    if template.exercises.is_empty() {
        errors.push(format!("Workout '{}' has no exercises", template.id));
    }

    for ex in &template.exercises {
        if ex.sets == 0 {
            errors.push(format!(
                "Workout '{}': exercise '{}' has 0 sets",
                template.id, ex.id
            ));
        }
        if ex.target_reps == 0 {
            errors.push(format!(
                "Workout '{}': exercise '{}' has 0 target reps",
                template.id, ex.id
            ));
        }
    }

    errors
}

impl Catalog {
    /// Validate every template in the catalog
    pub fn validate(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.workouts.keys().collect();
        ids.sort();

        let mut errors = Vec::new();
        for id in ids {
            let template = &self.workouts[id];
            if &template.id != id {
                errors.push(format!(
                    "Workout key '{}' does not match template id '{}'",
                    id, template.id
                ));
            }
            errors.extend(validate_template(template));
        }
        errors
    }

    pub fn get(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.workouts.get(id)
    }

    /// Templates sorted by id, for listing
    pub fn sorted(&self) -> Vec<&WorkoutTemplate> {
        let mut templates: Vec<_> = self.workouts.values().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    /// Load user templates from `dir/*.toml`
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut workouts = HashMap::new();
        if !dir.exists() {
            return Ok(Self { workouts });
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "toml") {
                continue;
            }

            let contents = std::fs::read_to_string(&path)?;
            match toml::from_str::<WorkoutTemplate>(&contents) {
                Ok(template) => {
                    tracing::debug!("Loaded workout template {} from {:?}", template.id, path);
                    workouts.insert(template.id.clone(), template);
                }
                Err(e) => {
                    tracing::warn!("Skipping workout template {:?}: {}", path, e);
                }
            }
        }

        Ok(Self { workouts })
    }

    /// Built-in templates overlaid with the user templates in `dir`
    pub fn with_user_templates(dir: &Path) -> Result<Self> {
        let mut catalog = get_default_catalog().clone();
        let user = Self::load_dir(dir)?;
        catalog.workouts.extend(user.workouts);
        Ok(catalog)
    }

    /// Write a template to `dir/<id>.toml`
    pub fn save_template(dir: &Path, template: &WorkoutTemplate) -> Result<()> {
        let errors = validate_template(template);
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        std::fs::create_dir_all(dir)?;
        let contents = toml::to_string_pretty(template)
            .map_err(|e| Error::Other(format!("Failed to serialize template: {}", e)))?;
        std::fs::write(dir.join(format!("{}.toml", template.id)), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.workouts.len(), 4);
        assert!(catalog.get("push_day").is_some());
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_zero_sets_rejected() {
        let mut template = build_default_catalog().workouts["leg_day"].clone();
        template.exercises[1].sets = 0;

        let errors = validate_template(&template);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("romanian_deadlift"));
    }

    #[test]
    fn test_user_templates_override_builtins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut custom = build_default_catalog().workouts["push_day"].clone();
        custom.name = "My Push Day".into();
        custom.exercises.truncate(1);
        Catalog::save_template(temp_dir.path(), &custom).unwrap();

        let catalog = Catalog::with_user_templates(temp_dir.path()).unwrap();
        let push = catalog.get("push_day").unwrap();
        assert_eq!(push.name, "My Push Day");
        assert_eq!(push.exercises.len(), 1);
        assert!(catalog.get("leg_day").is_some());
    }

    #[test]
    fn test_malformed_template_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("broken.toml"), "id = ").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "not a template").unwrap();

        let catalog = Catalog::load_dir(temp_dir.path()).unwrap();
        assert!(catalog.workouts.is_empty());
    }

    #[test]
    fn test_invalid_template_not_saved() {
        let temp_dir = tempfile::tempdir().unwrap();
        let template = WorkoutTemplate {
            id: "empty".into(),
            name: "Empty".into(),
            exercises: vec![],
        };

        let result = Catalog::save_template(temp_dir.path(), &template);
        assert!(matches!(result, Err(Error::CatalogValidation(_))));
        assert!(!temp_dir.path().join("empty.toml").exists());
    }
}
