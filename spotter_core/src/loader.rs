//! Builds the definition a guided session runs from stored data.

use crate::catalog::validate_template;
use crate::store::TrainingStore;
use crate::{Error, Exercise, Result, WorkoutDefinition};

/// Fetch a workout template plus the user's best and last weights, and fold
/// them into one [`WorkoutDefinition`]
///
/// Templates that cannot be run (no exercises, an exercise with 0 sets)
/// are rejected here so a session never starts on them.
pub fn load_definition(store: &dyn TrainingStore, workout_id: &str) -> Result<WorkoutDefinition> {
    let template = store.load_template(workout_id)?;

    let problems = validate_template(&template);
    if !problems.is_empty() {
        return Err(Error::InvalidWorkout(problems.join("; ")));
    }

    let exercise_ids: Vec<&str> = template.exercises.iter().map(|e| e.id.as_str()).collect();
    let best = store.best_weights(&exercise_ids)?;
    let last = store.last_weights(&exercise_ids)?;

    tracing::debug!(
        "Loaded workout {} with {} exercises ({} with records)",
        template.id,
        template.exercises.len(),
        best.len()
    );

    let exercises = template
        .exercises
        .into_iter()
        .map(|ex| Exercise {
            suggested_weight: last.get(&ex.id).copied().unwrap_or(0.0),
            current_pr: best.get(&ex.id).copied(),
            id: ex.id,
            name: ex.name,
            muscle_group: ex.muscle_group,
            equipment: ex.equipment,
            sets: ex.sets,
            target_reps: ex.target_reps,
            rest_time: ex.rest_time,
        })
        .collect();

    Ok(WorkoutDefinition {
        id: template.id,
        name: template.name,
        exercises,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;

    #[test]
    fn test_folds_history_into_exercises() {
        let store = MemoryStore::with_default_catalog();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.best.insert("bench_press".into(), 100.0);
            inner.last.insert("bench_press".into(), 90.0);
            inner.last.insert("overhead_press".into(), 50.0);
        }

        let def = load_definition(&store, "push_day").unwrap();

        assert_eq!(def.name, "Push Day");
        assert_eq!(def.exercises[0].current_pr, Some(100.0));
        assert_eq!(def.exercises[0].suggested_weight, 90.0);
        assert_eq!(def.exercises[1].current_pr, None);
        assert_eq!(def.exercises[1].suggested_weight, 50.0);
        assert_eq!(def.exercises[3].suggested_weight, 0.0);
    }

    #[test]
    fn test_zero_set_exercise_rejected() {
        let mut template = crate::catalog::build_default_catalog().workouts["full_body"].clone();
        template.exercises[0].sets = 0;
        let store = MemoryStore::with_template(template);

        let result = load_definition(&store, "full_body");
        assert!(matches!(result, Err(Error::InvalidWorkout(_))));
    }

    #[test]
    fn test_missing_workout_propagates() {
        let store = MemoryStore::default();
        let result = load_definition(&store, "push_day");
        assert!(matches!(result, Err(Error::WorkoutNotFound(_))));
    }
}
