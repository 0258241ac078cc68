//! Result aggregation.
//!
//! A score card collects, for every reached location, the tasks that
//! reached it. Writes come from concurrently running task groups; reads
//! happen once every group has finished.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use serde::Serialize;

use super::Task;
use super::rank::{deduplicate, rank_itineraries};
use crate::domain::{Itinerary, LocationId};

/// Per-location line of a score card report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationScore {
    pub reached_count: usize,
    /// Shortest kept itinerary, when the card keeps paths.
    pub best_minutes: Option<i64>,
}

/// Serialisable summary of a score card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub locations: BTreeMap<LocationId, LocationScore>,
}

impl ScoreSummary {
    pub fn reached_locations(&self) -> usize {
        self.locations.len()
    }

    /// Sum of reach counts over every location.
    pub fn total_reached(&self) -> usize {
        self.locations.values().map(|s| s.reached_count).sum()
    }
}

/// Aggregates itineraries per (location, task).
///
/// Inserting the same (location, task) twice never counts twice.
pub trait ScoreCard: Send + Sync {
    fn put_path(&self, location: LocationId, task: &Task, path: Itinerary);

    fn has_path(&self, location: LocationId) -> bool;

    /// Number of distinct tasks that reached `location`.
    fn reached_count(&self, location: LocationId) -> usize;

    /// Kept itineraries for `location`, best first. Empty for cards that
    /// drop path detail.
    fn best_paths(&self, location: LocationId, limit: usize) -> Vec<Itinerary>;

    fn summary(&self) -> ScoreSummary;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Writers hold the lock for a single insert
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps reach counts only.
#[derive(Debug, Default)]
pub struct CountingScoreCard {
    reached: Mutex<HashMap<LocationId, HashSet<Task>>>,
}

impl CountingScoreCard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreCard for CountingScoreCard {
    fn put_path(&self, location: LocationId, task: &Task, _path: Itinerary) {
        lock(&self.reached)
            .entry(location)
            .or_default()
            .insert(task.clone());
    }

    fn has_path(&self, location: LocationId) -> bool {
        lock(&self.reached).contains_key(&location)
    }

    fn reached_count(&self, location: LocationId) -> usize {
        lock(&self.reached).get(&location).map_or(0, HashSet::len)
    }

    fn best_paths(&self, _location: LocationId, _limit: usize) -> Vec<Itinerary> {
        Vec::new()
    }

    fn summary(&self) -> ScoreSummary {
        let reached = lock(&self.reached);
        ScoreSummary {
            locations: reached
                .iter()
                .map(|(loc, tasks)| {
                    (
                        *loc,
                        LocationScore {
                            reached_count: tasks.len(),
                            best_minutes: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Keeps the itinerary of every (location, task).
#[derive(Debug, Default)]
pub struct PathScoreCard {
    paths: Mutex<HashMap<LocationId, HashMap<Task, Itinerary>>>,
}

impl PathScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The itinerary recorded for one task, if any.
    pub fn path(&self, location: LocationId, task: &Task) -> Option<Itinerary> {
        lock(&self.paths).get(&location)?.get(task).cloned()
    }
}

impl ScoreCard for PathScoreCard {
    fn put_path(&self, location: LocationId, task: &Task, path: Itinerary) {
        lock(&self.paths)
            .entry(location)
            .or_default()
            .insert(task.clone(), path);
    }

    fn has_path(&self, location: LocationId) -> bool {
        lock(&self.paths).contains_key(&location)
    }

    fn reached_count(&self, location: LocationId) -> usize {
        lock(&self.paths).get(&location).map_or(0, HashMap::len)
    }

    fn best_paths(&self, location: LocationId, limit: usize) -> Vec<Itinerary> {
        let paths: Vec<Itinerary> = match lock(&self.paths).get(&location) {
            Some(by_task) => by_task.values().cloned().collect(),
            None => return Vec::new(),
        };
        let mut best = deduplicate(rank_itineraries(paths));
        best.truncate(limit);
        best
    }

    fn summary(&self) -> ScoreSummary {
        let paths = lock(&self.paths);
        ScoreSummary {
            locations: paths
                .iter()
                .map(|(loc, by_task)| {
                    let best = by_task.values().map(Itinerary::total_duration).min();
                    (
                        *loc,
                        LocationScore {
                            reached_count: by_task.len(),
                            best_minutes: best.map(|d: Duration| d.num_minutes()),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Movement, Time, Walk};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn time(s: &str) -> Time {
        Time::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    fn task(minute: i64, run: &str) -> Task {
        Task {
            origin: LocationId(0),
            time: time("08:00") + Duration::minutes(minute),
            run: run.to_string(),
        }
    }

    fn walk_of(minutes: i64) -> Itinerary {
        Itinerary::new(vec![Movement::Walk(Walk {
            from: LocationId(0),
            to: LocationId(1),
            depart: time("08:00"),
            arrive: time("08:00") + Duration::minutes(minutes),
            distance_m: 80 * minutes as u32,
        })])
        .unwrap()
    }

    #[test]
    fn counting_card_counts_tasks() {
        let card = CountingScoreCard::new();
        assert!(!card.has_path(LocationId(1)));

        card.put_path(LocationId(1), &task(0, "am"), walk_of(5));
        card.put_path(LocationId(1), &task(1, "am"), walk_of(5));
        card.put_path(LocationId(1), &task(1, "pm"), walk_of(5));

        assert!(card.has_path(LocationId(1)));
        assert_eq!(card.reached_count(LocationId(1)), 3);
        assert_eq!(card.reached_count(LocationId(2)), 0);
        assert!(card.best_paths(LocationId(1), 5).is_empty());
        assert_eq!(card.summary().total_reached(), 3);
    }

    #[test]
    fn path_card_ranks_best_paths() {
        let card = PathScoreCard::new();
        card.put_path(LocationId(1), &task(0, "am"), walk_of(9));
        card.put_path(LocationId(1), &task(1, "am"), walk_of(4));
        card.put_path(LocationId(1), &task(2, "am"), walk_of(6));

        let best = card.best_paths(LocationId(1), 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].total_duration(), Duration::minutes(4));
        assert_eq!(best[1].total_duration(), Duration::minutes(6));

        let summary = card.summary();
        let score = &summary.locations[&LocationId(1)];
        assert_eq!(score.reached_count, 3);
        assert_eq!(score.best_minutes, Some(4));
        assert_eq!(card.path(LocationId(1), &task(2, "am")), Some(walk_of(6)));
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let card = Arc::new(PathScoreCard::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let card = Arc::clone(&card);
                std::thread::spawn(move || {
                    for minute in 0..50 {
                        card.put_path(LocationId(1), &task(minute, &format!("w{worker}")), walk_of(3));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(card.reached_count(LocationId(1)), 400);
    }

    #[test]
    fn summary_serializes() {
        let card = CountingScoreCard::new();
        card.put_path(LocationId(4), &task(0, "am"), Itinerary::empty());
        let json = serde_json::to_value(card.summary()).unwrap();
        assert_eq!(json["locations"]["4"]["reached_count"], 1);
    }

    proptest! {
        #[test]
        fn scoring_is_idempotent(inserts in prop::collection::vec((0u32..4, 0i64..5), 0..30)) {
            let counting = CountingScoreCard::new();
            let paths = PathScoreCard::new();
            let mut expected: HashMap<LocationId, HashSet<i64>> = HashMap::new();

            for (loc, minute) in inserts {
                // Every insert happens twice
                for _ in 0..2 {
                    counting.put_path(LocationId(loc), &task(minute, "run"), walk_of(minute + 1));
                    paths.put_path(LocationId(loc), &task(minute, "run"), walk_of(minute + 1));
                }
                expected.entry(LocationId(loc)).or_default().insert(minute);
            }

            for loc in (0..4).map(LocationId) {
                let want = expected.get(&loc).map_or(0, HashSet::len);
                prop_assert_eq!(counting.reached_count(loc), want);
                prop_assert_eq!(paths.reached_count(loc), want);
                prop_assert_eq!(counting.has_path(loc), want > 0);
            }
        }
    }
}
