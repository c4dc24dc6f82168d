//! Per-event recomputation of `results.points`.
//!
//! Format dispatch is a closed set: [`EventScoring::for_event`] picks the
//! variant once per event, and both variants share the same contract. One
//! bad row never aborts the event; it is recorded and scoring continues.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use storage::models::{Event, PointScale, RaceResult};
use storage::store::EventStore;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, ScoringError};
use crate::policy::RunCombiner;
use crate::report::{ItemError, ItemKind};
use crate::scale::resolve_scale;

/// Outcome of recomputing one event.
#[derive(Debug)]
pub struct EventUpdate {
    pub updated: u64,
    pub errors: Vec<ItemError>,
}

pub struct EventPointsCalculator {
    store: Arc<dyn EventStore>,
    combiner: Arc<dyn RunCombiner>,
}

impl EventPointsCalculator {
    pub fn new(store: Arc<dyn EventStore>, combiner: Arc<dyn RunCombiner>) -> Self {
        Self { store, combiner }
    }

    /// Recomputes `points` on every result of the event. Writes nothing
    /// else: position and status stay untouched, and in dry-run mode not
    /// even points are persisted.
    pub async fn recalculate_event(&self, event: &Event, dry_run: bool) -> Result<EventUpdate> {
        let scale = resolve_scale(self.store.as_ref(), event).await?;
        let results = self.store.results_for_event(event.event_id).await?;
        let scoring = EventScoring::for_event(event, self.combiner.as_ref());

        let mut errors = Vec::new();
        let mut by_class: BTreeMap<Uuid, Vec<RaceResult>> = BTreeMap::new();
        for result in results {
            match result.class_id {
                Some(class_id) => by_class.entry(class_id).or_default().push(result),
                None => errors.push(ItemError::new(
                    ItemKind::Result,
                    result.result_id,
                    ScoringError::MissingClass {
                        result_id: result.result_id,
                    }
                    .to_string(),
                )),
            }
        }

        let mut scored = Vec::new();
        for entries in by_class.values() {
            let class_scores = scoring.score_class(&scale, entries);
            scored.extend(class_scores.points);
            errors.extend(class_scores.errors);
        }

        let mut updated = 0u64;
        for (result_id, points) in scored {
            if !dry_run {
                self.store.set_result_points(result_id, points).await?;
            }
            updated += 1;
        }

        debug!(
            event = %event.event_id,
            format = %event.format,
            updated,
            errors = errors.len(),
            dry_run,
            "event points recomputed"
        );

        Ok(EventUpdate { updated, errors })
    }
}

struct ClassScores {
    points: Vec<(Uuid, Decimal)>,
    errors: Vec<ItemError>,
}

impl ClassScores {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record(&mut self, result_id: Uuid, err: ScoringError) {
        self.errors
            .push(ItemError::new(ItemKind::Result, result_id, err.to_string()));
    }
}

/// The closed set of scoring variants, one per event format family.
pub enum EventScoring<'a> {
    Standard(StandardScoring),
    Downhill(DownhillScoring<'a>),
}

impl<'a> EventScoring<'a> {
    pub fn for_event(event: &Event, combiner: &'a dyn RunCombiner) -> Self {
        if event.format.is_downhill() {
            EventScoring::Downhill(DownhillScoring { combiner })
        } else {
            EventScoring::Standard(StandardScoring)
        }
    }

    fn score_class(&self, scale: &PointScale, entries: &[RaceResult]) -> ClassScores {
        match self {
            EventScoring::Standard(scoring) => scoring.score_class(scale, entries),
            EventScoring::Downhill(scoring) => scoring.score_class(scale, entries),
        }
    }
}

/// Mass-start scoring: the recorded finishing position indexes the scale
/// directly, so riders sharing a position share its points.
pub struct StandardScoring;

impl StandardScoring {
    fn score_class(&self, scale: &PointScale, entries: &[RaceResult]) -> ClassScores {
        let mut scores = ClassScores::new();
        for entry in ordered(entries) {
            if !entry.status.is_finished() {
                scores.points.push((entry.result_id, scale.trailing));
                continue;
            }
            match entry.position {
                Some(position) if position > 0 => scores
                    .points
                    .push((entry.result_id, scale.points_for(position as u32))),
                Some(position) => scores.record(
                    entry.result_id,
                    ScoringError::InvalidPosition {
                        result_id: entry.result_id,
                        position,
                    },
                ),
                None => scores.record(
                    entry.result_id,
                    ScoringError::UnscorablePlacement {
                        result_id: entry.result_id,
                    },
                ),
            }
        }
        scores
    }
}

/// Timed-run scoring: final-run and qualification placements collapse into
/// one scored position through the injected combiner. The season-variant
/// format picks up its alternate scale via the resolver, not here.
pub struct DownhillScoring<'a> {
    combiner: &'a dyn RunCombiner,
}

impl DownhillScoring<'_> {
    fn score_class(&self, scale: &PointScale, entries: &[RaceResult]) -> ClassScores {
        let mut scores = ClassScores::new();
        for entry in ordered(entries) {
            if !entry.status.is_finished() {
                scores.points.push((entry.result_id, scale.trailing));
                continue;
            }
            match self
                .combiner
                .scored_position(entry.position, entry.seeding_position)
            {
                Some(position) if position > 0 => scores
                    .points
                    .push((entry.result_id, scale.points_for(position as u32))),
                Some(position) => scores.record(
                    entry.result_id,
                    ScoringError::InvalidPosition {
                        result_id: entry.result_id,
                        position,
                    },
                ),
                None => scores.record(
                    entry.result_id,
                    ScoringError::UnscorablePlacement {
                        result_id: entry.result_id,
                    },
                ),
            }
        }
        scores
    }
}

/// Finished entries first by position, then everything else; stable ids
/// keep the write order deterministic.
fn ordered(entries: &[RaceResult]) -> Vec<&RaceResult> {
    let mut ordered: Vec<&RaceResult> = entries.iter().collect();
    ordered.sort_by_key(|r| {
        (
            !r.status.is_finished(),
            r.position.unwrap_or(i32::MAX),
            r.result_id,
        )
    });
    ordered
}
