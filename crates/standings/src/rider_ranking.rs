//! Full-table recompute of cumulative rider rankings and the club-level
//! ranking rollups, one discipline bucket at a time.
//!
//! Every run rebuilds from the complete scored history, so the outcome is
//! identical whether it follows a previous run or a clean database.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use storage::models::{ClubRanking, Discipline, RiderRanking};
use storage::store::RiderStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, ScoringError};
use crate::policy::RankingWeight;
use crate::report::{ItemError, ItemKind};

/// Outcome of one full ranking recompute.
#[derive(Debug)]
pub struct RankingUpdate {
    pub riders_processed: u64,
    /// Riders holding a ranking row, per discipline.
    pub riders_updated: BTreeMap<Discipline, u64>,
    /// Clubs holding a rollup row, per discipline.
    pub clubs_updated: BTreeMap<Discipline, u64>,
    pub errors: Vec<ItemError>,
    pub elapsed: Duration,
}

pub struct RankingAggregator {
    store: Arc<dyn RiderStore>,
    weight: Arc<dyn RankingWeight>,
    as_of: NaiveDate,
}

impl RankingAggregator {
    pub fn new(store: Arc<dyn RiderStore>, weight: Arc<dyn RankingWeight>, as_of: NaiveDate) -> Self {
        Self {
            store,
            weight,
            as_of,
        }
    }

    pub async fn recalculate_all(&self, dry_run: bool) -> Result<RankingUpdate> {
        let started = Instant::now();
        let riders = self.store.list_riders().await?;

        let mut riders_updated: BTreeMap<Discipline, u64> = BTreeMap::new();
        let mut clubs_updated: BTreeMap<Discipline, u64> = BTreeMap::new();
        let mut club_totals: BTreeMap<(Discipline, Uuid), (Decimal, i32)> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut riders_processed = 0u64;

        for rider in &riders {
            riders_processed += 1;

            let scores = match self.store.event_scores_for_rider(rider.rider_id).await {
                Ok(scores) => scores,
                Err(e) => {
                    let e = ScoringError::from(e);
                    if e.is_infrastructure() {
                        return Err(e);
                    }
                    warn!(rider = %rider.rider_id, error = %e, "skipping rider");
                    errors.push(ItemError::new(ItemKind::Rider, rider.rider_id, e.to_string()));
                    continue;
                }
            };

            let mut totals: BTreeMap<Discipline, (Decimal, i32)> = BTreeMap::new();
            for score in &scores {
                let weighted = self.weight.ranking_points(
                    score.points,
                    score.field_size,
                    score.event_date,
                    self.as_of,
                );
                for discipline in [score.format.discipline(), Discipline::Overall] {
                    let entry = totals.entry(discipline).or_insert((Decimal::ZERO, 0));
                    entry.0 += weighted;
                    entry.1 += 1;
                }
            }

            let rankings: Vec<RiderRanking> = totals
                .iter()
                .map(|(&discipline, &(points, event_count))| RiderRanking {
                    rider_id: rider.rider_id,
                    discipline,
                    points,
                    event_count,
                })
                .collect();

            for discipline in totals.keys() {
                *riders_updated.entry(*discipline).or_default() += 1;
            }

            if let Some(club_id) = rider.club_id {
                for (&discipline, &(points, _)) in &totals {
                    let entry = club_totals
                        .entry((discipline, club_id))
                        .or_insert((Decimal::ZERO, 0));
                    entry.0 += points;
                    entry.1 += 1;
                }
            }

            // Replaced even when empty so stale rows from removed results
            // do not survive the rebuild.
            if !dry_run {
                self.store
                    .replace_rider_rankings(rider.rider_id, rankings)
                    .await?;
            }
        }

        let club_rankings: Vec<ClubRanking> = club_totals
            .iter()
            .map(|(&(discipline, club_id), &(points, rider_count))| ClubRanking {
                club_id,
                discipline,
                points,
                rider_count,
            })
            .collect();

        for (discipline, _) in club_totals.keys() {
            *clubs_updated.entry(*discipline).or_default() += 1;
        }

        if !dry_run {
            self.store.replace_club_rankings(club_rankings).await?;
        }

        let update = RankingUpdate {
            riders_processed,
            riders_updated,
            clubs_updated,
            errors,
            elapsed: started.elapsed(),
        };

        debug!(
            riders = update.riders_processed,
            errors = update.errors.len(),
            weight = self.weight.version(),
            dry_run,
            "rider rankings recomputed"
        );

        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use storage::memory::MemoryStore;
    use storage::models::{Club, Event, EventFormat, RaceResult, ResultStatus, Rider};

    use crate::policy::FlatWeight;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date")
    }

    fn seed_event(store: &MemoryStore, format: EventFormat, day: u32) -> Uuid {
        let event_id = Uuid::new_v4();
        store.insert_event(Event {
            event_id,
            name: "event".to_string(),
            date: date(day),
            format,
            scale_id: None,
            series_id: None,
        });
        event_id
    }

    fn seed_scored_result(store: &MemoryStore, event_id: Uuid, rider_id: Uuid, points: i64) {
        store.insert_result(RaceResult {
            result_id: Uuid::new_v4(),
            event_id,
            rider_id,
            class_id: Some(Uuid::new_v4()),
            position: Some(1),
            seeding_position: None,
            status: ResultStatus::Finished,
            finish_time: None,
            points: Decimal::from(points),
        });
    }

    fn seed_rider(store: &MemoryStore, club_id: Option<Uuid>) -> Uuid {
        let rider_id = Uuid::new_v4();
        store.insert_rider(Rider {
            rider_id,
            name: "rider".to_string(),
            club_id,
        });
        rider_id
    }

    fn aggregator(store: Arc<MemoryStore>) -> RankingAggregator {
        RankingAggregator::new(store, Arc::new(FlatWeight), date(30))
    }

    #[tokio::test]
    async fn events_land_in_their_discipline_and_overall() {
        let store = Arc::new(MemoryStore::new());
        let rider = seed_rider(&store, None);
        let xc = seed_event(&store, EventFormat::Standard, 1);
        let dh = seed_event(&store, EventFormat::DownhillStandard, 2);
        seed_scored_result(&store, xc, rider, 100);
        seed_scored_result(&store, dh, rider, 40);

        aggregator(store.clone())
            .recalculate_all(false)
            .await
            .expect("recalculated");

        let rankings = store.rider_rankings(rider);
        assert_eq!(rankings.len(), 3);
        assert_eq!(rankings[0].discipline, Discipline::CrossCountry);
        assert_eq!(rankings[0].points, Decimal::from(100));
        assert_eq!(rankings[0].event_count, 1);
        assert_eq!(rankings[1].discipline, Discipline::Downhill);
        assert_eq!(rankings[1].points, Decimal::from(40));
        assert_eq!(rankings[2].discipline, Discipline::Overall);
        assert_eq!(rankings[2].points, Decimal::from(140));
        assert_eq!(rankings[2].event_count, 2);
    }

    #[tokio::test]
    async fn club_rollups_credit_member_contributions() {
        let store = Arc::new(MemoryStore::new());
        let club_id = Uuid::new_v4();
        store.insert_club(Club {
            club_id,
            name: "VC Nord".to_string(),
        });
        let a = seed_rider(&store, Some(club_id));
        let b = seed_rider(&store, Some(club_id));
        let unattached = seed_rider(&store, None);
        let event = seed_event(&store, EventFormat::Standard, 1);
        seed_scored_result(&store, event, a, 100);
        seed_scored_result(&store, event, b, 80);
        seed_scored_result(&store, event, unattached, 60);

        let update = aggregator(store.clone())
            .recalculate_all(false)
            .await
            .expect("recalculated");

        let rollups = store.club_rankings(club_id);
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].discipline, Discipline::CrossCountry);
        assert_eq!(rollups[0].points, Decimal::from(180));
        assert_eq!(rollups[0].rider_count, 2);
        assert_eq!(rollups[1].discipline, Discipline::Overall);
        assert_eq!(rollups[1].points, Decimal::from(180));

        assert_eq!(update.clubs_updated[&Discipline::CrossCountry], 1);
        assert_eq!(update.riders_updated[&Discipline::CrossCountry], 3);
    }

    #[tokio::test]
    async fn weighting_policy_is_applied() {
        struct Double;
        impl RankingWeight for Double {
            fn version(&self) -> &str {
                "double-test"
            }
            fn ranking_points(
                &self,
                event_points: Decimal,
                _field_size: u32,
                _event_date: NaiveDate,
                _as_of: NaiveDate,
            ) -> Decimal {
                event_points * Decimal::from(2)
            }
        }

        let store = Arc::new(MemoryStore::new());
        let rider = seed_rider(&store, None);
        let event = seed_event(&store, EventFormat::Standard, 1);
        seed_scored_result(&store, event, rider, 50);

        RankingAggregator::new(store.clone(), Arc::new(Double), date(30))
            .recalculate_all(false)
            .await
            .expect("recalculated");

        let rankings = store.rider_rankings(rider);
        assert_eq!(rankings[0].points, Decimal::from(100));
    }

    #[tokio::test]
    async fn rebuild_clears_stale_ranking_rows() {
        let store = Arc::new(MemoryStore::new());
        let rider = seed_rider(&store, None);
        let event = seed_event(&store, EventFormat::Standard, 1);
        seed_scored_result(&store, event, rider, 100);

        let aggregator = aggregator(store.clone());
        aggregator.recalculate_all(false).await.expect("first run");
        let clean = store.snapshot();

        // Corrupt the derived table, then recompute.
        store
            .replace_rider_rankings(
                rider,
                vec![RiderRanking {
                    rider_id: rider,
                    discipline: Discipline::Downhill,
                    points: Decimal::from(999),
                    event_count: 9,
                }],
            )
            .await
            .expect("corrupt");

        aggregator.recalculate_all(false).await.expect("second run");
        assert_eq!(clean, store.snapshot());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let rider = seed_rider(&store, Some(Uuid::new_v4()));
        let event = seed_event(&store, EventFormat::Standard, 1);
        seed_scored_result(&store, event, rider, 100);

        let before = store.snapshot();
        let update = aggregator(store.clone())
            .recalculate_all(true)
            .await
            .expect("dry run");

        assert_eq!(update.riders_processed, 1);
        assert_eq!(update.riders_updated[&Discipline::Overall], 1);
        assert_eq!(before, store.snapshot());
    }
}
