//! The batch driver for a full recalculation.
//!
//! An explicit state machine replaces step-index page logic: the operator
//! advances one stage at a time, each stage iterates its collection
//! sequentially, and a single item's failure never aborts the stage. Every
//! stage is an idempotent full recompute, so re-running after a mid-stage
//! infrastructure failure needs no reasoning about partial state.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use storage::store::StandingsStore;
use tracing::{info, warn};

use crate::club_points::ClubPointsAggregator;
use crate::error::{Result, ScoringError};
use crate::event_points::EventPointsCalculator;
use crate::policy::ScoringPolicies;
use crate::report::{ItemError, ItemKind, RecalcSummary, StageReport};
use crate::rider_ranking::RankingAggregator;
use crate::standings_cache::StandingsCacheBuilder;

/// Pipeline position. The last completed stage; `Stage3ClubPoints` labels
/// the final work report, after which the machine rests at `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcStage {
    Summary,
    Stage1EventPoints,
    Stage2RankingPoints,
    Stage3ClubPoints,
    Complete,
}

impl RecalcStage {
    pub fn label(&self) -> &'static str {
        match self {
            RecalcStage::Summary => "summary",
            RecalcStage::Stage1EventPoints => "event points",
            RecalcStage::Stage2RankingPoints => "ranking points",
            RecalcStage::Stage3ClubPoints => "club points",
            RecalcStage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RecalcStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub struct Recalculation {
    store: Arc<dyn StandingsStore>,
    event_points: EventPointsCalculator,
    rankings: RankingAggregator,
    club_points: ClubPointsAggregator,
    standings: StandingsCacheBuilder,
    stage: RecalcStage,
}

impl Recalculation {
    pub fn new<S: StandingsStore + 'static>(
        store: Arc<S>,
        policies: ScoringPolicies,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            event_points: EventPointsCalculator::new(store.clone(), policies.combiner.clone()),
            rankings: RankingAggregator::new(store.clone(), policies.weight.clone(), as_of),
            club_points: ClubPointsAggregator::new(store.clone(), policies.selection.clone()),
            standings: StandingsCacheBuilder::new(store.clone()),
            store,
            stage: RecalcStage::Summary,
        }
    }

    pub fn stage(&self) -> RecalcStage {
        self.stage
    }

    /// Collection counts shown on the summary step, before any work runs.
    pub async fn summary(&self) -> Result<RecalcSummary> {
        Ok(RecalcSummary {
            events: self.store.list_events().await?.len() as u64,
            riders: self.store.list_riders().await?.len() as u64,
            active_series: self.store.list_series(true).await?.len() as u64,
        })
    }

    /// Runs the next stage. Transitions are operator-driven only; there is
    /// no automatic chaining between stages.
    pub async fn advance(&mut self, dry_run: bool) -> Result<StageReport> {
        let report = match self.stage {
            RecalcStage::Summary => {
                let report = self.run_event_points(dry_run).await?;
                self.stage = RecalcStage::Stage1EventPoints;
                report
            }
            RecalcStage::Stage1EventPoints => {
                let report = self.run_ranking_points(dry_run).await?;
                self.stage = RecalcStage::Stage2RankingPoints;
                report
            }
            RecalcStage::Stage2RankingPoints => {
                let report = self.run_club_points(dry_run).await?;
                self.stage = RecalcStage::Complete;
                report
            }
            RecalcStage::Stage3ClubPoints | RecalcStage::Complete => {
                return Err(ScoringError::AlreadyComplete);
            }
        };

        info!(dry_run, "{report}");
        for error in &report.errors {
            warn!("{error}");
        }

        Ok(report)
    }

    async fn run_event_points(&self, dry_run: bool) -> Result<StageReport> {
        let started = Instant::now();
        let events = self.store.list_events().await?;

        let mut report = StageReport::empty(RecalcStage::Stage1EventPoints);
        for event in &events {
            report.processed += 1;
            match self.event_points.recalculate_event(event, dry_run).await {
                Ok(update) => {
                    report.updated += update.updated;
                    report.errors.extend(update.errors);
                }
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    report
                        .errors
                        .push(ItemError::new(ItemKind::Event, event.event_id, e.to_string()));
                }
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    async fn run_ranking_points(&self, dry_run: bool) -> Result<StageReport> {
        let update = self.rankings.recalculate_all(dry_run).await?;

        for (discipline, riders) in &update.riders_updated {
            info!(
                discipline = %discipline,
                riders,
                clubs = update.clubs_updated.get(discipline).copied().unwrap_or(0),
                "ranking bucket recomputed"
            );
        }

        let updated = update.riders_updated.values().sum::<u64>()
            + update.clubs_updated.values().sum::<u64>();

        Ok(StageReport {
            stage: RecalcStage::Stage2RankingPoints,
            processed: update.riders_processed,
            updated,
            errors: update.errors,
            elapsed: update.elapsed,
        })
    }

    async fn run_club_points(&self, dry_run: bool) -> Result<StageReport> {
        let started = Instant::now();
        let series_list = self.store.list_series(true).await?;

        let mut report = StageReport::empty(RecalcStage::Stage3ClubPoints);
        for series in &series_list {
            report.processed += 1;
            let update = match self.club_points.recalculate_series(series, dry_run).await {
                Ok(update) => update,
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    report.errors.push(ItemError::new(
                        ItemKind::Series,
                        series.series_id,
                        e.to_string(),
                    ));
                    continue;
                }
            };
            report.errors.extend(update.errors);

            // Rank the rows just computed; in a dry run the stored
            // intermediates were never written.
            match self
                .standings
                .rebuild_with(series, &update.event_points, dry_run)
                .await
            {
                Ok(rows) => report.updated += rows,
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    report.errors.push(ItemError::new(
                        ItemKind::Series,
                        series.series_id,
                        e.to_string(),
                    ));
                }
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use storage::StorageError;
    use storage::dto::RiderEventScore;
    use storage::memory::MemoryStore;
    use storage::models::{
        Club, ClubEventPoints, ClubRanking, ClubRiderPoints, ClubStanding, Event, EventFormat,
        PointScale, RaceResult, ResultStatus, Rider, RiderRanking, Series,
    };
    use storage::store::{ClubPointsStore, EventStore, RiderStore, SeriesStore};
    use uuid::Uuid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date")
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        series: Series,
        club_a: Uuid,
        club_b: Uuid,
    }

    /// Two standard events in one active series, two clubs with two riders
    /// each, full result sheets for both events.
    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());

        store.insert_scale(PointScale {
            scale_id: Uuid::new_v4(),
            name: "standard".to_string(),
            values: [100, 80, 60, 50].iter().map(|&p| Decimal::from(p)).collect(),
            trailing: Decimal::ZERO,
            default_for_format: Some(EventFormat::Standard),
        });

        let series = Series {
            series_id: Uuid::new_v4(),
            name: "spring cup".to_string(),
            year: 2025,
            active: true,
        };
        store.insert_series(series.clone());

        let club_a = Uuid::new_v4();
        let club_b = Uuid::new_v4();
        store.insert_club(Club {
            club_id: club_a,
            name: "Alpha CC".to_string(),
        });
        store.insert_club(Club {
            club_id: club_b,
            name: "Beta CC".to_string(),
        });

        let riders: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for (index, &rider_id) in riders.iter().enumerate() {
            store.insert_rider(Rider {
                rider_id,
                name: format!("rider {index}"),
                club_id: Some(if index < 2 { club_a } else { club_b }),
            });
        }

        let owned = Event {
            event_id: Uuid::new_v4(),
            name: "round 1".to_string(),
            date: date(1),
            format: EventFormat::Standard,
            scale_id: None,
            series_id: Some(series.series_id),
        };
        let joined = Event {
            event_id: Uuid::new_v4(),
            name: "round 2".to_string(),
            date: date(8),
            format: EventFormat::Standard,
            scale_id: None,
            series_id: None,
        };
        store.insert_event(owned.clone());
        store.insert_event(joined.clone());
        store.link_series_event(series.series_id, joined.event_id);

        let class = Uuid::new_v4();
        for event_id in [owned.event_id, joined.event_id] {
            for (index, &rider_id) in riders.iter().enumerate() {
                store.insert_result(RaceResult {
                    result_id: Uuid::new_v4(),
                    event_id,
                    rider_id,
                    class_id: Some(class),
                    position: Some(index as i32 + 1),
                    seeding_position: None,
                    status: ResultStatus::Finished,
                    finish_time: None,
                    points: Decimal::ZERO,
                });
            }
        }

        Fixture {
            store,
            series,
            club_a,
            club_b,
        }
    }

    fn recalculation(store: Arc<MemoryStore>) -> Recalculation {
        Recalculation::new(store, ScoringPolicies::default(), date(30))
    }

    /// Delegates to a [`MemoryStore`] but reports a closed pool once the
    /// allowed number of point writes is spent.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        writes_allowed: AtomicU32,
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn list_events(&self) -> storage::Result<Vec<Event>> {
            self.inner.list_events().await
        }

        async fn results_for_event(&self, event_id: Uuid) -> storage::Result<Vec<RaceResult>> {
            self.inner.results_for_event(event_id).await
        }

        async fn set_result_points(
            &self,
            result_id: Uuid,
            points: Decimal,
        ) -> storage::Result<()> {
            let spent = self
                .writes_allowed
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err();
            if spent {
                return Err(StorageError::Database(sqlx::Error::PoolClosed));
            }
            self.inner.set_result_points(result_id, points).await
        }

        async fn find_scale(&self, scale_id: Uuid) -> storage::Result<Option<PointScale>> {
            self.inner.find_scale(scale_id).await
        }

        async fn default_scale_for_format(
            &self,
            format: EventFormat,
        ) -> storage::Result<Option<PointScale>> {
            self.inner.default_scale_for_format(format).await
        }
    }

    #[async_trait]
    impl RiderStore for FlakyStore {
        async fn list_riders(&self) -> storage::Result<Vec<Rider>> {
            self.inner.list_riders().await
        }

        async fn event_scores_for_rider(
            &self,
            rider_id: Uuid,
        ) -> storage::Result<Vec<RiderEventScore>> {
            self.inner.event_scores_for_rider(rider_id).await
        }

        async fn replace_rider_rankings(
            &self,
            rider_id: Uuid,
            rankings: Vec<RiderRanking>,
        ) -> storage::Result<()> {
            self.inner.replace_rider_rankings(rider_id, rankings).await
        }

        async fn replace_club_rankings(
            &self,
            rankings: Vec<ClubRanking>,
        ) -> storage::Result<()> {
            self.inner.replace_club_rankings(rankings).await
        }
    }

    #[async_trait]
    impl SeriesStore for FlakyStore {
        async fn list_series(&self, only_active: bool) -> storage::Result<Vec<Series>> {
            self.inner.list_series(only_active).await
        }

        async fn find_series(&self, series_id: Uuid) -> storage::Result<Series> {
            self.inner.find_series(series_id).await
        }

        async fn events_for_series(&self, series_id: Uuid) -> storage::Result<Vec<Event>> {
            self.inner.events_for_series(series_id).await
        }

        async fn list_clubs(&self) -> storage::Result<Vec<Club>> {
            self.inner.list_clubs().await
        }
    }

    #[async_trait]
    impl ClubPointsStore for FlakyStore {
        async fn replace_event_club_points(
            &self,
            event_id: Uuid,
            series_id: Uuid,
            rows: Vec<ClubEventPoints>,
        ) -> storage::Result<()> {
            self.inner
                .replace_event_club_points(event_id, series_id, rows)
                .await
        }

        async fn replace_rider_club_points(
            &self,
            series_id: Uuid,
            rows: Vec<ClubRiderPoints>,
        ) -> storage::Result<()> {
            self.inner.replace_rider_club_points(series_id, rows).await
        }

        async fn event_points_for_series(
            &self,
            series_id: Uuid,
        ) -> storage::Result<Vec<ClubEventPoints>> {
            self.inner.event_points_for_series(series_id).await
        }

        async fn replace_standings(
            &self,
            series_id: Uuid,
            rows: Vec<ClubStanding>,
        ) -> storage::Result<u64> {
            self.inner.replace_standings(series_id, rows).await
        }

        async fn standings_for_series(
            &self,
            series_id: Uuid,
        ) -> storage::Result<Vec<ClubStanding>> {
            self.inner.standings_for_series(series_id).await
        }
    }

    async fn run_to_completion(recalc: &mut Recalculation, dry_run: bool) -> Vec<StageReport> {
        let mut reports = Vec::new();
        while recalc.stage() != RecalcStage::Complete {
            reports.push(recalc.advance(dry_run).await.expect("stage ran"));
        }
        reports
    }

    #[tokio::test]
    async fn stages_advance_in_order_and_finish() {
        let fixture = fixture();
        let mut recalc = recalculation(fixture.store.clone());
        assert_eq!(recalc.stage(), RecalcStage::Summary);

        let summary = recalc.summary().await.expect("summary");
        assert_eq!(summary.events, 2);
        assert_eq!(summary.riders, 4);
        assert_eq!(summary.active_series, 1);

        let reports = run_to_completion(&mut recalc, false).await;
        let stages: Vec<_> = reports.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![
                RecalcStage::Stage1EventPoints,
                RecalcStage::Stage2RankingPoints,
                RecalcStage::Stage3ClubPoints,
            ]
        );
        assert_eq!(recalc.stage(), RecalcStage::Complete);

        let err = recalc.advance(false).await.expect_err("terminal");
        assert!(matches!(err, ScoringError::AlreadyComplete));
    }

    #[tokio::test]
    async fn full_pipeline_produces_consistent_standings() {
        let fixture = fixture();
        let mut recalc = recalculation(fixture.store.clone());
        run_to_completion(&mut recalc, false).await;

        // Per event: club A takes 100 + 80, club B takes 60 + 50.
        let standings = fixture
            .store
            .standings_for_series(fixture.series.series_id)
            .await
            .expect("standings");
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].club_id, fixture.club_a);
        assert_eq!(standings[0].total_points, Decimal::from(360));
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].club_id, fixture.club_b);
        assert_eq!(standings[1].total_points, Decimal::from(220));
        assert_eq!(standings[1].rank, 2);

        // Cache consistency: the cached totals equal the sum of the
        // intermediate event rows.
        let event_rows = fixture
            .store
            .event_points_for_series(fixture.series.series_id)
            .await
            .expect("event rows");
        for standing in &standings {
            let sum: Decimal = event_rows
                .iter()
                .filter(|r| r.club_id == standing.club_id)
                .map(|r| r.points)
                .sum();
            assert_eq!(standing.total_points, sum);
        }
    }

    #[tokio::test]
    async fn pipeline_is_idempotent() {
        let fixture = fixture();

        let mut first = recalculation(fixture.store.clone());
        run_to_completion(&mut first, false).await;
        let after_first = fixture.store.snapshot();

        let mut second = recalculation(fixture.store.clone());
        run_to_completion(&mut second, false).await;

        assert_eq!(after_first, fixture.store.snapshot());
    }

    #[tokio::test]
    async fn dry_run_has_no_observable_side_effect() {
        let fixture = fixture();
        let before = fixture.store.snapshot();

        let mut dry = recalculation(fixture.store.clone());
        let dry_reports = run_to_completion(&mut dry, true).await;
        assert_eq!(before, fixture.store.snapshot());

        // Every dry stage predicts the counts of the commit run that
        // follows it, including stage 3 ranking rows no dry write ever
        // persisted.
        let mut commit = recalculation(fixture.store.clone());
        let commit_reports = run_to_completion(&mut commit, false).await;
        assert_eq!(dry_reports.len(), commit_reports.len());
        for (dry_report, commit_report) in dry_reports.iter().zip(&commit_reports) {
            assert_eq!(dry_report.stage, commit_report.stage);
            assert_eq!(dry_report.processed, commit_report.processed);
            assert_eq!(dry_report.updated, commit_report.updated);
            assert_eq!(dry_report.errors, commit_report.errors);
        }
    }

    #[tokio::test]
    async fn unresolvable_event_is_reported_and_skipped() {
        let fixture = fixture();

        // A downhill event with no scale configured for its format.
        let broken = Event {
            event_id: Uuid::new_v4(),
            name: "hill race".to_string(),
            date: date(15),
            format: EventFormat::DownhillStandard,
            scale_id: None,
            series_id: None,
        };
        fixture.store.insert_event(broken.clone());

        let mut recalc = recalculation(fixture.store.clone());
        let report = recalc.advance(false).await.expect("stage 1");

        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 8);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, broken.event_id);
        assert!(report.errors[0].message.contains("no point scale"));
    }

    #[tokio::test]
    async fn connectivity_failure_aborts_the_stage_and_keeps_prior_writes() {
        let fixture = fixture();
        let store = Arc::new(FlakyStore {
            inner: fixture.store.clone(),
            writes_allowed: AtomicU32::new(3),
        });
        let mut recalc = Recalculation::new(store, ScoringPolicies::default(), date(30));

        let err = recalc.advance(false).await.expect_err("pool closed");
        assert!(err.is_infrastructure());
        // The machine stays put, so the stage can be retried.
        assert_eq!(recalc.stage(), RecalcStage::Summary);

        // Writes made before the failure are committed.
        let mut written = 0;
        for event in fixture.store.list_events().await.expect("events") {
            for result in fixture
                .store
                .results_for_event(event.event_id)
                .await
                .expect("results")
            {
                if result.points > Decimal::ZERO {
                    written += 1;
                }
            }
        }
        assert_eq!(written, 3);
    }

    #[tokio::test]
    async fn inactive_series_are_not_recomputed() {
        let fixture = fixture();
        let dormant = Series {
            series_id: Uuid::new_v4(),
            name: "retired cup".to_string(),
            year: 2019,
            active: false,
        };
        fixture.store.insert_series(dormant.clone());

        let mut recalc = recalculation(fixture.store.clone());
        run_to_completion(&mut recalc, false).await;

        let standings = fixture
            .store
            .standings_for_series(dormant.series_id)
            .await
            .expect("standings");
        assert!(standings.is_empty());
    }
}
