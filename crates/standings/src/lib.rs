pub mod club_points;
pub mod error;
pub mod event_points;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod rider_ranking;
pub mod scale;
pub mod standings_cache;

pub use club_points::ClubPointsAggregator;
pub use error::{Result, ScoringError};
pub use event_points::EventPointsCalculator;
pub use orchestrator::{RecalcStage, Recalculation};
pub use policy::ScoringPolicies;
pub use rider_ranking::RankingAggregator;
pub use standings_cache::StandingsCacheBuilder;
