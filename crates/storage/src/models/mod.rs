mod club;
mod club_points;
mod event;
mod ranking;
mod result;
mod rider;
mod scale;
mod series;
mod standing;

pub use club::Club;
pub use club_points::{ClubEventPoints, ClubRiderPoints};
pub use event::{Event, EventFormat};
pub use ranking::{ClubRanking, Discipline, RiderRanking};
pub use result::{RaceResult, ResultStatus};
pub use rider::Rider;
pub use scale::PointScale;
pub use series::Series;
pub use standing::ClubStanding;
