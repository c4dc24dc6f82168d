pub mod ranking;

pub use ranking::RiderEventScore;
