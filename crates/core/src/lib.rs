#![forbid(unsafe_code)]

pub mod judge;
pub mod model;
pub mod time;

pub use judge::{ScoreReport, Verdict};
pub use time::Clock;
