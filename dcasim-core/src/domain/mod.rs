//! Domain types for DCA Sim

pub mod bar;
pub mod calendar;
pub mod interval;

pub use bar::{check_series, Bar};
pub use calendar::WeekBucket;
pub use interval::{Interval, DEFAULT_WINDOW};
