pub mod timer;

pub use timer::{Clock, ManualClock, MonotonicClock, StageStats, StageTimer};
