use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::info;

/// Source of monotonic time for stage measurements
pub trait Clock: Clone {
    type Timestamp: Copy;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, since: Self::Timestamp) -> Duration;
}

#[derive(Debug, Clone)]
pub struct MonotonicClock {
    pub start: Instant,
}

impl Clock for MonotonicClock {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock advanced by hand, for tests
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn advance(&self, d: Duration) {
        self.now_ns.set(self.now_ns.get() + d.as_nanos() as u64);
    }
}

impl Clock for ManualClock {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.get()
    }
    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageStats {
    pub runs: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl StageStats {
    pub fn mean(&self) -> Duration {
        if self.runs == 0 {
            return Duration::ZERO;
        }
        self.total / self.runs as u32
    }

    fn record(&mut self, d: Duration) {
        self.runs += 1;
        self.total += d;
        self.min = self.min.min(d);
        self.max = self.max.max(d);
    }
}

/// Times named pipeline stages and logs each run as it completes
#[derive(Debug, Clone)]
pub struct StageTimer<C: Clock> {
    clock: C,
    stages: BTreeMap<&'static str, StageStats>,
}

impl<C: Clock> StageTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            stages: BTreeMap::new(),
        }
    }

    /// Runs `f`, recording and logging how long it took under `label`
    pub fn time<T>(&mut self, label: &'static str, f: impl FnOnce() -> T) -> T {
        let start = self.clock.now();
        let out = f();
        let elapsed = self.clock.elapsed(start);
        info!("Time for {label}: {:.3} ms", elapsed.as_secs_f64() * 1e3);
        self.stages
            .entry(label)
            .or_insert(StageStats {
                runs: 0,
                total: Duration::ZERO,
                min: Duration::MAX,
                max: Duration::ZERO,
            })
            .record(elapsed);
        out
    }

    pub fn stats(&self, label: &str) -> Option<&StageStats> {
        self.stages.get(label)
    }

    pub fn stages(&self) -> impl Iterator<Item = (&'static str, &StageStats)> + '_ {
        self.stages.iter().map(|(k, v)| (*k, v))
    }
}

impl Default for StageTimer<MonotonicClock> {
    fn default() -> Self {
        Self::new(MonotonicClock::new())
    }
}
