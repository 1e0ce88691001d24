//! Block time.
//!
//! Absolute positions in a recording and offsets between them are kept as
//! distinct types so an offset can never be used where a block timestamp is
//! expected (and two block timestamps cannot be added).

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Absolute time in the recording block, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

/// Offset between two points in block time, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativeTimestamp(pub f64);

impl Timestamp {
    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl RelativeTimestamp {
    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Add<RelativeTimestamp> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: RelativeTimestamp) -> Timestamp {
        Timestamp(self.0 + rhs.0)
    }
}

impl Sub<RelativeTimestamp> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: RelativeTimestamp) -> Timestamp {
        Timestamp(self.0 - rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = RelativeTimestamp;
    fn sub(self, rhs: Timestamp) -> RelativeTimestamp {
        RelativeTimestamp(self.0 - rhs.0)
    }
}

impl Add for RelativeTimestamp {
    type Output = RelativeTimestamp;
    fn add(self, rhs: RelativeTimestamp) -> RelativeTimestamp {
        RelativeTimestamp(self.0 + rhs.0)
    }
}

impl Sub for RelativeTimestamp {
    type Output = RelativeTimestamp;
    fn sub(self, rhs: RelativeTimestamp) -> RelativeTimestamp {
        RelativeTimestamp(self.0 - rhs.0)
    }
}

impl Neg for RelativeTimestamp {
    type Output = RelativeTimestamp;
    fn neg(self) -> RelativeTimestamp {
        RelativeTimestamp(-self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}s", self.0)
    }
}

impl fmt::Display for RelativeTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.4}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_keeps_absolute_and_relative_apart() {
        let t = Timestamp(10.0);
        let d = RelativeTimestamp(0.25);
        assert_eq!(t + d, Timestamp(10.25));
        assert_eq!(t - d, Timestamp(9.75));
        assert_eq!(Timestamp(10.25) - t, d);
        assert_eq!(d + d, RelativeTimestamp(0.5));
        assert_eq!(d - d, RelativeTimestamp(0.0));
        assert_eq!(-d, RelativeTimestamp(-0.25));
        assert_eq!((t - Timestamp(12.0)).abs(), RelativeTimestamp(2.0));
    }

    #[test]
    fn display() {
        assert_eq!(Timestamp(1.5).to_string(), "1.5000s");
        assert_eq!(RelativeTimestamp(-0.1).to_string(), "-0.1000s");
    }
}
