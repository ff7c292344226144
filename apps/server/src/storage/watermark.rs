use serde::{Deserialize, Serialize};

/// Monotonically non-decreasing marker of the most recent change to the
/// status log, measured in milliseconds since the Unix epoch.
///
/// Clients hold one as a checkpoint and ask the change oracle whether the
/// log has moved past it. `NONE` is the "no data yet" sentinel, distinct
/// from any real append time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(i64);

impl Watermark {
    pub const NONE: Watermark = Watermark(0);

    pub fn from_millis(millis: i64) -> Self {
        Watermark(millis.max(0))
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_orders_below_any_real_watermark() {
        assert!(Watermark::NONE < Watermark::from_millis(1));
        assert!(Watermark::NONE.is_none());
        assert!(!Watermark::from_millis(1).is_none());
    }

    #[test]
    fn negative_millis_clamp_to_the_sentinel() {
        assert_eq!(Watermark::from_millis(-5), Watermark::NONE);
    }
}
