//! Bounded binary search over encode parameters

/// Acceptable output size window in bytes (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeTargetRange {
    pub min: u64,
    pub max: u64,
}

impl SizeTargetRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Window ending at `cap_kib` KiB and starting `window_kib` KiB below it
    pub fn from_cap_kib(cap_kib: u64, window_kib: u64) -> Self {
        Self {
            min: cap_kib.saturating_sub(window_kib).saturating_mul(1024),
            max: cap_kib.saturating_mul(1024),
        }
    }

    pub fn contains(&self, size: u64) -> bool {
        self.min <= size && size <= self.max
    }

    /// True when `min < max`
    pub fn is_valid(&self) -> bool {
        self.min < self.max
    }
}

/// Inclusive integer range searched over (frame count or quality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchSpace {
    pub low: u32,
    pub high: u32,
}

impl SearchSpace {
    pub fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }
}

/// A value returned by [`bounded_search`] and the size it measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub value: u32,
    pub size: u64,
}

/// Binary search for a value whose evaluated size lands inside `target`.
///
/// `evaluate` returns the encoded size for a value, or `None` when the trial
/// failed; a failure counts as an infinitely large result. The first in-window
/// evaluation is returned as is. Otherwise the largest under-window value seen
/// is returned, and `None` when every evaluation overshot `target.max`.
///
/// The search assumes size grows with the value. When it does not, an
/// in-window value may be skipped, but the returned size never exceeds
/// `target.max`.
pub fn bounded_search<F>(
    target: SizeTargetRange,
    space: SearchSpace,
    mut evaluate: F,
) -> Option<SearchHit>
where
    F: FnMut(u32) -> Option<u64>,
{
    // Nothing positive to try
    if space.is_empty() || space.high == 0 {
        return None;
    }

    let mut low = space.low;
    let mut high = space.high;
    let mut best: Option<SearchHit> = None;

    while low <= high {
        // A zero-sized trial is meaningless
        let mid = (low + (high - low) / 2).max(1);
        let size = evaluate(mid).unwrap_or(u64::MAX);

        if target.contains(size) {
            return Some(SearchHit { value: mid, size });
        } else if size < target.min {
            best = Some(SearchHit { value: mid, size });
            if mid == high {
                break;
            }
            low = mid + 1;
        } else {
            // Below 1 there is nothing left to evaluate
            if mid <= 1 {
                break;
            }
            high = mid - 1;
        }
    }

    best.filter(|hit| hit.size <= target.max)
}
