//! Per-tracker cache of computed frames.

use crate::track::FrameData;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Computed (non-key) frames, keyed by frame index.
///
/// Invalidation marks entries stale instead of dropping them so the last
/// result stays inspectable; the walk recomputes any stale entry.
#[derive(Clone, Debug, Default)]
pub struct FrameCache {
    frames: BTreeMap<usize, FrameData>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, frame: usize) -> Option<&FrameData> {
        self.frames.get(&frame)
    }

    /// Entry for `frame` if it is still valid.
    pub fn valid(&self, frame: usize) -> Option<&FrameData> {
        self.frames.get(&frame).filter(|d| d.is_valid())
    }

    pub fn insert(&mut self, data: FrameData) {
        self.frames.insert(data.frame(), data);
    }

    /// Marks entries in `start..end` (open-ended when `end` is `None`)
    /// stale and returns how many were valid.
    pub fn invalidate_range(&mut self, start: usize, end: Option<usize>) -> usize {
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        if end.is_some_and(|e| e <= start) {
            return 0;
        }
        let mut count = 0;
        for data in self
            .frames
            .range_mut((Bound::Included(start), upper))
            .map(|(_, d)| d)
        {
            if data.valid {
                data.valid = false;
                count += 1;
            }
        }
        count
    }

    /// Marks every entry at or after `start` stale.
    pub fn invalidate_from(&mut self, start: usize) -> usize {
        self.invalidate_range(start, None)
    }

    /// Valid entries strictly between `after` and `before`, newest first.
    pub fn valid_between_rev(
        &self,
        after: usize,
        before: usize,
    ) -> impl Iterator<Item = &FrameData> + '_ {
        let first = after.saturating_add(1);
        self.frames
            .range(first..before.max(first))
            .rev()
            .map(|(_, d)| d)
            .filter(|d| d.is_valid())
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
