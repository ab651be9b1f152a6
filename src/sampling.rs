//! Sampling-plan math.
//!
//! This module is the pure-arithmetic half of the extractor: given the total
//! number of eligible frames across a corpus and the number of frames the
//! caller wants, [`ExtractionPlan`] fixes one global sampling interval, and
//! [`SamplePositions`] turns that interval into the sequence of frame indices
//! to pull from a single video. No I/O happens here, which is what makes the
//! allocation behavior testable without decoding anything.
//!
//! Positions are accumulated in floating point and truncated to integers
//! only when yielded, so the spacing error never compounds: sampling every
//! 2.5 frames lands on 1, 3, 6, 8, … rather than drifting.

/// The global sampling plan for one extraction run.
///
/// Computed **once** from the corpus-wide eligible frame total and the
/// requested extraction count, then applied unchanged to every video. The
/// remaining extraction budget is deliberately not part of the plan — it is
/// an accumulator owned by the orchestration loop in
/// [`extract::run`](crate::extract::run).
///
/// # Example
///
/// ```
/// use framesift::ExtractionPlan;
///
/// // 10 videos x 100 frames, 50 frames wanted => sample every 20 frames.
/// let plan = ExtractionPlan::compute(1000, 50);
/// assert_eq!(plan.sample_every(), 20.0);
///
/// let positions: Vec<u64> = plan.positions(100, 0).collect();
/// assert_eq!(positions, vec![10, 30, 50, 70, 90]);
/// ```
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct ExtractionPlan {
    sample_every: f64,
}

impl ExtractionPlan {
    /// Compute the sampling interval: eligible frames divided by the target.
    ///
    /// `frames_to_extract` must be greater than zero; this is a documented
    /// precondition, not a runtime check (the CLI enforces it at the
    /// argument boundary). A zero target still cannot crash — the division
    /// yields an infinite interval and every position sequence comes out
    /// empty. A zero eligible total likewise produces an interval of `0.0`
    /// and empty sequences.
    ///
    /// The interval may be fractional, and may be below `1.0` when more
    /// frames are requested than exist; see [`SamplePositions`] for how
    /// truncation behaves in that case.
    pub fn compute(total_eligible_frames: u64, frames_to_extract: u64) -> Self {
        Self {
            sample_every: total_eligible_frames as f64 / frames_to_extract as f64,
        }
    }

    /// The interval, in frames, between consecutive samples.
    pub fn sample_every(&self) -> f64 {
        self.sample_every
    }

    /// The sample positions for one video of `frame_count` frames, skipping
    /// `skip` frames at the start.
    ///
    /// The first position sits half an interval past the skip point, so the
    /// first sample is centered in its bucket instead of hugging the skip
    /// boundary. Positions then advance by the interval and stop before
    /// `frame_count - 1`.
    pub fn positions(&self, frame_count: u64, skip: u64) -> SamplePositions {
        SamplePositions {
            position: skip as f64 + self.sample_every / 2.0,
            limit: frame_count as f64 - 1.0,
            step: self.sample_every,
        }
    }
}

/// Iterator over the truncated sample positions within a single video.
///
/// Yields `floor(position)` for `position = skip + interval/2, skip +
/// 3*interval/2, …` while `position < frame_count - 1`. The untruncated
/// position advances in `f64`; only the yielded value is truncated, so
/// repeated truncations (possible when the interval is below `1.0`) never
/// stall the sequence.
///
/// A non-positive interval yields nothing. That situation only arises when
/// the eligible total was zero, and an empty sequence is the deterministic
/// reading of "there is nothing to sample".
#[derive(Debug, Clone)]
pub struct SamplePositions {
    position: f64,
    limit: f64,
    step: f64,
}

impl Iterator for SamplePositions {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.step <= 0.0 || !self.step.is_finite() {
            return None;
        }
        if self.position >= self.limit {
            return None;
        }
        let truncated = self.position as u64;
        self.position += self.step;
        Some(truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionPlan;

    #[test]
    fn interval_is_total_over_target() {
        let plan = ExtractionPlan::compute(1000, 50);
        assert_eq!(plan.sample_every(), 20.0);

        let plan = ExtractionPlan::compute(1000, 400);
        assert_eq!(plan.sample_every(), 2.5);
    }

    #[test]
    fn first_position_is_centered_in_its_bucket() {
        let plan = ExtractionPlan::compute(1000, 50);
        assert_eq!(plan.positions(100, 0).next(), Some(10));
        assert_eq!(plan.positions(100, 7).next(), Some(17));
    }

    #[test]
    fn positions_are_strictly_increasing_for_wide_intervals() {
        let plan = ExtractionPlan::compute(1000, 50);
        let positions: Vec<u64> = plan.positions(100, 0).collect();
        assert_eq!(positions, vec![10, 30, 50, 70, 90]);
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn positions_stop_before_the_final_frame() {
        // Interval 20, 91 frames: 10, 30, 50, 70 fit; 90 >= 90 does not.
        let plan = ExtractionPlan::compute(1000, 50);
        let positions: Vec<u64> = plan.positions(91, 0).collect();
        assert_eq!(positions, vec![10, 30, 50, 70]);
    }

    #[test]
    fn fractional_intervals_truncate_without_drifting() {
        // Interval 2.5 starting at 1.25: 1.25, 3.75, 6.25, 8.75, ...
        let plan = ExtractionPlan::compute(1000, 400);
        let positions: Vec<u64> = plan.positions(12, 0).collect();
        assert_eq!(positions, vec![1, 3, 6, 8]);
    }

    #[test]
    fn attempt_count_matches_eligible_over_interval() {
        // One 1000-frame video, target 100: exactly 100 attempts.
        let plan = ExtractionPlan::compute(1000, 100);
        assert_eq!(plan.positions(1000, 0).count(), 100);

        // With a skip the eligible range shrinks by the skip amount.
        let plan = ExtractionPlan::compute(900, 100);
        let count = plan.positions(1000, 100).count() as i64;
        let expected = (900.0 / plan.sample_every()).floor() as i64;
        assert!((count - expected).abs() <= 1);
    }

    #[test]
    fn skip_beyond_frame_count_yields_nothing() {
        let plan = ExtractionPlan::compute(100, 10);
        assert_eq!(plan.positions(50, 60).count(), 0);
    }

    #[test]
    fn tiny_videos_yield_nothing() {
        let plan = ExtractionPlan::compute(100, 10);
        assert_eq!(plan.positions(0, 0).count(), 0);
        assert_eq!(plan.positions(1, 0).count(), 0);
    }

    #[test]
    fn zero_eligible_total_yields_no_positions() {
        let plan = ExtractionPlan::compute(0, 10);
        assert_eq!(plan.sample_every(), 0.0);
        assert_eq!(plan.positions(100, 0).count(), 0);
    }

    #[test]
    fn zero_target_degrades_to_empty_sequences() {
        // Precondition violation: the interval becomes infinite and every
        // sequence is empty instead of panicking.
        let plan = ExtractionPlan::compute(100, 0);
        assert_eq!(plan.positions(100, 0).count(), 0);
    }

    #[test]
    fn sub_unit_intervals_may_repeat_truncated_positions() {
        // Requesting more frames than exist: interval 0.4, positions repeat
        // after truncation. The extractor's budget cap bounds the output and
        // the later write deterministically wins for a repeated name.
        let plan = ExtractionPlan::compute(4, 10);
        let positions: Vec<u64> = plan.positions(4, 0).take(6).collect();
        assert_eq!(positions, vec![0, 0, 1, 1, 1, 2]);
    }
}
