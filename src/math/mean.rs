use std::iter::Sum;

/// Sum and count of rating values.
///
/// Folding and merging are associative and commutative, so partitions
/// can be reduced in any order. The sum is kept in `f64`.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct RatingSum {
    pub sum: f64,
    pub count: u64,
}

impl RatingSum {
    #[inline]
    pub fn push(&mut self, value: f32) {
        self.sum += f64::from(value);
        self.count += 1;
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    /// Plain mean, `None` when nothing was pushed.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count != 0).then(|| self.sum / self.count as f64)
    }

    /// Running weighted mean: combines a mean over `prior_count` earlier
    /// examples with this batch, as if the mean were recomputed over all of them.
    #[must_use]
    pub fn mean_after(&self, prior_mean: f64, prior_count: u64) -> Option<(f64, u64)> {
        let count = prior_count + self.count;
        (count != 0).then(|| ((prior_mean * prior_count as f64 + self.sum) / count as f64, count))
    }
}

impl Sum<f32> for RatingSum {
    fn sum<I: Iterator<Item = f32>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut sum, value| {
            sum.push(value);
            sum
        })
    }
}
