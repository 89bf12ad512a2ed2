use crate::{RatingsError, RatingsResult, validate_partition_count};

/// Equal-width split of `[min, max]` into `count` intervals.
///
/// Interval 0 is `[min, upper_0]`; every later interval `i` is
/// `(upper_{i-1}, upper_i]`. The last upper bound is pinned to `max` so the
/// accumulated division error never leaves a gap at the top of the domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeLayout {
    min: f64,
    max: f64,
    count: u32,
    step: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeBounds {
    pub index: u32,
    pub lower: f64,
    pub upper: f64,
    pub lower_inclusive: bool,
}

impl RangeBounds {
    pub fn contains(&self, rating: f64) -> bool {
        let above_lower = if self.lower_inclusive {
            rating >= self.lower
        } else {
            rating > self.lower
        };
        above_lower && rating <= self.upper
    }
}

impl RangeLayout {
    pub fn new(min: f64, max: f64, count: u32) -> RatingsResult<Self> {
        validate_partition_count(count)?;
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(RatingsError::invalid(format!(
                "invalid rating domain [{min}, {max}]"
            )));
        }
        let step = (max - min) / f64::from(count);
        if step == 0.0 {
            return Err(RatingsError::invalid(format!(
                "range step is zero for {count} partitions over [{min}, {max}]"
            )));
        }
        Ok(Self {
            min,
            max,
            count,
            step,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn upper(&self, index: u32) -> f64 {
        if index + 1 >= self.count {
            self.max
        } else {
            self.min + f64::from(index + 1) * self.step
        }
    }

    pub fn lower(&self, index: u32) -> f64 {
        if index == 0 {
            self.min
        } else {
            self.upper(index - 1)
        }
    }

    pub fn bounds(&self, index: u32) -> RangeBounds {
        RangeBounds {
            index,
            lower: self.lower(index),
            upper: self.upper(index),
            lower_inclusive: index == 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = RangeBounds> + '_ {
        (0..self.count).map(|index| self.bounds(index))
    }

    /// First interval owning `rating`, scanning in index order.
    pub fn locate(&self, rating: f64) -> Option<u32> {
        self.iter()
            .find(|bounds| bounds.contains(rating))
            .map(|bounds| bounds.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(count: u32) -> RangeLayout {
        RangeLayout::new(0.0, 5.0, count).expect("layout")
    }

    #[test]
    fn zero_partitions_is_invalid() {
        let err = RangeLayout::new(0.0, 5.0, 0).expect_err("zero");
        assert!(matches!(err, RatingsError::InvalidArgument { .. }));
    }

    #[test]
    fn oversized_partition_count_is_invalid() {
        let err = RangeLayout::new(0.0, 5.0, crate::MAX_PARTITIONS + 1).expect_err("too many");
        assert!(matches!(err, RatingsError::InvalidArgument { .. }));
    }

    #[test]
    fn inverted_domain_is_invalid() {
        assert!(RangeLayout::new(5.0, 0.0, 2).is_err());
        assert!(RangeLayout::new(1.0, 1.0, 2).is_err());
        assert!(RangeLayout::new(f64::NAN, 1.0, 2).is_err());
    }

    #[test]
    fn last_upper_bound_is_exactly_max() {
        for count in 1..=50 {
            let layout = RangeLayout::new(0.0, 0.3, count).expect("layout");
            assert_eq!(layout.upper(count - 1), 0.3);
        }
    }

    #[test]
    fn adjacent_bounds_share_edges() {
        let layout = domain(7);
        for index in 1..7 {
            assert_eq!(layout.lower(index), layout.upper(index - 1));
        }
        assert_eq!(layout.lower(0), 0.0);
    }

    #[test]
    fn domain_edges_go_to_first_and_last() {
        for count in 1..=20 {
            let layout = domain(count);
            assert_eq!(layout.locate(0.0), Some(0));
            assert_eq!(layout.locate(5.0), Some(count - 1));
        }
    }

    #[test]
    fn shared_boundary_belongs_to_lower_partition() {
        let layout = domain(2);
        assert_eq!(layout.locate(2.5), Some(0));
        assert_eq!(layout.locate(2.5000001), Some(1));
        let layout = domain(5);
        assert_eq!(layout.locate(1.0), Some(0));
        assert_eq!(layout.locate(1.5), Some(1));
        assert_eq!(layout.locate(4.0), Some(3));
    }

    #[test]
    fn out_of_domain_ratings_have_no_owner() {
        let layout = domain(3);
        assert_eq!(layout.locate(-0.5), None);
        assert_eq!(layout.locate(5.5), None);
        assert_eq!(layout.locate(f64::NAN), None);
        let single = domain(1);
        assert_eq!(single.locate(5.01), None);
        assert_eq!(single.locate(3.0), Some(0));
    }

    #[test]
    fn every_in_domain_rating_has_exactly_one_owner() {
        for count in 1..=9 {
            let layout = domain(count);
            for step in 0..=100 {
                let rating = f64::from(step) / 20.0;
                let owners = layout.iter().filter(|b| b.contains(rating)).count();
                assert_eq!(owners, 1, "rating {rating} with {count} partitions");
            }
        }
    }
}
