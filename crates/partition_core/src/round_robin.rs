use crate::{RatingsError, RatingsResult};

/// Partition owning the row at zero-based `position` of the round-robin sequence.
///
/// The bulk pass numbers rows by its ordered scan; the single-row inserter
/// continues that sequence at the number of rows already partitioned.
pub fn round_robin_index(position: u64, count: u32) -> RatingsResult<u32> {
    if count == 0 {
        return Err(RatingsError::invalid(
            "number of partitions must be greater than 0",
        ));
    }
    let index = position % u64::from(count);
    u32::try_from(index).map_err(|_| RatingsError::invalid("partition index overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_partitions() {
        let assigned: Vec<u32> = (0..5)
            .map(|position| round_robin_index(position, 2).expect("index"))
            .collect();
        assert_eq!(assigned, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn single_partition_takes_everything() {
        for position in [0, 1, 99, u64::MAX] {
            assert_eq!(round_robin_index(position, 1).expect("index"), 0);
        }
    }

    #[test]
    fn zero_partitions_is_invalid() {
        assert!(matches!(
            round_robin_index(3, 0),
            Err(RatingsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn sizes_differ_by_at_most_one() {
        for count in 1..=7u32 {
            for rows in 0..=30u64 {
                let mut sizes = vec![0u64; count as usize];
                for position in 0..rows {
                    sizes[round_robin_index(position, count).expect("index") as usize] += 1;
                }
                let max = sizes.iter().max().copied().unwrap_or_default();
                let min = sizes.iter().min().copied().unwrap_or_default();
                assert!(max - min <= 1);
                assert_eq!(sizes.iter().sum::<u64>(), rows);
            }
        }
    }
}
