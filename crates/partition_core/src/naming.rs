use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{RatingsError, RatingsResult};

pub const DEFAULT_BASE_TABLE: &str = "ratings";
pub const DEFAULT_RANGE_PREFIX: &str = "range_part";
pub const DEFAULT_ROUND_ROBIN_PREFIX: &str = "rrobin_part";
pub const DEFAULT_MIN_RATING: f64 = 0.0;
pub const DEFAULT_MAX_RATING: f64 = 5.0;
pub const MAX_PARTITIONS: u32 = 4096;

const MAX_IDENTIFIER_LEN: usize = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    Range,
    RoundRobin,
}

impl PartitionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PartitionStrategy::Range => "range",
            PartitionStrategy::RoundRobin => "round_robin",
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table names and rating domain shared by every partitioning operation.
///
/// Every identifier that reaches SQL is either one of these validated names or a
/// [`PartitionTable`] derived from a prefix and a numeric index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub base_table: String,
    pub range_prefix: String,
    pub round_robin_prefix: String,
    pub min_rating: f64,
    pub max_rating: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            base_table: DEFAULT_BASE_TABLE.to_string(),
            range_prefix: DEFAULT_RANGE_PREFIX.to_string(),
            round_robin_prefix: DEFAULT_ROUND_ROBIN_PREFIX.to_string(),
            min_rating: DEFAULT_MIN_RATING,
            max_rating: DEFAULT_MAX_RATING,
        }
    }
}

impl PartitionConfig {
    pub fn validate(&self) -> RatingsResult<()> {
        validate_identifier("base table", &self.base_table)?;
        validate_identifier("range prefix", &self.range_prefix)?;
        validate_identifier("round-robin prefix", &self.round_robin_prefix)?;
        if self.range_prefix.starts_with(&self.round_robin_prefix)
            || self.round_robin_prefix.starts_with(&self.range_prefix)
        {
            return Err(RatingsError::invalid(format!(
                "prefixes '{}' and '{}' overlap; neither may start with the other",
                self.range_prefix, self.round_robin_prefix
            )));
        }
        for strategy in [PartitionStrategy::Range, PartitionStrategy::RoundRobin] {
            if self.parse_partition_index(strategy, &self.base_table).is_some() {
                return Err(RatingsError::invalid(format!(
                    "base table '{}' collides with {strategy} partition names",
                    self.base_table
                )));
            }
        }
        if !self.min_rating.is_finite() || !self.max_rating.is_finite() {
            return Err(RatingsError::invalid("rating domain bounds must be finite"));
        }
        if self.min_rating >= self.max_rating {
            return Err(RatingsError::invalid(format!(
                "rating domain is empty: min {} >= max {}",
                self.min_rating, self.max_rating
            )));
        }
        Ok(())
    }

    pub fn prefix(&self, strategy: PartitionStrategy) -> &str {
        match strategy {
            PartitionStrategy::Range => &self.range_prefix,
            PartitionStrategy::RoundRobin => &self.round_robin_prefix,
        }
    }

    pub fn partition_table(&self, strategy: PartitionStrategy, index: u32) -> PartitionTable {
        PartitionTable {
            name: format!("{}{index}", self.prefix(strategy)),
            strategy,
            index,
        }
    }

    /// Returns the index when `name` is exactly the strategy prefix followed by a
    /// canonical decimal index.
    pub fn parse_partition_index(&self, strategy: PartitionStrategy, name: &str) -> Option<u32> {
        let suffix = name.strip_prefix(self.prefix(strategy))?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if suffix.len() > 1 && suffix.starts_with('0') {
            return None;
        }
        suffix.parse().ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitionTable {
    name: String,
    strategy: PartitionStrategy,
    index: u32,
}

impl PartitionTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for PartitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn validate_partition_count(count: u32) -> RatingsResult<()> {
    if count == 0 {
        return Err(RatingsError::invalid(
            "number of partitions must be greater than 0",
        ));
    }
    if count > MAX_PARTITIONS {
        return Err(RatingsError::invalid(format!(
            "number of partitions {count} exceeds {MAX_PARTITIONS}"
        )));
    }
    Ok(())
}

fn validate_identifier(label: &str, value: &str) -> RatingsResult<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(RatingsError::invalid(format!("{label} must not be empty")));
    };
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(RatingsError::invalid(format!(
            "{label} '{value}' exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    let valid_first = first.is_ascii_lowercase() || first == '_';
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_first || !valid_rest {
        return Err(RatingsError::invalid(format!(
            "{label} '{value}' must match [a-z_][a-z0-9_]*"
        )));
    }
    Ok(())
}
