use serde::{Deserialize, Serialize};

use crate::{RatingsError, RatingsResult};

pub const FIELD_DELIMITER: &str = "::";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub user_id: i32,
    pub item_id: i32,
    pub rating: f64,
}

impl RatingRow {
    pub fn new(user_id: i32, item_id: i32, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
        }
    }
}

/// Parses one `user::item::rating` line.
///
/// Blank lines and lines with fewer than three fields yield `Ok(None)`. Extra
/// trailing fields (such as a timestamp) are ignored.
pub fn parse_rating_line(line: &str) -> RatingsResult<Option<RatingRow>> {
    let fields: Vec<&str> = line.trim().split(FIELD_DELIMITER).collect();
    if fields.len() < 3 {
        return Ok(None);
    }
    let user_id = fields[0]
        .trim()
        .parse::<i32>()
        .map_err(|err| RatingsError::invalid(format!("invalid user id '{}': {err}", fields[0])))?;
    let item_id = fields[1]
        .trim()
        .parse::<i32>()
        .map_err(|err| RatingsError::invalid(format!("invalid item id '{}': {err}", fields[1])))?;
    let rating = fields[2]
        .trim()
        .parse::<f64>()
        .map_err(|err| RatingsError::invalid(format!("invalid rating '{}': {err}", fields[2])))?;
    if !rating.is_finite() {
        return Err(RatingsError::invalid(format!(
            "rating '{}' is not finite",
            fields[2]
        )));
    }
    Ok(Some(RatingRow::new(user_id, item_id, rating)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let row = parse_rating_line("1::122::5").expect("parse").expect("row");
        assert_eq!(row, RatingRow::new(1, 122, 5.0));
    }

    #[test]
    fn ignores_trailing_timestamp() {
        let row = parse_rating_line("7::42::3.5::838985046\n")
            .expect("parse")
            .expect("row");
        assert_eq!(row, RatingRow::new(7, 42, 3.5));
    }

    #[test]
    fn short_lines_are_skipped() {
        assert!(parse_rating_line("").expect("parse").is_none());
        assert!(parse_rating_line("1::2").expect("parse").is_none());
        assert!(parse_rating_line("1,2,3").expect("parse").is_none());
    }

    #[test]
    fn unparseable_fields_are_rejected() {
        let err = parse_rating_line("a::2::3").expect_err("bad user");
        assert!(matches!(err, RatingsError::InvalidArgument { .. }));
        assert!(parse_rating_line("1::2::high").is_err());
        assert!(parse_rating_line("1::2::NaN").is_err());
    }
}
