pub mod api;
pub mod error;
pub mod naming;
pub mod range;
pub mod rating;
pub mod round_robin;

pub use api::*;
pub use error::{RatingsError, RatingsResult};
pub use naming::*;
pub use range::{RangeBounds, RangeLayout};
pub use rating::{RatingRow, parse_rating_line};
pub use round_robin::round_robin_index;
