//! Result items, result sets and bounded counting.

pub mod counting;
pub mod property_value;
pub mod result_set;
pub mod search_result;

pub use self::counting::BoundedCountingIterator;
pub use self::property_value::{PropertyValue, compare_sort_keys};
pub use self::result_set::{ResultSet, ResultSetSizeOverride, Results, VecResultSet};
pub use self::search_result::{ItemOutcome, SearchResult, SkippedItem};
