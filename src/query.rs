//! Query values, parsing and decomposition.

pub mod boolean;
pub mod decompose;
pub mod page;
pub mod parser;
pub mod search_query;
pub mod sort;
pub mod template;
pub mod term;

pub use self::boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur, QueryNode};
pub use self::decompose::{BooleanFilterMap, FilterValue, QueryDecomposer, decompose_node};
pub use self::page::PageRequest;
pub use self::parser::{QueryParser, QueryParserBuilder};
pub use self::search_query::{
    DIRECT_STORE_BACKEND, FULLTEXT_BACKEND, Query, QueryBuilder, RESERVED_PREFIX,
    is_reserved_key,
};
pub use self::sort::{SortOrder, SortSpec};
pub use self::template::QueryTemplate;
pub use self::term::{TermQuery, escape_term};
