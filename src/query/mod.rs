mod builder;
mod columns;
mod filter;
mod list_query;
mod order;
mod page;

pub use builder::ResourceQueryBuilder;
pub use columns::{ColMap, ColSet, ColSpec, ColType, ColumnMetadata, Resource};
pub use filter::{ContainsFilter, Filter, Predicate, SearchFilter};
pub use list_query::{ListQuery, SortOrder, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD};
pub use order::Order;
pub use page::{total_pages, ListResult};
