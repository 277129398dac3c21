use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::QueryError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(
    AsRefStr, EnumString, Display, Debug, Default, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum SortOrder {
    #[strum(serialize = "ASC")]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[default]
    #[strum(serialize = "DESC")]
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

/// A listing request: which page, how large, sorted how, filtered by what.
/// `search` is a free-text term matched against every searchable column.
///
/// `page` and `page_size` accept any integer so callers can pass raw input
/// through; [`ListQuery::normalized`] coerces non-positive values to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub page: i64,
    #[serde(alias = "page_size")]
    pub page_size: i64,
    #[serde(alias = "sort_field")]
    pub sort_field: String,
    #[serde(alias = "sort_order")]
    pub sort_order: SortOrder,
    pub filters: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT_FIELD.to_owned(),
            sort_order: SortOrder::default(),
            filters: BTreeMap::new(),
            search: None,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_field = field.to_owned();
        self.sort_order = order;
        self
    }

    pub fn filter(mut self, field: &str, pattern: &str) -> Self {
        self.filters.insert(field.to_owned(), pattern.to_owned());
        self
    }

    pub fn search(mut self, term: &str) -> Self {
        self.search = Some(term.to_owned());
        self
    }

    /// Returns a copy with page and page size coerced to at least 1
    pub fn normalized(&self) -> Self {
        ListQuery {
            page: self.page.max(1),
            page_size: self.page_size.max(1),
            ..self.clone()
        }
    }

    /// Row offset of the first item on the requested page, (page - 1) * page_size.
    /// Expects a normalized query.
    pub fn offset(&self) -> Result<u64, QueryError> {
        if self.page < 1 || self.page_size < 1 {
            return Err(QueryError::InvalidPagination(format!(
                "page {} and page size {} must both be at least 1",
                self.page, self.page_size
            )));
        }

        let offset = (self.page - 1).checked_mul(self.page_size).ok_or_else(|| {
            QueryError::InvalidPagination(format!(
                "page {} with page size {} is out of range",
                self.page, self.page_size
            ))
        })?;

        // Non-negative after the check above
        Ok(offset as u64)
    }
}
