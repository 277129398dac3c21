use rusqlite::ToSql;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::{error::QueryError, record::Record};

use super::columns::ColSet;

/// Defines the behavior of a filter.
pub trait Filter: Debug {
    /// return predicate text and params
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>);

    /// evaluate the filter against an in-memory record
    fn matches(&self, record: &Record) -> bool;
}

/// Case-sensitive "contains" match of a pattern against one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    field: &'static str,
    col_db: &'static str,
    pattern: String,
}

impl ContainsFilter {
    pub fn new(col_set: &ColSet, field: &str, pattern: &str) -> Result<Self, QueryError> {
        let (field, col_spec) = col_set
            .get(field)
            .ok_or_else(|| QueryError::InvalidField(field.to_owned()))?;

        Ok(ContainsFilter {
            field,
            col_db: col_spec.name_db,
            pattern: pattern.to_owned(),
        })
    }
}

impl Filter for ContainsFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        // instr() is case-sensitive and treats the pattern literally, unlike LIKE
        let pred_str = format!("(instr({}, ?) > 0)", self.col_db);
        let pred_vec: Vec<Box<dyn ToSql>> = vec![Box::new(self.pattern.clone())];
        (pred_str, pred_vec)
    }

    fn matches(&self, record: &Record) -> bool {
        record
            .get(self.field)
            .is_some_and(|value| value.contains(&self.pattern))
    }
}

/// Free-text search: one term matched case-sensitively against every
/// searchable column, any of which may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    columns: Vec<(&'static str, &'static str)>,
    term: String,
}

impl SearchFilter {
    pub fn new(col_set: &ColSet, term: &str) -> Result<Self, QueryError> {
        let columns: Vec<_> = col_set
            .searchable_fields()
            .map(|(field, col_spec)| (field, col_spec.name_db))
            .collect();

        if columns.is_empty() {
            return Err(QueryError::InvalidField(format!(
                "search ({} has no searchable columns)",
                col_set.table()
            )));
        }

        Ok(SearchFilter {
            columns,
            term: term.to_owned(),
        })
    }
}

impl Filter for SearchFilter {
    fn to_predicate_parts(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut pred_str = "(".to_string();
        let mut pred_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut first = true;

        for (_, col_db) in &self.columns {
            match first {
                true => first = false,
                false => pred_str.push_str(" OR "),
            }
            pred_str.push_str(&format!("instr({col_db}, ?) > 0"));
            pred_vec.push(Box::new(self.term.clone()));
        }
        pred_str.push(')');

        (pred_str, pred_vec)
    }

    fn matches(&self, record: &Record) -> bool {
        self.columns.iter().any(|(field, _)| {
            record
                .get(field)
                .is_some_and(|value| value.contains(&self.term))
        })
    }
}

/// Field-level match conditions and an optional free-text search, all
/// combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    filters: Vec<ContainsFilter>,
    search: Option<SearchFilter>,
}

impl Predicate {
    /// Matches every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Validates each filter field against the column set. Filters are kept in
    /// field-name order so the same mapping always yields the same predicate.
    pub fn from_filters(
        col_set: &ColSet,
        filters: &BTreeMap<String, String>,
    ) -> Result<Self, QueryError> {
        let filters = filters
            .iter()
            .map(|(field, pattern)| ContainsFilter::new(col_set, field, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Predicate {
            filters,
            search: None,
        })
    }

    /// Adds a free-text search across the searchable columns. An empty term
    /// adds no condition.
    pub fn with_search(mut self, col_set: &ColSet, term: &str) -> Result<Self, QueryError> {
        self.search = match term {
            "" => None,
            term => Some(SearchFilter::new(col_set, term)?),
        };
        Ok(self)
    }

    fn conditions(&self) -> impl Iterator<Item = &dyn Filter> + '_ {
        self.filters
            .iter()
            .map(|filter| filter as &dyn Filter)
            .chain(self.search.iter().map(|search| search as &dyn Filter))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions().next().is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions().all(|filter| filter.matches(record))
    }

    /// Builds the WHERE clause (empty when there are no filters) and its params
    pub fn to_where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        let mut where_clause = String::new();

        if !self.is_empty() {
            let mut first = true;
            where_clause.push_str("\nWHERE ");
            for filter in self.conditions() {
                if !first {
                    where_clause.push_str(" AND ");
                }
                first = false;

                let (pred_str, pred_vec) = filter.to_predicate_parts();
                where_clause.push_str(&pred_str);
                params_vec.extend(pred_vec);
            }
        }

        (where_clause, params_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::columns::Resource;
    use crate::record::Value;

    fn filters(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unknown_field_rejected() {
        let col_set = Resource::Products.col_set();
        let result = Predicate::from_filters(&col_set, &filters(&[("name", "a"), ("colour", "red")]));
        assert_eq!(result, Err(QueryError::InvalidField("colour".into())));
    }

    #[test]
    fn test_db_column_name_is_not_a_field() {
        let col_set = Resource::Products.col_set();
        let result = ContainsFilter::new(&col_set, "product_id", "1");
        assert!(matches!(result, Err(QueryError::InvalidField(_))));
    }

    #[test]
    fn test_empty_predicate_has_no_where_clause() {
        let predicate = Predicate::all();
        assert!(predicate.is_empty());

        let (where_clause, params) = predicate.to_where_clause();
        assert!(where_clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_search_term_adds_nothing() {
        let col_set = Resource::Products.col_set();
        let predicate = Predicate::all().with_search(&col_set, "").unwrap();
        assert!(predicate.is_empty());
        assert_eq!(predicate, Predicate::all());
    }

    #[test]
    fn test_search_is_or_across_columns_and_with_filters() {
        let col_set = Resource::Products.col_set();
        let predicate = Predicate::from_filters(&col_set, &filters(&[("category", "Tools")]))
            .unwrap()
            .with_search(&col_set, "lamp")
            .unwrap();
        assert!(!predicate.is_empty());

        let (where_clause, params) = predicate.to_where_clause();
        assert_eq!(
            where_clause,
            "\nWHERE (instr(category, ?) > 0) AND (instr(name, ?) > 0 OR instr(description, ?) > 0)"
        );
        assert_eq!(params.len(), 3);

        let in_name = Record::new()
            .with("name", "desk lamp")
            .with("description", Value::Null)
            .with("category", "Tools");
        let in_description = Record::new()
            .with("name", "fixture")
            .with("description", "lamp shade")
            .with("category", "Tools");
        let wrong_category = Record::new()
            .with("name", "desk lamp")
            .with("category", "Garden");
        let wrong_case = Record::new()
            .with("name", "Lamp")
            .with("category", "Tools");

        assert!(predicate.matches(&in_name));
        assert!(predicate.matches(&in_description));
        assert!(!predicate.matches(&wrong_category));
        assert!(!predicate.matches(&wrong_case));
    }

    #[test]
    fn test_where_clause_uses_db_names_and_params() {
        let col_set = Resource::Products.col_set();
        let predicate =
            Predicate::from_filters(&col_set, &filters(&[("name", "te'st"), ("id", "4")])).unwrap();

        let (where_clause, params) = predicate.to_where_clause();
        assert_eq!(
            where_clause,
            "\nWHERE (instr(product_id, ?) > 0) AND (instr(name, ?) > 0)"
        );
        assert_eq!(params.len(), 2);
        assert!(!where_clause.contains("te'st"));
    }

    #[test]
    fn test_filter_insertion_order_is_irrelevant() {
        let col_set = Resource::Users.col_set();
        let mut forward = BTreeMap::new();
        forward.insert("role".to_string(), "admin".to_string());
        forward.insert("email".to_string(), "@example".to_string());
        let mut backward = BTreeMap::new();
        backward.insert("email".to_string(), "@example".to_string());
        backward.insert("role".to_string(), "admin".to_string());

        let a = Predicate::from_filters(&col_set, &forward).unwrap();
        let b = Predicate::from_filters(&col_set, &backward).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_where_clause().0, b.to_where_clause().0);
    }

    #[test]
    fn test_matches_is_and_combined() {
        let col_set = Resource::Users.col_set();
        let predicate = Predicate::from_filters(
            &col_set,
            &filters(&[("name", "ann"), ("role", "admin")]),
        )
        .unwrap();

        let both = Record::new().with("name", "joann").with("role", "admin");
        let one = Record::new().with("name", "joann").with("role", "viewer");
        let wrong_case = Record::new().with("name", "Ann").with("role", "admin");

        assert!(predicate.matches(&both));
        assert!(!predicate.matches(&one));
        assert!(!predicate.matches(&wrong_case));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let col_set = Resource::Users.col_set();
        let predicate = Predicate::from_filters(&col_set, &filters(&[("email", "")])).unwrap();
        assert!(!predicate.matches(&Record::new().with("name", "x")));
        assert!(predicate.matches(&Record::new().with("email", "")));
    }
}
