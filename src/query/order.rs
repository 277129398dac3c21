use std::cmp::Ordering;

use crate::{error::QueryError, record::Record};

use super::{columns::ColSet, list_query::SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderSpec {
    field: &'static str,
    column: &'static str,
    direction: SortOrder,
}

/// A validated sort: one requested column plus the key column as an
/// ascending tiebreaker, so rows with equal sort values page deterministically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    order_specs: Vec<OrderSpec>,
}

impl Order {
    pub fn new(col_set: &ColSet, sort_field: &str, direction: SortOrder) -> Result<Self, QueryError> {
        let (field, col_spec) = col_set
            .get(sort_field)
            .ok_or_else(|| QueryError::InvalidField(sort_field.to_owned()))?;

        let mut order_specs = vec![OrderSpec {
            field,
            column: col_spec.name_db,
            direction,
        }];

        if !col_spec.is_key {
            if let Some((key_field, key_spec)) = col_set.get(col_set.key()) {
                order_specs.push(OrderSpec {
                    field: key_field,
                    column: key_spec.name_db,
                    direction: SortOrder::Asc,
                });
            }
        }

        Ok(Order { order_specs })
    }

    /// The requested sort field
    pub fn field(&self) -> &'static str {
        self.order_specs[0].field
    }

    pub fn direction(&self) -> SortOrder {
        self.order_specs[0].direction
    }

    pub fn to_order_clause(&self) -> String {
        let mut order_clause = "\nORDER BY ".to_string();
        let mut first = true;

        for order in &self.order_specs {
            match first {
                true => first = false,
                false => order_clause.push_str(", "),
            }

            order_clause.push_str(order.column);
            order_clause.push(' ');
            order_clause.push_str(order.direction.as_ref());
        }
        order_clause
    }

    /// Compares two records the way `to_order_clause` orders rows in SQLite
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for order in &self.order_specs {
            let cmp = match (a.get(order.field), b.get(order.field)) {
                (Some(va), Some(vb)) => va.sql_cmp(vb),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            let cmp = match order.direction {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };

            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}
