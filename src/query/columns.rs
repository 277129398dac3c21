use phf::ordered_map::{Entries, Values};
use phf_macros::phf_ordered_map;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub type ColMap = phf::OrderedMap<&'static str, ColSpec>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColType {
    Id,
    Int,
    Real,
    String,
    Date,
}

impl ColType {
    /// Short hint shown alongside column metadata
    pub fn tip(&self) -> &'static str {
        match self {
            ColType::Id => "integer key",
            ColType::Int => "integer",
            ColType::Real => "decimal number",
            ColType::String => "text, matched case-sensitively",
            ColType::Date => "YYYY-MM-DD HH:MM:SS",
        }
    }
}

#[derive(Debug)]
pub struct ColSpec {
    pub name_db: &'static str,
    pub is_key: bool,
    pub col_type: ColType,
    /// Included in free-text search
    pub is_searchable: bool,
}

impl ColSpec {
    const fn new(name_db: &'static str, is_key: bool, col_type: ColType) -> Self {
        ColSpec {
            name_db,
            is_key,
            col_type,
            is_searchable: false,
        }
    }

    const fn searchable(name_db: &'static str) -> Self {
        ColSpec {
            name_db,
            is_key: false,
            col_type: ColType::String,
            is_searchable: true,
        }
    }
}

pub const PRODUCTS_QUERY_COLS: ColMap = phf_ordered_map! {
    "id" => ColSpec::new("product_id", true, ColType::Id),
    "name" => ColSpec::searchable("name"),
    "description" => ColSpec::searchable("description"),
    "category" => ColSpec::new("category", false, ColType::String),
    "price" => ColSpec::new("price", false, ColType::Real),
    "stock" => ColSpec::new("stock", false, ColType::Int),
    "created_at" => ColSpec::new("created_at", false, ColType::Date),
};

pub const USERS_QUERY_COLS: ColMap = phf_ordered_map! {
    "id" => ColSpec::new("user_id", true, ColType::Id),
    "name" => ColSpec::searchable("name"),
    "email" => ColSpec::searchable("email"),
    "role" => ColSpec::new("role", false, ColType::String),
    "created_at" => ColSpec::new("created_at", false, ColType::Date),
};

/// The listable resources known to the crate
#[derive(AsRefStr, EnumIter, EnumString, Display, Debug, PartialEq, Eq, Copy, Clone)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Resource {
    Products,
    Users,
}

impl Resource {
    pub fn col_set(&self) -> ColSet {
        match self {
            Resource::Products => ColSet::new("products", "id", &PRODUCTS_QUERY_COLS),
            Resource::Users => ColSet::new("users", "id", &USERS_QUERY_COLS),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ColSet {
    table: &'static str,
    key: &'static str,
    col_map: &'static ColMap,
}

impl ColSet {
    pub fn new(table: &'static str, key: &'static str, col_map: &'static ColMap) -> Self {
        ColSet {
            table,
            key,
            col_map,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Field name of the key column
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn col_map(&self) -> &'static ColMap {
        self.col_map
    }

    pub fn values(&self) -> Values<'static, &'static str, ColSpec> {
        self.col_map.values()
    }

    pub fn entries(&self) -> Entries<'static, &'static str, ColSpec> {
        self.col_map.entries()
    }

    /// Looks up a field by name, returning the canonical static name and its spec
    pub fn get(&self, field: &str) -> Option<(&'static str, &'static ColSpec)> {
        self.col_map.get_entry(field).map(|(name, spec)| (*name, spec))
    }

    /// Fields free-text search runs across, in column order
    pub fn searchable_fields(&self) -> impl Iterator<Item = (&'static str, &'static ColSpec)> {
        self.entries()
            .filter(|(_, spec)| spec.is_searchable)
            .map(|(name, spec)| (*name, spec))
    }

    pub fn col_name_to_db(&self, field: &str) -> Option<&'static str> {
        self.col_map.get(field).map(|col_spec| col_spec.name_db)
    }

    pub fn cols_as_select_list(&self) -> String {
        self.values()
            .map(|col_spec| col_spec.name_db)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn metadata(&self) -> Vec<ColumnMetadata> {
        self.entries()
            .map(|(name, spec)| ColumnMetadata {
                name: *name,
                col_type: spec.col_type,
                is_key: spec.is_key,
                is_searchable: spec.is_searchable,
                tip: spec.col_type.tip(),
            })
            .collect()
    }
}

/// Column description exposed to callers (e.g. `resq columns products`)
#[derive(Debug, Serialize)]
pub struct ColumnMetadata {
    pub name: &'static str,
    pub col_type: ColType,
    pub is_key: bool,
    pub is_searchable: bool,
    pub tip: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_resource_from_str() {
        assert_eq!("products".parse::<Resource>().unwrap(), Resource::Products);
        assert_eq!("Users".parse::<Resource>().unwrap(), Resource::Users);
        assert!("orders".parse::<Resource>().is_err());
    }

    #[test]
    fn test_every_resource_has_key_and_created_at() {
        for resource in Resource::iter() {
            let col_set = resource.col_set();
            let (_, key_spec) = col_set.get(col_set.key()).unwrap();
            assert!(key_spec.is_key, "{resource} key column should be flagged");
            assert!(
                col_set.get("created_at").is_some(),
                "{resource} should support the default sort field"
            );
        }
    }

    #[test]
    fn test_col_name_to_db() {
        let col_set = Resource::Products.col_set();
        assert_eq!(col_set.col_name_to_db("id"), Some("product_id"));
        assert_eq!(col_set.col_name_to_db("price"), Some("price"));
        assert_eq!(col_set.col_name_to_db("product_id"), None);
    }

    #[test]
    fn test_searchable_fields() {
        let products: Vec<&str> = Resource::Products
            .col_set()
            .searchable_fields()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(products, vec!["name", "description"]);

        for resource in Resource::iter() {
            assert!(
                resource.col_set().searchable_fields().all(|(_, spec)| spec.col_type == ColType::String),
                "{resource} should only search text columns"
            );
        }
    }

    #[test]
    fn test_select_list_follows_column_order() {
        assert_eq!(
            Resource::Users.col_set().cols_as_select_list(),
            "user_id, name, email, role, created_at"
        );
    }

    #[test]
    fn test_metadata_serializes() {
        let metadata = Resource::Users.col_set().metadata();
        assert_eq!(metadata.len(), 5);

        let json = serde_json::to_value(&metadata[0]).unwrap();
        assert_eq!(json["name"], "id");
        assert_eq!(json["col_type"], "Id");
        assert_eq!(json["is_key"], true);
        assert_eq!(json["is_searchable"], false);
    }
}
