use chrono::{Duration, Utc};
use log::info;

use crate::database::Database;
use crate::error::ResqError;
use crate::query::Resource;
use crate::record::Record;

const PRODUCT_NAMES: [&str; 6] = [
    "test widget",
    "Test gadget",
    "gizmo",
    "attested kit",
    "sprocket",
    "flange",
];
const CATEGORIES: [&str; 3] = ["tools", "garden", "kitchen"];
const ROLES: [&str; 3] = ["admin", "editor", "viewer"];
const USER_NAMES: [&str; 5] = ["ann", "bob", "carla", "test user", "dmitri"];

/// Deterministic demo rows (apart from timestamps), newest first.
pub fn demo_records(resource: Resource, count: usize) -> Vec<Record> {
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let created_at = (now - Duration::minutes(i as i64))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            let n = i + 1;

            match resource {
                Resource::Products => Record::new()
                    .with("name", format!("{} {n}", PRODUCT_NAMES[i % PRODUCT_NAMES.len()]))
                    .with("description", format!("Demo product number {n}"))
                    .with("category", CATEGORIES[i % CATEGORIES.len()])
                    .with("price", ((i * 37) % 100) as f64 + 0.99)
                    .with("stock", ((i * 13) % 40) as i64)
                    .with("created_at", created_at),
                Resource::Users => {
                    let name = USER_NAMES[i % USER_NAMES.len()];
                    Record::new()
                        .with("name", format!("{name} {n}"))
                        .with("email", format!("{}{n}@example.com", name.replace(' ', ".")))
                        .with("role", ROLES[i % ROLES.len()])
                        .with("created_at", created_at)
                }
            }
        })
        .collect()
}

pub fn seed(db: &Database, resource: Resource, count: usize) -> Result<usize, ResqError> {
    info!("Seeding {count} {resource} records");
    db.insert_many(resource, &demo_records(resource, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    #[test]
    fn test_demo_products_shape() {
        let records = demo_records(Resource::Products, 8);
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].get("name"), Some(&Value::from("test widget 1")));
        assert_eq!(records[6].get("name"), Some(&Value::from("test widget 7")));
        assert!(
            matches!(records[1].get("price"), Some(Value::Real(p)) if (p - 37.99).abs() < 1e-9)
        );

        let first = records[0].get("created_at").unwrap().to_string();
        let last = records[7].get("created_at").unwrap().to_string();
        assert!(first > last, "rows should be generated newest first");
    }

    #[test]
    fn test_demo_users_only_use_user_columns() {
        let col_set = Resource::Users.col_set();
        for record in demo_records(Resource::Users, 4) {
            for (field, _) in record.fields() {
                assert!(col_set.get(field).is_some(), "unexpected field {field}");
            }
        }
        assert_eq!(
            demo_records(Resource::Users, 4)[3].get("email"),
            Some(&Value::from("test.user4@example.com"))
        );
    }
}
