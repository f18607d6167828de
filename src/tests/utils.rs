use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::db::connection::{init_db, Database};
use crate::domain::item::now_millis;
use crate::domain::{Condition, Item, ItemDraft, ItemStatus};
use crate::store::ItemStore;

/// Initialize a fresh test DB using the production schema. Each call
/// gets its own temp file so parallel tests stay isolated.
pub fn init_test_db() -> Database {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let path = std::env::temp_dir().join(format!("giveaway_test_{suffix}.sqlite"));
    let db = Database::new(path.to_string_lossy().to_string());

    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    db
}

/// A local-mode store seeded with the given items.
pub fn test_store(items: Vec<Item>) -> ItemStore {
    ItemStore::with_items(init_test_db(), items)
}

pub fn sample_item(id: &str, title: &str) -> Item {
    Item {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        price: 5.0,
        condition: Condition::GoodAsNew,
        status: ItemStatus::Available,
        images: Vec::new(),
        interested_parties: Vec::new(),
        created_at: now_millis(),
    }
}

pub fn sample_draft(title: &str, price: f64) -> ItemDraft {
    ItemDraft {
        title: title.to_string(),
        description: String::new(),
        price,
        condition: Condition::GoodAsNew,
        status: ItemStatus::Available,
        images: Vec::new(),
    }
}
