//! Field Resolver: bridges stable column names used by application logic
//! and the numeric field ids the Baserow wire format requires.
//!
//! Ids are environment-specific, so the schema is fetched lazily, once,
//! and memoized for the life of the process. A schema change on the
//! remote side requires a restart to be observed.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::baserow::models::TableField;
use crate::baserow::BaserowError;

struct FieldCache {
    /// Keyed by both the exact column name and its normalized form.
    by_name: HashMap<String, TableField>,
    by_id: HashMap<u64, TableField>,
}

pub struct FieldResolver {
    cache: Mutex<Option<FieldCache>>,
}

/// Lowercased, whitespace-stripped form used for forgiving name matches
/// ("Taker 1 Name" vs "taker 1 name" drift in column titles).
fn normalize(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

impl FieldResolver {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    /// Build a resolver from an already-known schema (tests).
    #[cfg(test)]
    pub fn preloaded(fields: Vec<TableField>) -> Self {
        let resolver = Self::new();
        resolver
            .ensure_loaded(|| Ok(fields))
            .expect("preloading a resolver cannot fail");
        resolver
    }

    /// Fetch and memoize the schema. Idempotent; subsequent calls return
    /// without invoking `fetch`. After a failed call the cache stays
    /// empty and the next call retries. The lock is held across the
    /// fetch so concurrent callers never fetch twice.
    pub fn ensure_loaded<F>(&self, fetch: F) -> Result<(), BaserowError>
    where
        F: FnOnce() -> Result<Vec<TableField>, BaserowError>,
    {
        let mut slot = self
            .cache
            .lock()
            .map_err(|_| BaserowError::SchemaFetch("field cache lock poisoned".into()))?;
        if slot.is_some() {
            return Ok(());
        }

        println!("📋 Fetching field definitions from Baserow...");
        let fields = fetch()?;
        println!("✅ Loaded {} field definitions", fields.len());

        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();
        for field in fields {
            by_name.insert(normalize(&field.name), field.clone());
            by_name.insert(field.name.clone(), field.clone());
            by_id.insert(field.id, field);
        }
        *slot = Some(FieldCache { by_name, by_id });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn lookup<T>(&self, f: impl FnOnce(&FieldCache) -> Option<T>) -> Option<T> {
        let slot = self.cache.lock().ok()?;
        slot.as_ref().and_then(f)
    }

    /// Numeric id for a logical column name, matching the exact name
    /// first and the normalized form second. Absence is an expected
    /// outcome (optional columns), never an error.
    pub fn field_id_for_name(&self, name: &str) -> Option<u64> {
        self.lookup(|cache| {
            cache
                .by_name
                .get(name)
                .or_else(|| cache.by_name.get(&normalize(name)))
                .map(|field| field.id)
        })
    }

    /// Inverse lookup: the column name behind a `field_XXXXX` id.
    pub fn field_name_for_id(&self, id: u64) -> Option<String> {
        self.lookup(|cache| cache.by_id.get(&id).map(|field| field.name.clone()))
    }

    /// Whether a column stores binary attachments. File columns only
    /// accept store-native references, which changes encoding strategy.
    pub fn is_file_column(&self, name: &str) -> bool {
        self.lookup(|cache| {
            cache
                .by_name
                .get(name)
                .or_else(|| cache.by_name.get(&normalize(name)))
                .map(|field| field.field_type == "file")
        })
        .unwrap_or(false)
    }
}
