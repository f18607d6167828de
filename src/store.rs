//! In-memory item collection with optimistic remote synchronization.
//!
//! Every mutation is applied to local state eagerly, then pushed to the
//! remote table. On success the authoritative decoded row replaces the
//! optimistic copy; on failure the optimistic copy is retained and the
//! error surfaced in the outcome. Two in-flight mutations on the same
//! item therefore resolve last-response-wins, which is acceptable for a
//! single-admin deployment.

use std::sync::Mutex;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use crate::baserow::BaserowClient;
use crate::db::{snapshot, Database};
use crate::domain::item::now_millis;
use crate::domain::{Interest, InterestKind, Item, ItemDraft, ItemStatus};
use crate::errors::ServerError;

/// Result of one mutation: the item as the caller should now see it,
/// whether the remote store confirmed it, and the error if it did not.
#[derive(Debug, Serialize)]
pub struct SaveOutcome {
    pub item: Item,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the startup load produced. `degraded` means the collection came
/// from the local snapshot (or is empty) instead of the remote table.
#[derive(Debug)]
pub struct LoadReport {
    pub count: usize,
    pub degraded: bool,
    pub error: Option<String>,
}

pub struct ItemStore {
    items: Mutex<Vec<Item>>,
    remote: Option<BaserowClient>,
    db: Database,
}

/// Temporary id for items the remote store has not confirmed yet.
fn local_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn validate_draft(draft: &ItemDraft) -> Result<(), ServerError> {
    if draft.title.trim().is_empty() {
        return Err(ServerError::BadRequest("title must not be empty".into()));
    }
    if draft.price < 0.0 {
        return Err(ServerError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

impl ItemStore {
    pub fn new(db: Database, remote: Option<BaserowClient>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            remote,
            db,
        }
    }

    /// Build a store with a known collection, skipping the remote load.
    #[cfg(test)]
    pub fn with_items(db: Database, items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            remote: None,
            db,
        }
    }

    fn with_items_locked<T>(&self, f: impl FnOnce(&mut Vec<Item>) -> T) -> Result<T, ServerError> {
        let mut items = self.items.lock().map_err(|_| ServerError::InternalError)?;
        Ok(f(&mut items))
    }

    /// Write the current collection to the local snapshot. Snapshot
    /// trouble is logged, never surfaced; the in-memory list stays
    /// usable either way.
    fn persist(&self) {
        let items = match self.with_items_locked(|items| items.clone()) {
            Ok(items) => items,
            Err(_) => return,
        };
        if let Err(e) = snapshot::save_snapshot(&self.db, &items) {
            eprintln!("⚠️ Snapshot write failed: {e}");
        }
    }

    /// Startup load: remote first, local snapshot when the remote is
    /// unreachable or unconfigured, empty collection as the last resort.
    pub fn load(&self) -> LoadReport {
        let Some(client) = &self.remote else {
            let items = self.snapshot_or_empty();
            let count = items.len();
            let _ = self.with_items_locked(|slot| *slot = items);
            println!("📦 Local mode: loaded {count} items from snapshot");
            return LoadReport {
                count,
                degraded: true,
                error: None,
            };
        };

        match client.get_all_items() {
            Ok(items) => {
                let count = items.len();
                let _ = self.with_items_locked(|slot| *slot = items);
                self.persist();
                println!("✅ Loaded {count} items");
                LoadReport {
                    count,
                    degraded: false,
                    error: None,
                }
            }
            Err(e) => {
                eprintln!("❌ Failed to load items from Baserow: {e}");
                let items = self.snapshot_or_empty();
                let count = items.len();
                let _ = self.with_items_locked(|slot| *slot = items);
                println!("📦 Using {count} items from local snapshot");
                LoadReport {
                    count,
                    degraded: true,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn snapshot_or_empty(&self) -> Vec<Item> {
        match snapshot::load_snapshot(&self.db) {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                eprintln!("⚠️ Snapshot read failed: {e}");
                Vec::new()
            }
        }
    }

    pub fn list(&self) -> Result<Vec<Item>, ServerError> {
        self.with_items_locked(|items| items.clone())
    }

    fn get(&self, id: &str) -> Result<Item, ServerError> {
        self.with_items_locked(|items| items.iter().find(|i| i.id == id).cloned())?
            .ok_or(ServerError::NotFound)
    }

    fn replace(&self, id: &str, item: Item) -> Result<(), ServerError> {
        self.with_items_locked(|items| {
            if let Some(slot) = items.iter_mut().find(|i| i.id == id) {
                *slot = item;
            }
        })
    }

    /// Create a new item: optimistic insert at the front under a local
    /// id, then reconcile with the remote-assigned row.
    pub fn create(&self, draft: ItemDraft) -> Result<SaveOutcome, ServerError> {
        validate_draft(&draft)?;

        let item = Item {
            id: local_id(),
            title: draft.title,
            description: draft.description,
            price: draft.price,
            condition: draft.condition,
            status: draft.status,
            images: draft.images,
            interested_parties: Vec::new(),
            created_at: now_millis(),
        };
        let temp_id = item.id.clone();
        self.with_items_locked(|items| items.insert(0, item.clone()))?;

        let outcome = match &self.remote {
            Some(client) => match client.create_item(&item) {
                Ok(saved) => {
                    self.replace(&temp_id, saved.clone())?;
                    SaveOutcome {
                        item: saved,
                        synced: true,
                        error: None,
                    }
                }
                Err(e) => {
                    eprintln!("❌ Failed to create item in Baserow: {e}");
                    SaveOutcome {
                        item,
                        synced: false,
                        error: Some(e.to_string()),
                    }
                }
            },
            None => SaveOutcome {
                item,
                synced: false,
                error: None,
            },
        };

        self.persist();
        Ok(outcome)
    }

    /// Shared mutation engine: apply the updated item optimistically,
    /// then reconcile against the remote response. The optimistic copy
    /// stays in place when the round trip fails.
    fn apply_update(&self, updated: Item) -> Result<SaveOutcome, ServerError> {
        let id = updated.id.clone();
        self.replace(&id, updated.clone())?;

        let outcome = match &self.remote {
            Some(client) => match client.update_item(&updated) {
                Ok(saved) => {
                    self.replace(&id, saved.clone())?;
                    SaveOutcome {
                        item: saved,
                        synced: true,
                        error: None,
                    }
                }
                Err(e) => {
                    eprintln!("❌ Failed to update item {id} in Baserow: {e}");
                    SaveOutcome {
                        item: updated,
                        synced: false,
                        error: Some(e.to_string()),
                    }
                }
            },
            None => SaveOutcome {
                item: updated,
                synced: false,
                error: None,
            },
        };

        self.persist();
        Ok(outcome)
    }

    /// Edit scalar fields and images; parties and creation time are kept.
    pub fn edit(&self, id: &str, draft: ItemDraft) -> Result<SaveOutcome, ServerError> {
        validate_draft(&draft)?;
        let mut updated = self.get(id)?;
        updated.title = draft.title;
        updated.description = draft.description;
        updated.price = draft.price;
        updated.condition = draft.condition;
        updated.status = draft.status;
        updated.images = draft.images;
        self.apply_update(updated)
    }

    /// Set the status, optionally recording who the admin marked it for.
    /// The synthetic party is a taker when the item went to TAKEN and an
    /// interest entry otherwise.
    pub fn update_status(
        &self,
        id: &str,
        status: ItemStatus,
        marked_for: Option<String>,
    ) -> Result<SaveOutcome, ServerError> {
        let mut updated = self.get(id)?;
        updated.status = status;
        if let Some(name) = marked_for.filter(|n| !n.trim().is_empty()) {
            updated.interested_parties.push(Interest {
                name: format!("{name} (Marked by Admin)"),
                timestamp: now_millis(),
                kind: if status == ItemStatus::Taken {
                    InterestKind::Take
                } else {
                    InterestKind::Interest
                },
                question: None,
            });
        }
        self.apply_update(updated)
    }

    /// A friend claims the item or asks a question; either way the item
    /// is auto-reserved.
    pub fn express_interest(
        &self,
        id: &str,
        name: String,
        kind: InterestKind,
        question: Option<String>,
    ) -> Result<SaveOutcome, ServerError> {
        if name.trim().is_empty() {
            return Err(ServerError::BadRequest("name must not be empty".into()));
        }

        let mut updated = self.get(id)?;
        updated.status = ItemStatus::Reserved;
        updated.interested_parties.push(Interest {
            name,
            timestamp: now_millis(),
            kind,
            question: question.filter(|q| !q.trim().is_empty()),
        });
        self.apply_update(updated)
    }

    /// Remove one interested party by position in the list.
    pub fn remove_taker(&self, id: &str, index: usize) -> Result<SaveOutcome, ServerError> {
        let mut updated = self.get(id)?;
        if index >= updated.interested_parties.len() {
            return Err(ServerError::BadRequest(format!(
                "no interested party at index {index}"
            )));
        }
        updated.interested_parties.remove(index);
        self.apply_update(updated)
    }

    /// Delete locally first; a failed remote delete keeps the item
    /// removed from the local view but reports the error.
    pub fn delete(&self, id: &str) -> Result<SaveOutcome, ServerError> {
        let removed = self.with_items_locked(|items| {
            let pos = items.iter().position(|i| i.id == id)?;
            Some(items.remove(pos))
        })?;
        let item = removed.ok_or(ServerError::NotFound)?;

        let outcome = match &self.remote {
            Some(client) => match client.delete_item(id) {
                Ok(()) => SaveOutcome {
                    item,
                    synced: true,
                    error: None,
                },
                Err(e) => {
                    eprintln!("❌ Failed to delete item {id} from Baserow: {e}");
                    SaveOutcome {
                        item,
                        synced: false,
                        error: Some(e.to_string()),
                    }
                }
            },
            None => SaveOutcome {
                item,
                synced: false,
                error: None,
            },
        };

        self.persist();
        Ok(outcome)
    }
}
