// src/domain/item.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a published item. Any status can follow any other;
/// transition policy belongs to the callers, not the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "AVAILABLE")]
    Available,
    #[serde(rename = "RESERVED")]
    Reserved,
    #[serde(rename = "TAKEN")]
    Taken,
}

impl ItemStatus {
    /// Translate the remote single-select label. Unrecognized labels fall
    /// back to Available rather than failing the decode.
    pub fn from_remote(label: &str) -> Self {
        match label {
            "Available" => ItemStatus::Available,
            "Reserved" => ItemStatus::Reserved,
            "Taken" => ItemStatus::Taken,
            _ => ItemStatus::Available,
        }
    }

    /// The label the remote single-select column expects.
    pub fn remote_label(&self) -> &'static str {
        match self {
            ItemStatus::Available => "Available",
            ItemStatus::Reserved => "Reserved",
            ItemStatus::Taken => "Taken",
        }
    }
}

/// Physical condition of an item.
///
/// The remote table stores "Well loved" (lowercase l) while the app has
/// always displayed "Well Loved"; the translation happens here so nothing
/// else has to know about the quirk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Like New")]
    LikeNew,
    #[serde(rename = "Good as new")]
    GoodAsNew,
    #[serde(rename = "Fair")]
    Fair,
    #[serde(rename = "Well Loved")]
    WellLoved,
}

impl Condition {
    /// Unrecognized labels fall back to "Good as new".
    pub fn from_remote(label: &str) -> Self {
        match label {
            "Like New" => Condition::LikeNew,
            "Good as new" => Condition::GoodAsNew,
            "Fair" => Condition::Fair,
            "Well loved" | "Well Loved" => Condition::WellLoved,
            _ => Condition::GoodAsNew,
        }
    }

    pub fn remote_label(&self) -> &'static str {
        match self {
            Condition::LikeNew => "Like New",
            Condition::GoodAsNew => "Good as new",
            Condition::Fair => "Fair",
            Condition::WellLoved => "Well loved",
        }
    }
}

/// TAKE means "claiming it", INTEREST means "asking a question".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestKind {
    #[default]
    #[serde(rename = "TAKE")]
    Take,
    #[serde(rename = "INTEREST")]
    Interest,
}

/// One person's expressed interest in an item, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub name: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: InterestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// An image attached to an item: either a URL string (remote attachment,
/// proxied S3 link, or a pending data: payload from the camera) or an
/// already-uploaded Baserow file reference object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Uploaded(Value),
}

/// The domain entity. The remote table is the source of truth; in-memory
/// copies are caches overwritten after each successful round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub condition: Condition,
    pub status: ItemStatus,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(rename = "interestedParties", default)]
    pub interested_parties: Vec<Interest>,
    /// Epoch milliseconds. The remote table has no creation column, so
    /// every fetch restamps this with "now"; only locally created items
    /// carry a meaningful value.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// Fields a caller supplies when creating or editing an item. The id,
/// parties and creation time are owned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    pub condition: Condition,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// Current time in epoch milliseconds, the unit used everywhere in the app.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
