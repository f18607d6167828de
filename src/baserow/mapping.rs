//! Record Mapper: lossy two-directional translation between the
//! `Item`/`Interest` domain model and the fixed-width Baserow row.
//!
//! Decoding is total: malformed values degrade to defaults instead of
//! failing, so a bad cell can never take down a whole list fetch.
//! Encoding happens in two stages: pure field assembly here (testable
//! without a network), then name-to-id resolution plus image uploads in
//! the client.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::baserow::columns::{
    image_col, taker_name_col, taker_time_col, COL_CONDITION, COL_DESCRIPTION, COL_PRICE,
    COL_STATUS, COL_TITLE, SLOT_COUNT,
};
use crate::baserow::fields::FieldResolver;
use crate::baserow::files::proxied_image_url;
use crate::baserow::BaserowError;
use crate::domain::item::now_millis;
use crate::domain::{Condition, ImageRef, Interest, InterestKind, Item, ItemStatus};

const TAKER_SUFFIX: &str = ", Taker";
const INTERESTED_SUFFIX: &str = ", Interested";
const QUESTION_SEPARATOR: &str = " - ";

/// A cell counts as absent when missing, null, or the empty string.
fn cell<'a>(cells: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match cells.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Baserow single-select cells arrive either as a plain string or as a
/// `{id, value, color}` wrapper. The ambiguity stops here.
fn select_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn string_cell(cells: &Map<String, Value>, name: &str) -> String {
    cell(cells, name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Numeric cells sometimes arrive as JSON strings; accept both.
fn price_cell(cells: &Map<String, Value>, name: &str) -> f64 {
    match cell(cells, name) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse the slot label convention: `"Name, Taker"`, `"Name, Interested"`
/// or `"Name, Interested - <question>"`. A label with no suffix decodes
/// as a taker, which is how rows written before the convention existed
/// are still read.
pub fn parse_taker_label(label: &str) -> (String, InterestKind, Option<String>) {
    if label.contains(TAKER_SUFFIX) {
        let name = label.replace(TAKER_SUFFIX, "");
        return (name.trim().to_string(), InterestKind::Take, None);
    }

    if label.contains(INTERESTED_SUFFIX) {
        if let Some((head, question)) = label.split_once(QUESTION_SEPARATOR) {
            let name = head.replace(INTERESTED_SUFFIX, "");
            return (
                name.trim().to_string(),
                InterestKind::Interest,
                Some(question.trim().to_string()),
            );
        }
        let name = label.replace(INTERESTED_SUFFIX, "");
        return (name.trim().to_string(), InterestKind::Interest, None);
    }

    (label.trim().to_string(), InterestKind::Take, None)
}

/// Inverse of `parse_taker_label`. A question is only embedded for
/// INTEREST entries.
pub fn format_taker_label(interest: &Interest) -> String {
    let label = match interest.kind {
        InterestKind::Take => "Taker",
        InterestKind::Interest => "Interested",
    };
    match (&interest.kind, interest.question.as_deref()) {
        (InterestKind::Interest, Some(question)) if !question.is_empty() => {
            format!("{}, {label}{QUESTION_SEPARATOR}{question}", interest.name)
        }
        _ => format!("{}, {label}", interest.name),
    }
}

/// Parse a taker time cell (`YYYY-MM-DD`, with RFC 3339 accepted for
/// older rows) into epoch milliseconds.
fn parse_slot_time(raw: &str) -> Option<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).timestamp_millis());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Taker times are persisted as dates only, truncating the time of day.
fn slot_time_label(timestamp_millis: i64) -> String {
    let time = match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(t) => t,
        None => Utc::now(),
    };
    time.format("%Y-%m-%d").to_string()
}

/// Decode a row (cells already keyed by column *names*) into an `Item`.
///
/// The remote schema has no creation-time column, so `created_at` is
/// restamped "now" on every decode; fetched items always sort as newest.
pub fn row_to_item(row_id: u64, cells: &Map<String, Value>, proxy_base: &str) -> Item {
    let status = cell(cells, COL_STATUS)
        .and_then(select_label)
        .map(|label| ItemStatus::from_remote(&label))
        .unwrap_or_default();

    let condition = cell(cells, COL_CONDITION)
        .and_then(select_label)
        .map(|label| Condition::from_remote(&label))
        .unwrap_or(Condition::GoodAsNew);

    let mut images = Vec::new();
    for i in 1..=SLOT_COUNT {
        match cell(cells, &image_col(i)) {
            Some(Value::Array(files)) => {
                for file in files {
                    let url = match file {
                        Value::String(s) => Some(s.as_str()),
                        Value::Object(obj) => obj.get("url").and_then(Value::as_str),
                        _ => None,
                    };
                    if let Some(url) = url {
                        images.push(ImageRef::Url(proxied_image_url(url, proxy_base)));
                    }
                }
            }
            Some(Value::String(url)) => {
                images.push(ImageRef::Url(proxied_image_url(url, proxy_base)));
            }
            _ => {}
        }
    }

    let mut interested_parties = Vec::new();
    for i in 1..=SLOT_COUNT {
        let label = string_cell(cells, &taker_name_col(i));
        if label.is_empty() {
            // an unnamed slot is empty, not an anonymous interest
            continue;
        }
        let (name, kind, question) = parse_taker_label(&label);
        if name.is_empty() {
            continue;
        }
        let timestamp = cell(cells, &taker_time_col(i))
            .and_then(Value::as_str)
            .and_then(parse_slot_time)
            .unwrap_or_else(now_millis);
        interested_parties.push(Interest {
            name,
            timestamp,
            kind,
            question,
        });
    }

    Item {
        id: row_id.to_string(),
        title: string_cell(cells, COL_TITLE),
        description: string_cell(cells, COL_DESCRIPTION),
        price: price_cell(cells, COL_PRICE),
        condition,
        status,
        images,
        interested_parties,
        created_at: now_millis(),
    }
}

/// Scalar and enum fields of the encode direction, keyed by column name.
pub fn scalar_fields(item: &Item) -> Vec<(String, Value)> {
    vec![
        (COL_TITLE.to_string(), json!(item.title)),
        (COL_DESCRIPTION.to_string(), json!(item.description)),
        (COL_PRICE.to_string(), json!(item.price)),
        (COL_CONDITION.to_string(), json!(item.condition.remote_label())),
        (COL_STATUS.to_string(), json!(item.status.remote_label())),
    ]
}

/// Taker slots in list order. Slots beyond the party list are explicitly
/// nulled (name and time) so removed parties disappear remotely; parties
/// beyond slot 4 are silently dropped.
pub fn taker_slot_fields(parties: &[Interest]) -> Vec<(String, Value)> {
    let mut fields = Vec::with_capacity(SLOT_COUNT * 2);
    for i in 1..=SLOT_COUNT {
        match parties.get(i - 1) {
            Some(party) => {
                fields.push((taker_name_col(i), json!(format_taker_label(party))));
                fields.push((taker_time_col(i), json!(slot_time_label(party.timestamp))));
            }
            None => {
                fields.push((taker_name_col(i), Value::Null));
                fields.push((taker_time_col(i), Value::Null));
            }
        }
    }
    fields
}

/// Image slots in list order, at most `SLOT_COUNT`; extra images are
/// dropped. `resolve` turns a reference into a store-native file object
/// (uploading when needed); a failed resolution is logged and its slot
/// left unwritten, so the existing remote attachment survives. An empty
/// image list writes no attachment slots at all.
pub fn image_slot_fields<F>(images: &[ImageRef], mut resolve: F) -> Vec<(String, Value)>
where
    F: FnMut(&ImageRef, usize) -> Result<Value, BaserowError>,
{
    let mut fields = Vec::new();
    for (idx, image) in images.iter().take(SLOT_COUNT).enumerate() {
        let slot = idx + 1;
        match resolve(image, slot) {
            Ok(reference) => fields.push((image_col(slot), json!([reference]))),
            Err(e) => eprintln!("❌ Error processing image {slot}: {e}"),
        }
    }
    fields
}

/// Stand-in for a row that failed to deserialize, so one bad row never
/// hides the rest of the table.
pub fn placeholder_item(id: &str) -> Item {
    Item {
        id: id.to_string(),
        title: format!("Error loading item {id}"),
        description: String::new(),
        price: 0.0,
        condition: Condition::GoodAsNew,
        status: ItemStatus::Available,
        images: Vec::new(),
        interested_parties: Vec::new(),
        created_at: now_millis(),
    }
}

/// Final encode stage: translate column names to `field_XXXXX` keys.
///
/// A name the resolver can't place is skipped with a warning, never
/// fatal. File columns only accept store-native references: a raw URL or
/// data-URL string that was never uploaded is rejected (skipped), and a
/// bare reference object is wrapped into the expected array form.
pub fn resolve_row_payload(
    fields: &[(String, Value)],
    resolver: &FieldResolver,
) -> Map<String, Value> {
    let mut payload = Map::new();

    for (name, value) in fields {
        let field_id = match resolver.field_id_for_name(name) {
            Some(id) => id,
            None => {
                eprintln!("⚠️ Field \"{name}\" not found in Baserow table, skipping");
                continue;
            }
        };

        let value = if resolver.is_file_column(name) {
            match value {
                Value::String(s) if s.starts_with("http") || s.starts_with("data:") => {
                    eprintln!("⚠️ Skipping file field \"{name}\": URLs must be uploaded first");
                    continue;
                }
                Value::Array(_) => value.clone(),
                Value::Object(_) => Value::Array(vec![value.clone()]),
                other => other.clone(),
            }
        } else {
            value.clone()
        };

        payload.insert(format!("field_{field_id}"), value);
    }

    payload
}
