// src/baserow/client.rs

use std::time::Duration;

use rand::Rng;
use reqwest::blocking::multipart;
use reqwest::blocking::Client;
use serde_json::{Map, Value};

use crate::baserow::fields::FieldResolver;
use crate::baserow::files::{image_source, parse_data_url, ImageSource};
use crate::baserow::mapping::{
    image_slot_fields, placeholder_item, resolve_row_payload, row_to_item, scalar_fields,
    taker_slot_fields,
};
use crate::baserow::models::{Row, RowPage, TableField};
use crate::baserow::BaserowError;
use crate::domain::{ImageRef, Item};

const ROWS_API_URL: &str = "https://api.baserow.io/api/database/rows/table";
const FIELDS_API_URL: &str = "https://api.baserow.io/api/database/fields/table";
const UPLOAD_API_URL: &str = "https://api.baserow.io/api/user-files/upload-file/";

/// Rows fetched per list call; the table is tiny, one page covers it.
const PAGE_SIZE: u32 = 200;

const MAX_ATTEMPTS: u64 = 3;
const MAX_BACKOFF_SECS: u64 = 6;
const JITTER_MAX_SECS: u64 = 2;

/// Capped backoff with jitter between list attempts. `None` after the
/// final attempt, which must fail immediately instead of sleeping first.
fn backoff_delay(attempt: u64) -> Option<Duration> {
    if attempt >= MAX_ATTEMPTS {
        return None;
    }
    let base = std::cmp::min(2 * attempt, MAX_BACKOFF_SECS);
    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
    Some(Duration::from_secs(base + jitter))
}

/// Best-effort id of a raw row value, for log lines and placeholders.
fn row_id_label(value: &Value) -> String {
    match value.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "unknown".to_string(),
    }
}

/// Token-authenticated client for one Baserow table, carrying the
/// process-wide field resolver.
pub struct BaserowClient {
    http: Client,
    token: String,
    table_id: String,
    proxy_base: String,
    resolver: FieldResolver,
}

impl BaserowClient {
    pub fn new(token: String, table_id: String, proxy_base: String) -> Result<Self, BaserowError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BaserowError::Network(e.to_string()))?;

        Ok(Self {
            http,
            token,
            table_id,
            proxy_base,
            resolver: FieldResolver::new(),
        })
    }

    /// Build from `BASEROW_TOKEN` / `BASEROW_TABLE_ID`. Returns `None`
    /// when either is unset: the store then runs in local snapshot-only
    /// mode instead of failing to start.
    pub fn from_env() -> Result<Option<Self>, BaserowError> {
        let token = std::env::var("BASEROW_TOKEN").ok();
        let table_id = std::env::var("BASEROW_TABLE_ID").ok();
        let (token, table_id) = match (token, table_id) {
            (Some(t), Some(id)) if !t.is_empty() && !id.is_empty() => (t, id),
            _ => {
                eprintln!("⚠️ BASEROW_TOKEN / BASEROW_TABLE_ID not set, running in local mode");
                return Ok(None);
            }
        };
        let proxy_base =
            std::env::var("IMAGE_PROXY_URL").unwrap_or_else(|_| "/proxy-image".to_string());
        Self::new(token, table_id, proxy_base).map(Some)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    fn row_url(&self, suffix: &str) -> String {
        format!("{ROWS_API_URL}/{}{suffix}", self.table_id)
    }

    /// Read the body of a non-2xx response into an API error.
    fn check_status(
        resp: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, BaserowError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
        Err(BaserowError::Api(status.as_u16(), body))
    }

    fn fetch_table_fields(&self) -> Result<Vec<TableField>, BaserowError> {
        let url = format!("{FIELDS_API_URL}/{}/", self.table_id);
        let resp = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .map_err(|e| BaserowError::SchemaFetch(e.to_string()))?;

        let resp = Self::check_status(resp)
            .map_err(|e| BaserowError::SchemaFetch(e.to_string()))?;
        resp.json()
            .map_err(|e| BaserowError::SchemaFetch(format!("bad field list: {e}")))
    }

    /// Memoize the table schema; every encode/decode depends on this
    /// having succeeded first.
    fn ensure_fields(&self) -> Result<(), BaserowError> {
        self.resolver.ensure_loaded(|| self.fetch_table_fields())
    }

    /// List rows, retrying transient failures with capped backoff and a
    /// little jitter.
    fn list_rows(&self) -> Result<Vec<Value>, BaserowError> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_list_rows() {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    eprintln!("⚠️ List rows attempt {attempt} failed: {e}");
                    last_err = Some(e);

                    if let Some(delay) = backoff_delay(attempt) {
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| BaserowError::Network("list rows retry loop failed".into())))
    }

    fn try_list_rows(&self) -> Result<Vec<Value>, BaserowError> {
        let resp = self
            .http
            .get(self.row_url(&format!("/?size={PAGE_SIZE}")))
            .header("Authorization", self.auth_header())
            .send()
            .map_err(|e| BaserowError::Network(e.to_string()))?;

        let page: RowPage = Self::check_status(resp)?
            .json()
            .map_err(|e| BaserowError::JsonParse(e.to_string()))?;
        Ok(page.results)
    }

    /// Translate a row's `field_XXXXX` keys to column names. Unknown ids
    /// keep their wire key, with a warning.
    fn named_cells(&self, row: &Row) -> Map<String, Value> {
        let mut named = Map::new();
        for (key, value) in &row.cells {
            let converted = key
                .strip_prefix("field_")
                .and_then(|raw| raw.parse::<u64>().ok())
                .and_then(|id| self.resolver.field_name_for_id(id));
            match converted {
                Some(name) => {
                    named.insert(name, value.clone());
                }
                None => {
                    if key.starts_with("field_") {
                        eprintln!("⚠️ Field key {key} not in schema cache, keeping as-is");
                    }
                    named.insert(key.clone(), value.clone());
                }
            }
        }
        named
    }

    fn decode_row(&self, row: &Row) -> Item {
        let cells = self.named_cells(row);
        row_to_item(row.id, &cells, &self.proxy_base)
    }

    /// Decode one raw row from a page. A row that does not deserialize
    /// becomes a visible placeholder item instead of failing the fetch.
    fn decode_row_value(&self, value: &Value) -> Item {
        match serde_json::from_value::<Row>(value.clone()) {
            Ok(row) => self.decode_row(&row),
            Err(e) => {
                let id = row_id_label(value);
                eprintln!("⚠️ Malformed row {id}: {e}");
                placeholder_item(&id)
            }
        }
    }

    /// Fetch every item from the table.
    pub fn get_all_items(&self) -> Result<Vec<Item>, BaserowError> {
        println!("📥 Fetching items from Baserow...");
        let rows = self.list_rows()?;
        println!("✅ Fetched {} rows from Baserow", rows.len());

        self.ensure_fields()?;

        let items = rows.iter().map(|value| self.decode_row_value(value)).collect();
        Ok(items)
    }

    pub fn create_item(&self, item: &Item) -> Result<Item, BaserowError> {
        let payload = self.encode_item_payload(item)?;
        let resp = self
            .http
            .post(self.row_url("/"))
            .header("Authorization", self.auth_header())
            .json(&payload)
            .send()
            .map_err(|e| BaserowError::Network(e.to_string()))?;

        let row: Row = Self::check_status(resp)?
            .json()
            .map_err(|e| BaserowError::JsonParse(e.to_string()))?;
        Ok(self.decode_row(&row))
    }

    pub fn update_item(&self, item: &Item) -> Result<Item, BaserowError> {
        let payload = self.encode_item_payload(item)?;
        let resp = self
            .http
            .patch(self.row_url(&format!("/{}/", item.id)))
            .header("Authorization", self.auth_header())
            .json(&payload)
            .send()
            .map_err(|e| BaserowError::Network(e.to_string()))?;

        let row: Row = Self::check_status(resp)?
            .json()
            .map_err(|e| BaserowError::JsonParse(e.to_string()))?;
        Ok(self.decode_row(&row))
    }

    pub fn delete_item(&self, id: &str) -> Result<(), BaserowError> {
        let resp = self
            .http
            .delete(self.row_url(&format!("/{id}/")))
            .header("Authorization", self.auth_header())
            .send()
            .map_err(|e| BaserowError::Network(e.to_string()))?;
        Self::check_status(resp)?;
        Ok(())
    }

    /// Upload raw bytes to Baserow user files, returning the reference
    /// object file columns accept.
    fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: String,
        mime: &mime::Mime,
    ) -> Result<Value, BaserowError> {
        println!("📤 Uploading file: {filename} ({:.2} KB)", bytes.len() as f64 / 1024.0);

        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime.as_ref())
            .map_err(|e| BaserowError::Upload(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(UPLOAD_API_URL)
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .map_err(|e| BaserowError::Upload(e.to_string()))?;

        let resp = Self::check_status(resp).map_err(|e| BaserowError::Upload(e.to_string()))?;
        resp.json()
            .map_err(|e| BaserowError::Upload(format!("bad upload response: {e}")))
    }

    /// Turn one image reference into a store-native file reference,
    /// uploading as needed. Uploaded references pass through. URLs are
    /// unwrapped from our own proxy links first, then either decoded
    /// (data URLs) or refetched server-side and re-uploaded, since file
    /// columns reject bare URLs.
    fn resolve_image_ref(&self, image: &ImageRef, slot: usize) -> Result<Value, BaserowError> {
        let url = match image {
            ImageRef::Uploaded(reference) => return Ok(reference.clone()),
            ImageRef::Url(url) => url,
        };

        match image_source(url, &self.proxy_base) {
            ImageSource::DataUrl(data_url) => {
                let decoded = parse_data_url(&data_url)?;
                self.upload_file(decoded.bytes, format!("image_{slot}.jpg"), &decoded.mime)
            }
            ImageSource::Fetch(target) => {
                let resp = self
                    .http
                    .get(&target)
                    .send()
                    .map_err(|e| BaserowError::Upload(format!("fetch {target}: {e}")))?;
                let resp = Self::check_status(resp).map_err(|e| BaserowError::Upload(e.to_string()))?;
                let mime = resp
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<mime::Mime>().ok())
                    .unwrap_or(mime::IMAGE_JPEG);
                let bytes = resp
                    .bytes()
                    .map_err(|e| BaserowError::Upload(e.to_string()))?
                    .to_vec();
                self.upload_file(bytes, format!("image_{slot}.jpg"), &mime)
            }
            ImageSource::Unsupported(other) => Err(BaserowError::Upload(format!(
                "unsupported image reference: {other}"
            ))),
        }
    }

    /// Encode an item into a `field_XXXXX` payload: scalars and taker
    /// slots assembled purely, image slots resolved through upload. One
    /// failed image is logged and omitted, never fatal; untouched image
    /// slots keep their existing remote attachments.
    fn encode_item_payload(&self, item: &Item) -> Result<Map<String, Value>, BaserowError> {
        self.ensure_fields()?;

        let mut fields = scalar_fields(item);
        fields.extend(taker_slot_fields(&item.interested_parties));
        fields.extend(image_slot_fields(&item.images, |image, slot| {
            self.resolve_image_ref(image, slot)
        }));

        Ok(resolve_row_payload(&fields, &self.resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_client() -> BaserowClient {
        BaserowClient::new("token".into(), "1".into(), "/proxy-image".into())
            .expect("client build failed")
    }

    #[test]
    fn malformed_row_becomes_a_placeholder_item() {
        let client = offline_client();

        let item = client.decode_row_value(&json!({"id": "not-a-number", "Name": "Lamp"}));
        assert_eq!(item.id, "not-a-number");
        assert_eq!(item.title, "Error loading item not-a-number");

        let item = client.decode_row_value(&json!({"Name": "Lamp"}));
        assert_eq!(item.id, "unknown");
    }

    #[test]
    fn well_formed_row_decodes_normally() {
        let client = offline_client();
        let item = client.decode_row_value(&json!({"id": 7, "Name": "Lamp", "price": 3}));
        assert_eq!(item.id, "7");
        assert_eq!(item.title, "Lamp");
        assert_eq!(item.price, 3.0);
    }

    #[test]
    fn backoff_stops_before_the_last_attempt() {
        for _ in 0..20 {
            let first = backoff_delay(1).expect("first attempt must back off");
            assert!((2..=4).contains(&first.as_secs()));
            let second = backoff_delay(2).expect("second attempt must back off");
            assert!((4..=6).contains(&second.as_secs()));
        }
        assert!(backoff_delay(MAX_ATTEMPTS).is_none());
    }
}
