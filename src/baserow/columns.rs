//! Logical column names of the Baserow table.
//!
//! The table emulates variable-length collections with fixed numbered
//! slot columns: `image_1..4` (file columns) and `taker_1..4_name` /
//! `taker_1..4_time`. Update these if the table columns are renamed.

pub const COL_TITLE: &str = "Name";
pub const COL_DESCRIPTION: &str = "description";
pub const COL_PRICE: &str = "price";
pub const COL_CONDITION: &str = "condition";
pub const COL_STATUS: &str = "status";

/// Fixed number of image and taker slots in the row schema.
pub const SLOT_COUNT: usize = 4;

/// 1-based image slot column name.
pub fn image_col(i: usize) -> String {
    format!("image_{i}")
}

/// 1-based taker name slot column name.
pub fn taker_name_col(i: usize) -> String {
    format!("taker_{i}_name")
}

/// 1-based taker time slot column name.
pub fn taker_time_col(i: usize) -> String {
    format!("taker_{i}_time")
}
