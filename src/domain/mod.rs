pub mod item;

pub use item::{Condition, ImageRef, Interest, InterestKind, Item, ItemDraft, ItemStatus};
