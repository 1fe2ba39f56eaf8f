//! Durable key-value persistence, cookie semantics.

/// Key under which the active camera selection is persisted.
pub const SELECTED_CAMERA_KEY: &str = "selectedCamera";

/// Expiry of the persisted camera selection, in days.
pub const SELECTION_EXPIRY_DAYS: u32 = 30;

/// Cookie-backed key-value storage with expiry.
///
/// `get` returns `None` for missing or expired entries. Reads and writes are
/// synchronous, matching the cookie jar this abstracts over.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, days: u32);
}
