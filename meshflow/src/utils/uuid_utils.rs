//! UUID generation.

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Returns the simple (hyphen-free) form of a UUID.
#[must_use]
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()
}
