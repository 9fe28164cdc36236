//! Storage-safe record ids.
//!
//! Protocol ids embed JIDs and device suffixes (`123@s.whatsapp.net:2`,
//! base64 key ids containing `/`).  `/` becomes `__` and `:` becomes `-`.
//! The transform is only injective because the protocol layer never emits
//! two ids that differ solely by `:` versus `-` or `/` versus `__`.

/// Map a logical record id to the id stored in the table.
pub fn normalize_id(id: &str) -> String {
    id.replace('/', "__").replace(':', "-")
}
