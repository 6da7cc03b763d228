//! redb table definitions shared by the local store modules.

use redb::TableDefinition;

/// File name for the redb database within the configured data directory.
pub const REDB_FILE_NAME: &str = "catalog.redb";

/// Canonical element rows (`Element`, bincode-encoded), keyed by element id.
pub const ELEMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("elements");
/// User profile rows (`UserProfile`, bincode-encoded), keyed by uid.
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
