// control collection constants
pub const REVISION_COLLECTION: &str = "$lineage_revision";
pub const MARKER_KEY: &str = "$lineage_applied";
pub const FIELD_REVISION: &str = "revision";
pub const FIELD_APPLIED_AT: &str = "applied_at";

// revision constants
pub const ROOT_LABEL: &str = "<base>";
pub const RESERVED_COLLECTIONS: [&str; 1] = [REVISION_COLLECTION];

// Compile-time assertion for reserved collections count
const _: () = {
    const RESERVED_COLLECTIONS_COUNT: usize = 1;
    const ACTUAL_COUNT: usize = RESERVED_COLLECTIONS.len();
    const _: [(); 1] = [(); (ACTUAL_COUNT == RESERVED_COLLECTIONS_COUNT) as usize];
};

pub const LINEAGE_VERSION: &str = env!("CARGO_PKG_VERSION");
