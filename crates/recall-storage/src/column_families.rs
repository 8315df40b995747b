//! Column family definitions for RocksDB.
//!
//! - candidates: append-only candidate records keyed by insertion time

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for candidate records
pub const CF_CANDIDATES: &str = "candidates";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_CANDIDATES];

/// Candidate records are written once and scanned often.
fn candidates_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![ColumnFamilyDescriptor::new(
        CF_CANDIDATES,
        candidates_options(),
    )]
}
