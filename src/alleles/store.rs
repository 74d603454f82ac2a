// store.rs - Persistent allele-hash store: checksum/locus -> known allele ID.
//
// Query-time tokens that are textual checksums (rather than plain numeric
// allele calls) must be resolved against the alleles a database build has
// already seen, so that two isolates independently carrying the same novel
// allele collide on the same bit instead of two different novel bits. Keys
// are truncated to a 20-hex SHA-1 prefix (80 bits) -- ample at the allele
// counts a cgMLST scheme sees, and a quarter the storage of the full digest.

use std::path::Path;

use rusqlite::Connection;
use sha1::{Digest, Sha1};

use crate::error::Result;
use crate::resolver::AlleleResolver;

const CHECKSUM_PREFIX_LEN: usize = 20;

/// SHA-1 hash the (already-lowercased) nucleotide payload and return its
/// 20-hex-character prefix.
pub fn checksum_of(sequence: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(sequence);
    let digest = hasher.finalize();
    let hex = hex_encode(&digest);
    hex[..CHECKSUM_PREFIX_LEN].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{b:02x}").expect("writing to a String never fails");
    }
    s
}

/// Persistent `(checksum, locus_index) -> allele_id` store backed by a
/// single-table sqlite database. Ingestion is bulk (`put` many times inside
/// one transaction, then `finalize`); lookups happen only after `finalize`.
pub struct AlleleHashStore {
    conn: Connection,
    finalized: bool,
}

impl AlleleHashStore {
    /// Open or create the store at `path`, creating the `alleles` table if
    /// it does not already exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS alleles (
                checksum TEXT NOT NULL,
                position INTEGER NOT NULL,
                code INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn, finalized: false })
    }

    /// Open an existing store strictly for lookups, skipping table creation.
    pub fn open_readonly(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        Ok(Self { conn, finalized: true })
    }

    /// Bulk-insert one `(checksum, locus_index, allele_id)` triple. Callers
    /// are expected to call this many times before `finalize`; no index
    /// exists yet so inserts stay fast.
    pub fn put(&self, checksum: &str, locus_index: usize, allele_id: u32) -> Result<()> {
        debug_assert!(!self.finalized, "put() called after finalize()");
        self.conn.execute(
            "INSERT INTO alleles (checksum, position, code) VALUES (?1, ?2, ?3)",
            rusqlite::params![&checksum[..CHECKSUM_PREFIX_LEN.min(checksum.len())], locus_index as i64, allele_id],
        )?;
        Ok(())
    }

    /// Build the secondary index on `(checksum, position)` and switch the
    /// store to read-only use. Idempotent.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_alleles_checksum_position ON alleles (checksum, position)",
            [],
        )?;
        self.finalized = true;
        Ok(())
    }

    /// Look up the allele ID known for `checksum` at `locus_index`, if any.
    pub fn get(&self, checksum: &str, locus_index: usize) -> Result<Option<u32>> {
        let prefix = &checksum[..CHECKSUM_PREFIX_LEN.min(checksum.len())];
        let mut stmt = self
            .conn
            .prepare_cached("SELECT code FROM alleles WHERE checksum = ?1 AND position = ?2")?;
        let mut rows = stmt.query(rusqlite::params![prefix, locus_index as i64])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// Adapts a finalized [`AlleleHashStore`] to the [`AlleleResolver`] seam the
/// profile codec expects.
pub struct StoreResolver {
    store: AlleleHashStore,
}

impl StoreResolver {
    pub fn new(store: AlleleHashStore) -> Self {
        Self { store }
    }
}

impl AlleleResolver for StoreResolver {
    fn lookup(&self, checksum: &str, locus_index: usize) -> Option<u32> {
        // Lookup failures here collapse to `None` (novel bit) rather than
        // propagating a `HcLinkError` -- a store I/O error at query time is
        // operationally indistinguishable from "not found" for this trait's
        // read-only contract.
        self.store.get(checksum, locus_index).ok().flatten()
    }
}
