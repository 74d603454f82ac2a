// resolver.rs - Allele resolution seam between the codec and its callers
//
// The reference implementation passed a plain callable into the encoder to
// turn a textual checksum into a known allele ID. We make that an explicit,
// read-only trait object instead: the build phase supplies `NullResolver`
// (no known-checksum lookups are possible at build time, so every textual
// token becomes a novel bit), and the query phase supplies a resolver backed
// by the allele-hash store.

/// Resolves a per-locus sequence checksum to the canonical allele ID known
/// at database build time, if any.
pub trait AlleleResolver: Send + Sync {
    fn lookup(&self, checksum: &str, locus_index: usize) -> Option<u32>;
}

/// Resolver that never finds a match -- used by the database writer, whose
/// input profiles are already numeric/gap tokens exclusively.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl AlleleResolver for NullResolver {
    fn lookup(&self, _checksum: &str, _locus_index: usize) -> Option<u32> {
        None
    }
}
