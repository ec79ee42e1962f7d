//! Shim-lock protocol capability.
//!
//! The shim loader registers a protocol exposing its PE/COFF machinery so
//! helper applications can hash executables exactly the way the loader
//! itself will when it verifies them.

use crate::status::Status;

/// Parsed PE/COFF image context produced by [`ShimLock::context`].
///
/// Opaque to the caller; it is only ever handed back to [`ShimLock::hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeCoffContext {
    pub image_size: usize,
}

/// The digests of an authenticode-hashed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDigests {
    pub sha256: [u8; 32],
    pub sha1: [u8; 20],
}

/// The shim-lock capability.
pub trait ShimLock {
    /// Parses `image` as PE/COFF and builds the hashing context.
    fn context(&mut self, image: &[u8]) -> Result<PeCoffContext, Status>;

    /// Hashes `image` using a context previously built from it.
    fn hash(&mut self, image: &[u8], context: &PeCoffContext) -> Result<ImageDigests, Status>;
}
