//! Signature-list codec.
//!
//! The staged request and the persistent trust set share one container
//! format: a concatenation of signature lists, each a header followed by
//! fixed-size entries.
//!
//! ```text
//! list header (28 bytes):
//!   type_guid     : 16 bytes  (CERT_X509 or CERT_SHA256)
//!   list_size     :  4 bytes  LE (whole list incl. header)
//!   header_size   :  4 bytes  LE (extra header bytes; 0 for both types)
//!   entry_size    :  4 bytes  LE (one entry incl. owner)
//! repeat:
//!   owner_guid    : 16 bytes
//!   payload       : entry_size - 16 bytes (DER, or 32 hash bytes)
//! ```
//!
//! Decoding is total: malformed regions are skipped, never an error, so a
//! partially corrupt request still yields whatever is legible. A list whose
//! declared size is zero, smaller than its header, or larger than the
//! remaining bytes terminates the walk; skipped lists advance the cursor by
//! their full declared size.

use mokman_efi::guid::{self, Guid};

/// Size of the fixed list header prefix.
pub const LIST_HEADER_LEN: usize = 28;

/// Size of the per-entry owner GUID.
pub const OWNER_LEN: usize = 16;

/// Length of a SHA-256 digest payload.
pub const SHA256_LEN: usize = 32;

/// Required entry size for hash lists: owner + digest.
pub const HASH_ENTRY_LEN: usize = OWNER_LEN + SHA256_LEN;

/// The two recognized signature-entry payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// DER-encoded X.509 certificate of arbitrary length.
    X509,
    /// 32-byte SHA-256 digest of an executable image.
    Sha256,
}

impl SignatureKind {
    /// The list type GUID for this kind.
    pub fn type_guid(self) -> Guid {
        match self {
            Self::X509 => guid::CERT_X509,
            Self::Sha256 => guid::CERT_SHA256,
        }
    }

    fn from_type_guid(g: &Guid) -> Option<Self> {
        if *g == guid::CERT_X509 {
            Some(Self::X509)
        } else if *g == guid::CERT_SHA256 {
            Some(Self::Sha256)
        } else {
            None
        }
    }
}

/// One decoded signature entry, borrowing its payload from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureEntry<'a> {
    pub kind: SignatureKind,
    pub owner: Guid,
    pub data: &'a [u8],
}

/// One raw list region, before type filtering.
#[derive(Debug, Clone, Copy)]
struct RawList<'a> {
    type_guid: Guid,
    entry_size: usize,
    /// The entries area (list body after the declared extra header).
    body: &'a [u8],
}

/// Walks the list regions of a trust set. Terminates on the first header
/// that cannot describe a list within the remaining bytes.
#[derive(Debug, Clone)]
struct ListIter<'a> {
    bytes: &'a [u8],
}

impl<'a> Iterator for ListIter<'a> {
    type Item = RawList<'a>;

    fn next(&mut self) -> Option<RawList<'a>> {
        if self.bytes.len() < LIST_HEADER_LEN {
            return None;
        }
        let mut type_bytes = [0u8; 16];
        type_bytes.copy_from_slice(&self.bytes[..16]);
        let type_guid = Guid::from_bytes(type_bytes);
        let list_size = read_u32(self.bytes, 16) as usize;
        let header_size = read_u32(self.bytes, 20) as usize;
        let entry_size = read_u32(self.bytes, 24) as usize;

        // A list that cannot fit its own header, or overruns the remaining
        // bytes, ends the walk.
        if list_size < LIST_HEADER_LEN || list_size > self.bytes.len() {
            return None;
        }

        let (list, rest) = self.bytes.split_at(list_size);
        self.bytes = rest;

        let body_start = LIST_HEADER_LEN.saturating_add(header_size);
        let body = list.get(body_start..).unwrap_or(&[]);
        Some(RawList {
            type_guid,
            entry_size,
            body,
        })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Why a list region contributes no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListVerdict {
    /// Recognized list carrying this many entries.
    Entries(usize),
    /// Type GUID is neither certificate nor SHA-256 hash.
    UnknownType,
    /// Hash-typed list whose entry size is not 48.
    BadHashEntrySize,
    /// Entry size too small to hold an owner and payload.
    BadEntrySize,
}

fn classify(list: &RawList<'_>) -> ListVerdict {
    let Some(kind) = SignatureKind::from_type_guid(&list.type_guid) else {
        return ListVerdict::UnknownType;
    };
    if kind == SignatureKind::Sha256 && list.entry_size != HASH_ENTRY_LEN {
        return ListVerdict::BadHashEntrySize;
    }
    if list.entry_size <= OWNER_LEN {
        return ListVerdict::BadEntrySize;
    }
    ListVerdict::Entries(list.body.len() / list.entry_size)
}

/// Per-list verdicts for a trust set, in walk order. Used by screens that
/// want to tell the operator why regions were ignored.
pub fn scan(bytes: &[u8]) -> impl Iterator<Item = ListVerdict> + '_ {
    ListIter { bytes }.map(|list| classify(&list))
}

/// Lazy iterator over every recognized entry of a trust set.
#[derive(Debug, Clone)]
pub struct EntryIter<'a> {
    lists: ListIter<'a>,
    kind: SignatureKind,
    entry_size: usize,
    entries: &'a [u8],
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = SignatureEntry<'a>;

    fn next(&mut self) -> Option<SignatureEntry<'a>> {
        loop {
            if self.entries.len() >= self.entry_size {
                let (entry, rest) = self.entries.split_at(self.entry_size);
                self.entries = rest;
                let mut owner = [0u8; 16];
                owner.copy_from_slice(&entry[..OWNER_LEN]);
                return Some(SignatureEntry {
                    kind: self.kind,
                    owner: Guid::from_bytes(owner),
                    data: &entry[OWNER_LEN..],
                });
            }
            // Trailing bytes shorter than one entry are dropped with the
            // rest of the malformed region.
            let list = self.lists.next()?;
            if let (ListVerdict::Entries(_), Some(kind)) = (
                classify(&list),
                SignatureKind::from_type_guid(&list.type_guid),
            ) {
                self.kind = kind;
                self.entry_size = list.entry_size;
                self.entries = list.body;
            }
        }
    }
}

/// Iterates every recognized entry of `bytes`. Total on arbitrary input.
pub fn iterate(bytes: &[u8]) -> EntryIter<'_> {
    EntryIter {
        lists: ListIter { bytes },
        kind: SignatureKind::X509,
        entry_size: usize::MAX,
        entries: &[],
    }
}

/// Number of recognized entries in `bytes`.
pub fn count(bytes: &[u8]) -> usize {
    iterate(bytes).count()
}

fn encode(kind: SignatureKind, payload: &[u8], owner: &Guid) -> Vec<u8> {
    let entry_size = (OWNER_LEN + payload.len()) as u32;
    let list_size = LIST_HEADER_LEN as u32 + entry_size;
    let mut out = Vec::with_capacity(list_size as usize);
    out.extend_from_slice(kind.type_guid().as_bytes());
    out.extend_from_slice(&list_size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&entry_size.to_le_bytes());
    out.extend_from_slice(owner.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Encodes a one-entry certificate list around `der`.
pub fn encode_cert(der: &[u8], owner: &Guid) -> Vec<u8> {
    encode(SignatureKind::X509, der, owner)
}

/// Encodes a one-entry SHA-256 hash list around `digest`.
pub fn encode_hash(digest: &[u8; SHA256_LEN], owner: &Guid) -> Vec<u8> {
    encode(SignatureKind::Sha256, digest, owner)
}
