//! Identity, revision, and HEAD records.
//!
//! These records are owned by the ingestion collaborator. The resolver reads
//! them through [`IdentityStore`] and never mutates them.

pub mod arena;
pub mod store;
pub mod types;

pub use arena::RevisionArena;
#[cfg(test)]
pub use store::MockIdentityStore;
pub use store::{IdentityStore, MemoryIdentityStore};
pub use types::{
    normalize_extension, Capability, ContentHash, FileId, FileUid, Head, Identity, Revision,
    RevisionBuilder, RevisionId, SeqId, ValidationError,
};
