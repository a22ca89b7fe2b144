/*
    This module implements hierarchical deterministic keys
    under the BIP 32 standard and their 78 byte serialization.

    Not for use with the bitcoin main network.
*/

pub mod extended_keys;
pub mod ckd;
pub mod path;
pub mod serializer;

pub use extended_keys::{
    HierarchicalKey,
    HdKey
};
pub use ckd::HARDENED;
pub use path::{
    ChildOptions,
    Path
};
pub use serializer::{
    ExtendedKeySerializer,
    Base58ExtendedKeySerializer,
    EXTENDED_KEY_LEN
};

#[derive(Debug, thiserror::Error)]
pub enum HDWError {
    #[error("malformed extended key record: {0}")]
    MalformedInput(String),
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("bad base58 checksum")]
    BadChecksum,
    #[error("invalid key material: {0}")]
    BadKey(#[from] crate::key::KeyError),
    #[error("bad deriveration path: {0}")]
    BadPath(String),
    #[error("child index {0} is too large")]
    IndexTooLarge(u32),
    #[error("seed must be 16 to 64 bytes, got {0}")]
    InvalidSeedLength(usize),
    #[error("cannot derive child: {0}")]
    Derivation(String)
}
