/*
    This module implements extended keys that are
    used in BIP32 hierarchal deterministic wallets.

    An extended key is a private or public key together with
    a 32 byte chaincode and the metadata that places it in the tree
    (depth, parent fingerprint and sequence number).
*/

use crate::{
    key::{
        PrivKey,
        PubKey
    },
    hdwallet::{
        ckd,
        HDWError,
        Path,
        HARDENED
    }
};

/**
    The key part of an extended key.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdKey {
    Private(PrivKey),
    Public(PubKey)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchicalKey {
    key: HdKey,
    chaincode: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: u32,
    pub sequence: u32
}

impl HierarchicalKey {
    /**
        Constructs the Extended Key.
    */
    pub fn construct(depth: u8, parent_fingerprint: u32, sequence: u32, chaincode: [u8; 32], key: HdKey) -> Self {
        Self {
            key,
            chaincode,
            depth,
            parent_fingerprint,
            sequence
        }
    }

    /**
        Master key from a BIP32 seed
    */
    pub fn from_seed(seed: &[u8]) -> Result<Self, HDWError> {
        ckd::master_from_seed(seed)
    }

    pub fn key(&self) -> &HdKey {
        &self.key
    }

    pub fn is_private(&self) -> bool {
        match self.key {
            HdKey::Private(_) => true,
            HdKey::Public(_) => false
        }
    }

    pub fn is_hardened(&self) -> bool {
        self.sequence & HARDENED != 0
    }

    pub fn chaincode(&self) -> [u8; 32] {
        self.chaincode
    }

    /**
        Return the private key part of self, if there is one
    */
    pub fn private_key(&self) -> Option<PrivKey> {
        match self.key {
            HdKey::Private(k) => Some(k),
            HdKey::Public(_) => None
        }
    }

    /**
        Return the non extended public key of self.
    */
    pub fn public_key(&self) -> PubKey {
        match self.key {
            HdKey::Private(k) => PubKey::from_priv_key(&k),
            HdKey::Public(k) => k
        }
    }

    /**
        First four bytes of the hash160 of the public key, read big endian.
        Children store this as their parent fingerprint.
    */
    pub fn fingerprint(&self) -> u32 {
        let hash = self.public_key().hash160();
        u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]])
    }

    /**
        Neuter a private extended key. Public keys are returned unchanged.
    */
    pub fn to_public(&self) -> Self {
        Self {
            key: HdKey::Public(self.public_key()),
            ..*self
        }
    }

    /**
        Derives the child key of self
    */
    pub fn derive_child(&self, sequence: u32) -> Result<Self, HDWError> {
        ckd::derive_child(self, sequence)
    }

    /**
        Derive the key at the given path.
        eg. m/44'/0'/0'/0
    */
    pub fn derive_path(&self, path: &Path) -> Result<Self, HDWError> {
        let mut current_key: Self = *self;
        for sequence in path.sequences()? {
            current_key = current_key.derive_child(sequence)?;
        }
        Ok(current_key)
    }
}
