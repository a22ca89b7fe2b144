/*
    EC adapter. The signing engine only ever reaches the curve
    through the EcAdapter trait, the default implementation
    wraps a libsecp256k1 context.
*/

use crate::{
    Secp256k1,
    key::{
        KeyError,
        PrivKey,
        PubKey
    }
};
use secp256k1::{All, Message};

/**
    An ECDSA signature over secp256k1 without a sighash byte.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(secp256k1::Signature);

impl Signature {
    /**
        Parse a strict DER encoded signature.
    */
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        Ok(Self(secp256k1::Signature::from_der(der)?))
    }

    /**
        DER encoding of the signature
    */
    pub fn to_der(&self) -> Vec<u8> {
        self.0.serialize_der().to_vec()
    }

    /**
        True if S is in the lower half of the curve order (BIP-62 rule 5)
    */
    pub fn is_low_s(&self) -> bool {
        self.normalized() == *self
    }

    /**
        Returns a copy with S normalized to the lower half
    */
    pub fn normalized(&self) -> Self {
        let mut sig = self.0;
        sig.normalize_s();
        Self(sig)
    }
}

/**
    The elliptic curve operations the signer consumes.
*/
pub trait EcAdapter {
    /**
        Sign a 32 byte digest.
    */
    fn sign(&self, hash: &[u8; 32], key: &PrivKey) -> Result<Signature, KeyError>;

    /**
        Verify a signature over a 32 byte digest. High-S signatures do not verify.
    */
    fn verify(&self, hash: &[u8; 32], signature: &Signature, key: &PubKey) -> bool;

    /**
        The public key for a private key.
    */
    fn public_key(&self, key: &PrivKey) -> PubKey;
}

pub struct Secp256k1Adapter {
    secp: Secp256k1<All>
}

impl Secp256k1Adapter {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new()
        }
    }
}

impl Default for Secp256k1Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EcAdapter for Secp256k1Adapter {
    //RFC6979 deterministic nonces, low-S output
    fn sign(&self, hash: &[u8; 32], key: &PrivKey) -> Result<Signature, KeyError> {
        let msg = Message::from_slice(&hash[..])?;
        Ok(Signature(self.secp.sign(&msg, &key.0)))
    }

    fn verify(&self, hash: &[u8; 32], signature: &Signature, key: &PubKey) -> bool {
        match Message::from_slice(&hash[..]) {
            Ok(msg) => self.secp.verify(&msg, &signature.0, &key.0).is_ok(),
            Err(_) => false
        }
    }

    fn public_key(&self, key: &PrivKey) -> PubKey {
        PubKey(secp256k1::PublicKey::from_secret_key(&self.secp, &key.0))
    }
}
