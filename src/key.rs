use crate::{
    Secp256k1,
    PublicKey,
    SecretKey,
    OsRng,
    hash,
    util::{
        encode_02x,
        Network
    }
};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("secp256k1 error: {0}")]
    Secp(#[from] secp256k1::Error),
    #[error("random number generator unavailable: {0}")]
    Rng(String)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivKey(pub(crate) SecretKey);

impl PrivKey {

    /**
        Generates an random number of entropic source using OsRng and uses it to create a secret key.
    */
    pub fn new_rand() -> Result<Self, KeyError> {
        let mut rng = OsRng::new().map_err(|e| KeyError::Rng(e.to_string()))?;
        Ok(Self(SecretKey::new(&mut rng)))
    }

    /**
        Use a predefined byte array as a secret key.
    */
    pub fn from_slice(byte_array: &[u8]) -> Result<Self, KeyError> {
        Ok(Self(SecretKey::from_slice(byte_array)?))
    }

    /**
        Serializes the private key into a array of bytes.
    */
    pub fn as_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.0[..]);
        bytes
    }

    /**
        Adds a 32 byte tweak to the scalar, modulo the curve order.
        Used by child key deriveration.
    */
    pub fn tweak_add(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let mut key = self.0;
        key.add_assign(tweak)?;
        Ok(Self(key))
    }

    /**
        Export the private key a wallet-import-format (Base58Check Encoded with prefix)
        * Use the parameter to indicate if WIF should include the compression byte.
    */
    pub fn export_as_wif(&self, compressed: bool, network: Network) -> String {
        let prefix: u8 = match network {
            Network::Bitcoin => 0x80,
            Network::Testnet => 0xef
        };
        let mut payload: Vec<u8> = vec![prefix];
        payload.extend_from_slice(&self.as_bytes());
        if compressed {
            payload.push(0x01);
        }

        bs58::encode(payload).with_check().into_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubKey(pub(crate) PublicKey);

impl PubKey {

    /**
        Finds the compressed public key from a secret key.

        Is the result of static point G on the secp256k1 curve multipled k times, where k is the private key.
    */
    pub fn from_priv_key(k: &PrivKey) -> Self {
        Self(PublicKey::from_secret_key(&Secp256k1::signing_only(), &k.0))
    }

    /**
        Use a predefined byte array (compressed or uncompressed point) as a public key.
    */
    pub fn from_slice(byte_array: &[u8]) -> Result<Self, KeyError> {
        Ok(Self(PublicKey::from_slice(byte_array)?))
    }

    /**
        Returns the compressed public key as a byte array.
    */
    pub fn as_bytes(&self) -> [u8; 33] {
        self.0.serialize()
    }

    /**
        Hash160 of the compressed key. This is what P2PKH and P2WPKH outputs commit to.
    */
    pub fn hash160(&self) -> [u8; 20] {
        hash::hash160(&self.as_bytes()[..])
    }

    /**
        Adds tweak * G to the point. Used by public child key deriveration.
    */
    pub fn tweak_add(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let mut key = self.0;
        key.add_exp_assign(&Secp256k1::verification_only(), tweak)?;
        Ok(Self(key))
    }

    /**
       Return the compressed public key as a hex string.
    */
    pub fn as_hex(&self) -> String {
        encode_02x(&self.as_bytes())
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}
