/*
    Library to serialize hierarchical deterministic keys and to
    produce the unlocking data (script sig and witness) for Bitcoin
    transaction inputs.

    Not for use with the bitcoin main network.

    References:
        - BIP-32 (https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki)
            extended key layout and child key deriveration

        - BIP-143 (https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki)
            signature hashing for segwit v0 inputs

        - The Rust-Bitcoin repository (https://github.com/rust-bitcoin/rust-bitcoin)
            for providing clear reference code to work against.
*/

//Outward facing modules
pub mod key;
pub mod ecdsa;
pub mod encoding;
pub mod hdwallet;
pub mod script;
pub mod transaction;
pub mod signer;
pub mod prelude;

//Modules for internal use
mod hash;
pub mod util;

//Dependencies
use rand::rngs::OsRng; //Same rand 0.6 that secp256k1 is built against
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use hmac::{Mac, NewMac, Hmac};
use sha2::{Sha256, Sha512, Digest};
use ripemd160::Ripemd160;
