/*
    This module implements child key deriveration
    from parent extended private and public keys
    under the BIP32 standard.

    Reference:
        https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki
*/

use crate::{
    hash::hmac_sha512,
    hdwallet::{
        HDWError,
        HdKey,
        HierarchicalKey
    },
    key::{
        PubKey,
        PrivKey
    }
};

/// Sequence numbers at or above this are hardened
pub const HARDENED: u32 = 0x8000_0000;

/**
    Derive the child at `sequence` from a parent key.
    Private parents can derive normal and hardened children,
    public parents only normal ones.
*/
pub fn derive_child(parent: &HierarchicalKey, sequence: u32) -> Result<HierarchicalKey, HDWError> {
    let depth = match parent.depth.checked_add(1) {
        Some(x) => x,
        None => return Err(HDWError::Derivation("maximum depth of 255 reached".to_string()))
    };

    let parent_pub: PubKey = parent.public_key();
    let hardened = sequence & HARDENED != 0;

    let mut data: Vec<u8> = Vec::with_capacity(37);
    match (parent.key(), hardened) {
        //Hardened child is [0x00 || parent priv bytes || index bytes]
        (HdKey::Private(k), true) => {
            data.push(0x00);
            data.extend_from_slice(&k.as_bytes());
        },
        //Normal child is [parent pub bytes || index bytes]
        (_, false) => data.extend_from_slice(&parent_pub.as_bytes()),
        (HdKey::Public(_), true) => {
            return Err(HDWError::Derivation("cannot produce hardened child public key".to_string()))
        }
    }
    data.extend_from_slice(&sequence.to_be_bytes());

    //Hash the data with the parent chaincode as the key
    let hash: [u8; 64] = match hmac_sha512(&data, &parent.chaincode()) {
        Some(x) => x,
        None => return Err(HDWError::Derivation("hmac rejected chaincode".to_string()))
    };

    //Left half tweaks the parent key, right half is the child chaincode
    let mut tweak = [0u8; 32];
    tweak.copy_from_slice(&hash[0..32]);
    let mut child_chaincode = [0u8; 32];
    child_chaincode.copy_from_slice(&hash[32..64]);

    let child_key: HdKey = match parent.key() {
        HdKey::Private(k) => HdKey::Private(k.tweak_add(&tweak)?),
        HdKey::Public(k) => HdKey::Public(k.tweak_add(&tweak)?)
    };

    Ok(HierarchicalKey::construct(
        depth,
        parent.fingerprint(),
        sequence,
        child_chaincode,
        child_key
    ))
}

/**
    Master key from a seed: HMAC-SHA512(key = "Bitcoin seed", data = seed)
*/
pub fn master_from_seed(seed: &[u8]) -> Result<HierarchicalKey, HDWError> {
    if seed.len() < 16 || seed.len() > 64 {
        return Err(HDWError::InvalidSeedLength(seed.len()))
    }

    let hash: [u8; 64] = match hmac_sha512(seed, b"Bitcoin seed") {
        Some(x) => x,
        None => return Err(HDWError::Derivation("hmac rejected key".to_string()))
    };
    let key: PrivKey = PrivKey::from_slice(&hash[0..32])?;
    let mut chaincode = [0u8; 32];
    chaincode.copy_from_slice(&hash[32..64]);

    Ok(HierarchicalKey::construct(0, 0, 0, chaincode, HdKey::Private(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SEED: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    //BIP-32 test vector 1
    #[test]
    fn test_vector_one() {
        let master = master_from_seed(&SEED).unwrap();
        assert_eq!(master.chaincode(), hex!("873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"));
        assert_eq!(master.private_key().unwrap().as_bytes(), hex!("e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"));
        assert_eq!(master.public_key().as_bytes().to_vec(), hex!("0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2").to_vec());
        assert_eq!(master.fingerprint(), 0x3442193e);

        // m/0'/1/2'/2/1000000000
        let mut key = master;
        for sequence in [HARDENED, 1, 2 | HARDENED, 2, 1000000000].iter() {
            key = derive_child(&key, *sequence).unwrap();
        }
        assert_eq!(key.depth, 5);
        assert_eq!(key.sequence, 1000000000);
        assert_eq!(key.chaincode(), hex!("c783e67b921d2beb8f6b389cc646d7263b4145701dadd2161548a8b078e65e9e"));
        assert_eq!(key.private_key().unwrap().as_bytes(), hex!("471b76e389e528d6de6d816857e012c5455051cad6660850e58372a6c3e6e7c8"));
        assert_eq!(key.public_key().as_bytes().to_vec(), hex!("022a471424da5e657499d1ff51cb43c47481a03b1e77f951fe64cec9f5a48f7011").to_vec());
    }

    #[test]
    fn public_deriveration_matches_private() {
        let master = master_from_seed(&SEED).unwrap();
        let account = derive_child(&master, HARDENED).unwrap();

        let from_private = derive_child(&account, 7).unwrap();
        let from_public = derive_child(&account.to_public(), 7).unwrap();
        assert_eq!(from_private.public_key(), from_public.public_key());
        assert_eq!(from_private.chaincode(), from_public.chaincode());
        assert_eq!(from_private.parent_fingerprint, from_public.parent_fingerprint);
    }

    #[test]
    fn public_parent_cannot_harden() {
        let master = master_from_seed(&SEED).unwrap().to_public();
        assert!(matches!(derive_child(&master, HARDENED), Err(HDWError::Derivation(_))));
    }

    #[test]
    fn seed_length_is_checked() {
        assert!(matches!(master_from_seed(&[0u8; 15]), Err(HDWError::InvalidSeedLength(15))));
        assert!(matches!(master_from_seed(&[0u8; 65]), Err(HDWError::InvalidSeedLength(65))));
    }
}
