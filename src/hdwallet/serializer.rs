/*
    Binary serialization of extended keys.

    78 bytes, integers big endian:
        prefix(4) | depth(1) | parent fingerprint(4) | sequence(4) | chaincode(32) | key(33)

    The key field is 0x00 || private key for private keys and the
    compressed point for public keys. Which one it is comes from the
    prefix, so the serializer needs both HD version bytes of the network.
*/

use crate::{
    encoding::{
        NetworkConfig,
        Parser,
        ParserOutOfRange
    },
    hdwallet::{
        HDWError,
        HdKey,
        HierarchicalKey
    },
    key::{
        PrivKey,
        PubKey
    },
    util::{
        decode_02x,
        encode_02x
    }
};
use log::trace;

pub const EXTENDED_KEY_LEN: usize = 78;

/**
    The fields of a record as read off the wire, before the key is checked.
*/
struct RawRecord {
    prefix: [u8; 4],
    depth: u8,
    parent_fingerprint: u32,
    sequence: u32,
    chaincode: [u8; 32],
    key_data: [u8; 33]
}

fn read_record(parser: &mut Parser) -> Result<RawRecord, ParserOutOfRange> {
    Ok(RawRecord {
        prefix: parser.read_array::<4>()?,
        depth: parser.read_u8()?,
        parent_fingerprint: parser.read_u32_be()?,
        sequence: parser.read_u32_be()?,
        chaincode: parser.read_array::<32>()?,
        key_data: parser.read_array::<33>()?
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedKeySerializer {
    hd_private: [u8; 4],
    hd_public: [u8; 4]
}

impl ExtendedKeySerializer {
    /**
        Fails if the network does not have both HD version bytes.
    */
    pub fn new(network: &NetworkConfig) -> Result<Self, HDWError> {
        match (network.hd_private, network.hd_public) {
            (Some(hd_private), Some(hd_public)) => Ok(Self {
                hd_private,
                hd_public
            }),
            _ => Err(HDWError::PreconditionViolation("network not configured for HD wallets".to_string()))
        }
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig::new(Some(self.hd_private), Some(self.hd_public))
    }

    pub fn serialize(&self, key: &HierarchicalKey) -> [u8; EXTENDED_KEY_LEN] {
        let (prefix, key_data): ([u8; 4], [u8; 33]) = match key.key() {
            HdKey::Private(k) => {
                let mut data = [0u8; 33];
                data[1..].copy_from_slice(&k.as_bytes());
                (self.hd_private, data)
            },
            HdKey::Public(k) => (self.hd_public, k.as_bytes())
        };

        let mut payload: Vec<u8> = Vec::with_capacity(EXTENDED_KEY_LEN);
        payload.extend_from_slice(&prefix);
        payload.push(key.depth);
        payload.extend_from_slice(&key.parent_fingerprint.to_be_bytes());
        payload.extend_from_slice(&key.sequence.to_be_bytes());
        payload.extend_from_slice(&key.chaincode());
        payload.extend_from_slice(&key_data);

        let mut out = [0u8; EXTENDED_KEY_LEN];
        out.copy_from_slice(&payload);
        trace!("serialized extended key at depth {} (private: {})", key.depth, key.is_private());
        out
    }

    pub fn serialize_hex(&self, key: &HierarchicalKey) -> String {
        encode_02x(&self.serialize(key))
    }

    /**
        Reads one extended key from the parser. Fails with MalformedInput
        if the parser runs out before the last field. On any error the
        parser is left where it was.
    */
    pub fn from_parser(&self, parser: &mut Parser) -> Result<HierarchicalKey, HDWError> {
        let mut cursor = parser.clone();
        let key = self.read_key(&mut cursor)?;
        *parser = cursor;
        Ok(key)
    }

    fn read_key(&self, parser: &mut Parser) -> Result<HierarchicalKey, HDWError> {
        let record = match read_record(parser) {
            Ok(x) => x,
            Err(e) => return Err(HDWError::MalformedInput(format!("failed to extract extended key from parser: {}", e)))
        };

        let key: HdKey = if record.prefix == self.hd_private {
            if record.key_data[0] != 0x00 {
                return Err(HDWError::MalformedInput("private key data must start with 0x00".to_string()))
            }
            HdKey::Private(PrivKey::from_slice(&record.key_data[1..])?)
        } else if record.prefix == self.hd_public {
            HdKey::Public(PubKey::from_slice(&record.key_data)?)
        } else {
            return Err(HDWError::InvalidExtendedKey(format!("unknown version prefix {}", encode_02x(&record.prefix))))
        };

        trace!("parsed extended key at depth {}", record.depth);
        Ok(HierarchicalKey::construct(
            record.depth,
            record.parent_fingerprint,
            record.sequence,
            record.chaincode,
            key
        ))
    }

    /**
        Parse exactly 78 bytes.
    */
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<HierarchicalKey, HDWError> {
        if bytes.len() != EXTENDED_KEY_LEN {
            return Err(HDWError::InvalidExtendedKey(format!("expected {} bytes, found {}", EXTENDED_KEY_LEN, bytes.len())))
        }
        self.from_parser(&mut Parser::new(bytes))
    }

    /**
        Parse exactly 156 hex characters.
    */
    pub fn parse(&self, hex: &str) -> Result<HierarchicalKey, HDWError> {
        if hex.len() != EXTENDED_KEY_LEN * 2 {
            return Err(HDWError::InvalidExtendedKey(format!("expected {} hex characters, found {}", EXTENDED_KEY_LEN * 2, hex.len())))
        }
        let bytes = match decode_02x(hex) {
            Ok(x) => x,
            Err(e) => return Err(HDWError::MalformedInput(e.to_string()))
        };
        self.from_parser(&mut Parser::new(&bytes))
    }
}

/**
    Base58Check strings ("xprv...", "xpub...") on top of the binary record.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base58ExtendedKeySerializer {
    inner: ExtendedKeySerializer
}

impl Base58ExtendedKeySerializer {
    pub fn new(network: &NetworkConfig) -> Result<Self, HDWError> {
        Ok(Self {
            inner: ExtendedKeySerializer::new(network)?
        })
    }

    pub fn serialize(&self, key: &HierarchicalKey) -> String {
        bs58::encode(&self.inner.serialize(key)[..]).with_check().into_string()
    }

    pub fn parse(&self, encoded: &str) -> Result<HierarchicalKey, HDWError> {
        let bytes = match bs58::decode(encoded).with_check(None).into_vec() {
            Ok(x) => x,
            Err(bs58::decode::Error::InvalidChecksum { .. }) => return Err(HDWError::BadChecksum),
            Err(e) => return Err(HDWError::MalformedInput(e.to_string()))
        };
        self.inner.parse_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoding::VersionPrefix,
        hdwallet::HARDENED
    };
    use hex_literal::hex;
    use proptest::prelude::*;

    const SEED: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const MASTER_XPRV_HEX: &str = "0488ade4000000000000000000873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d50800e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35";
    const CHILD_XPUB_HEX: &str = "0488b21e013442193e8000000047fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56";

    fn serializer() -> ExtendedKeySerializer {
        ExtendedKeySerializer::new(&NetworkConfig::bitcoin()).unwrap()
    }

    #[test]
    fn serialize_test_vector() {
        let master = HierarchicalKey::from_seed(&SEED).unwrap();
        assert_eq!(serializer().serialize_hex(&master), MASTER_XPRV_HEX);

        let child = master.derive_child(HARDENED).unwrap().to_public();
        assert_eq!(serializer().serialize_hex(&child), CHILD_XPUB_HEX);
    }

    #[test]
    fn parse_test_vector() {
        let key = serializer().parse(CHILD_XPUB_HEX).unwrap();
        assert!(!key.is_private());
        assert_eq!(key.depth, 1);
        assert_eq!(key.parent_fingerprint, 0x3442193e);
        assert_eq!(key.sequence, HARDENED);
        assert_eq!(key.chaincode(), hex!("47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141"));

        let master = serializer().parse(MASTER_XPRV_HEX).unwrap();
        assert!(master.is_private());
        assert_eq!(master, HierarchicalKey::from_seed(&SEED).unwrap());
    }

    #[test]
    fn base58_strings() -> Result<(), HDWError> {
        let b58 = Base58ExtendedKeySerializer::new(&NetworkConfig::bitcoin())?;
        let master = HierarchicalKey::from_seed(&SEED)?;

        assert_eq!(b58.serialize(&master), "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi");
        assert_eq!(b58.serialize(&master.to_public()), "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8");

        let child = b58.parse("xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7")?;
        assert_eq!(child, master.derive_child(HARDENED)?);
        assert_eq!(b58.serialize(&child.to_public()), "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw");

        Ok(())
    }

    #[test]
    fn base58_errors() {
        let b58 = Base58ExtendedKeySerializer::new(&NetworkConfig::bitcoin()).unwrap();
        //Last character changed
        assert!(matches!(
            b58.parse("xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHj"),
            Err(HDWError::BadChecksum)
        ));
        assert!(matches!(b58.parse("this is definately not a extended private key"), Err(HDWError::MalformedInput(_))));

        //A testnet key does not parse with mainnet prefixes
        let tb58 = Base58ExtendedKeySerializer::new(&NetworkConfig::testnet()).unwrap();
        let tprv = tb58.serialize(&HierarchicalKey::from_seed(&SEED).unwrap());
        assert!(tprv.starts_with("tprv"));
        assert!(matches!(b58.parse(&tprv), Err(HDWError::InvalidExtendedKey(_))));
    }

    #[test]
    fn length_is_checked_before_decoding() {
        assert!(matches!(serializer().parse(&MASTER_XPRV_HEX[..154]), Err(HDWError::InvalidExtendedKey(_))));
        assert!(matches!(serializer().parse(&format!("{}00", MASTER_XPRV_HEX)), Err(HDWError::InvalidExtendedKey(_))));
        assert!(matches!(serializer().parse_bytes(&[0u8; 77]), Err(HDWError::InvalidExtendedKey(_))));
        assert!(matches!(serializer().parse(&"zz".repeat(78)), Err(HDWError::MalformedInput(_))));
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let bytes = decode_02x(MASTER_XPRV_HEX).unwrap();
        for cut in [0usize, 3, 4, 5, 12, 44, 45, 77].iter() {
            let mut parser = Parser::new(&bytes[..*cut]);
            assert!(matches!(serializer().from_parser(&mut parser), Err(HDWError::MalformedInput(_))));
            assert_eq!(parser.position(), 0);
        }

        //Extra bytes after a record are left for the caller
        let mut longer = bytes.clone();
        longer.extend_from_slice(&[0xde, 0xad]);
        let mut parser = Parser::new(&longer);
        assert!(serializer().from_parser(&mut parser).unwrap().is_private());
        assert_eq!(parser.remaining(), 2);
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let mut bytes = decode_02x(MASTER_XPRV_HEX).unwrap();
        //BIP-84 zprv
        bytes[0..4].copy_from_slice(&[0x04, 0xb2, 0x43, 0x0c]);
        assert!(matches!(serializer().parse_bytes(&bytes), Err(HDWError::InvalidExtendedKey(_))));

        //A full record that fails validation is not consumed either
        let mut parser = Parser::new(&bytes);
        assert!(serializer().from_parser(&mut parser).is_err());
        assert_eq!(parser.position(), 0);
        assert_eq!(parser.remaining(), EXTENDED_KEY_LEN);
    }

    #[test]
    fn private_key_data_needs_zero_byte() {
        let mut bytes = decode_02x(MASTER_XPRV_HEX).unwrap();
        bytes[45] = 0x01;
        assert!(matches!(serializer().parse_bytes(&bytes), Err(HDWError::MalformedInput(_))));
    }

    #[test]
    fn bad_public_point_is_rejected() {
        let mut bytes = decode_02x(CHILD_XPUB_HEX).unwrap();
        bytes[45] = 0x05;
        assert!(matches!(serializer().parse_bytes(&bytes), Err(HDWError::BadKey(_))));
    }

    #[test]
    fn network_must_have_hd_bytes() {
        let partial = NetworkConfig::new(Some(VersionPrefix::Xprv.to_bytes()), None);
        assert!(matches!(ExtendedKeySerializer::new(&partial), Err(HDWError::PreconditionViolation(_))));
        assert!(matches!(Base58ExtendedKeySerializer::new(&NetworkConfig::new(None, None)), Err(HDWError::PreconditionViolation(_))));
        assert_eq!(serializer().network(), NetworkConfig::bitcoin());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn record_round_trip(
            secret in prop::array::uniform32(any::<u8>()),
            chaincode in prop::array::uniform32(any::<u8>()),
            depth in any::<u8>(),
            parent_fingerprint in any::<u32>(),
            sequence in any::<u32>(),
            private in any::<bool>()
        ) {
            let k = PrivKey::from_slice(&secret);
            prop_assume!(k.is_ok());
            let k = k.unwrap();
            let hd_key = if private { HdKey::Private(k) } else { HdKey::Public(PubKey::from_priv_key(&k)) };
            let key = HierarchicalKey::construct(depth, parent_fingerprint, sequence, chaincode, hd_key);

            let bytes = serializer().serialize(&key);
            prop_assert_eq!(bytes.len(), EXTENDED_KEY_LEN);
            let decoded = serializer().parse_bytes(&bytes).unwrap();
            prop_assert_eq!(decoded, key);
            prop_assert_eq!(decoded.is_private(), private);
        }
    }
}
