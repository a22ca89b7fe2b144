/*
    A signature as it appears in a script sig or witness:
    DER encoded ECDSA signature followed by one sighash type byte.
*/

use crate::{
    ecdsa::Signature,
    transaction::{
        SigHashType,
        TxError
    }
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature {
    pub signature: Signature,
    pub sighash_type: SigHashType
}

impl TransactionSignature {
    pub fn new(signature: Signature, sighash_type: SigHashType) -> Self {
        Self {
            signature,
            sighash_type
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.signature.to_der();
        bytes.push(self.sighash_type.to_u32() as u8);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let (sighash_byte, der) = match bytes.split_last() {
            Some(x) => x,
            None => return Err(TxError::BadSignature("empty signature".to_string()))
        };

        let sighash_type = SigHashType::from_u32(*sighash_byte as u32)?;
        let signature = match Signature::from_der(der) {
            Ok(x) => x,
            Err(e) => return Err(TxError::BadSignature(e.to_string()))
        };

        Ok(Self::new(signature, sighash_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecdsa::{
            EcAdapter,
            Secp256k1Adapter
        },
        key::PrivKey
    };

    #[test]
    fn sighash_byte_is_appended() {
        let ec = Secp256k1Adapter::new();
        let sig = ec.sign(&[0x42; 32], &PrivKey::from_slice(&[0x01; 32]).unwrap()).unwrap();
        let tx_sig = TransactionSignature::new(sig, SigHashType::SinglePlusAnyoneCanPay);

        let bytes = tx_sig.to_bytes();
        assert_eq!(*bytes.last().unwrap(), 0x83);
        assert_eq!(&bytes[..bytes.len() - 1], &sig.to_der()[..]);
        assert_eq!(TransactionSignature::from_bytes(&bytes).unwrap(), tx_sig);
    }

    #[test]
    fn rejects_bad_encodings() {
        assert!(matches!(TransactionSignature::from_bytes(&[]), Err(TxError::BadSignature(_))));
        assert!(matches!(TransactionSignature::from_bytes(&[0x30, 0x00, 0x04]), Err(TxError::BadSigHashType(4))));
        assert!(matches!(TransactionSignature::from_bytes(&[0x30, 0x00, 0x01]), Err(TxError::BadSignature(_))));
    }
}
