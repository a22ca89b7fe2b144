/*
    Signature accumulator for one signature-checking template
    (P2PK, P2PKH or m-of-n multisig).

    Signatures and keys live in slots indexed by the key's position
    in the script, so cosigners can fill in their own slot and the
    results can be merged slot by slot.
*/

use crate::{
    key::PubKey,
    script::{
        Script,
        ScriptInfo,
        ScriptType
    },
    signer::SignerError,
    transaction::TransactionSignature
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksig {
    info: ScriptInfo,
    required: bool,
    signatures: Vec<Option<TransactionSignature>>,
    keys: Vec<Option<PubKey>>
}

impl Checksig {
    /**
        Keys written into the script are filled in straight away.
    */
    pub fn new(info: ScriptInfo) -> Self {
        let key_count = info.key_count();
        let mut keys: Vec<Option<PubKey>> = vec![None; key_count];
        for (slot, key) in keys.iter_mut().zip(info.keys()) {
            *slot = Some(key);
        }

        Self {
            info,
            required: true,
            signatures: vec![None; key_count],
            keys
        }
    }

    /**
        Checksig for a P2PK, P2PKH or multisig script.
        Wrapping templates (P2SH, P2WPKH, P2WSH) and non-standard scripts are rejected.
    */
    pub fn from_script(script: &Script) -> Result<Self, SignerError> {
        match ScriptType::classify(script) {
            ScriptType::P2PK | ScriptType::P2PKH | ScriptType::Multisig => Ok(Self::new(ScriptInfo::from_script(script)?)),
            other => Err(SignerError::UnsupportedScriptType(other))
        }
    }

    pub fn info(&self) -> &ScriptInfo {
        &self.info
    }

    pub fn script_type(&self) -> ScriptType {
        self.info.script_type()
    }

    pub fn required_sig_count(&self) -> usize {
        self.info.required_sig_count()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    fn check_index(&self, idx: usize) -> Result<(), SignerError> {
        if idx >= self.key_count() {
            return Err(SignerError::IndexOutOfRange { index: idx, len: self.key_count() })
        }
        Ok(())
    }

    /**
        Store (or clear, with None) the key in slot `idx`.
    */
    pub fn set_key(&mut self, idx: usize, key: Option<PubKey>) -> Result<(), SignerError> {
        self.check_index(idx)?;
        self.keys[idx] = key;
        Ok(())
    }

    /**
        Store the signature in slot `idx`, replacing whatever was there.
    */
    pub fn set_signature(&mut self, idx: usize, signature: TransactionSignature) -> Result<(), SignerError> {
        self.check_index(idx)?;
        self.signatures[idx] = Some(signature);
        Ok(())
    }

    pub fn has_signature(&self, idx: usize) -> Result<bool, SignerError> {
        self.check_index(idx)?;
        Ok(self.signatures[idx].is_some())
    }

    pub fn has_key(&self, idx: usize) -> Result<bool, SignerError> {
        self.check_index(idx)?;
        Ok(self.keys[idx].is_some())
    }

    pub fn signature(&self, idx: usize) -> Option<&TransactionSignature> {
        self.signatures.get(idx).and_then(|s| s.as_ref())
    }

    pub fn key(&self, idx: usize) -> Option<&PubKey> {
        self.keys.get(idx).and_then(|k| k.as_ref())
    }

    pub fn signatures(&self) -> &[Option<TransactionSignature>] {
        &self.signatures
    }

    pub fn keys(&self) -> &[Option<PubKey>] {
        &self.keys
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    /**
        Slot a key signs for. For P2PKH the key is matched against the
        script's key hash, since the script does not contain the key.
    */
    pub fn key_index(&self, key: &PubKey) -> Option<usize> {
        match &self.info {
            ScriptInfo::PayToPubkeyHash { hash } => {
                if key.hash160() == *hash { Some(0) } else { None }
            },
            _ => self.keys.iter().position(|k| k.as_ref() == Some(key))
        }
    }

    pub fn is_fully_signed(&self) -> bool {
        if self.required {
            self.signature_count() == self.required_sig_count()
        } else {
            true
        }
    }

    /**
        The stack items for this template in the order the script consumes them.
    */
    pub fn serialize(&self) -> Vec<Vec<u8>> {
        let sig_bytes = |idx: usize| self.signature(idx).map(|s| s.to_bytes());

        match &self.info {
            ScriptInfo::PayToPubkey { .. } => {
                if !self.required {
                    vec![vec![]]
                } else {
                    sig_bytes(0).into_iter().collect()
                }
            },
            ScriptInfo::PayToPubkeyHash { .. } => match (sig_bytes(0), self.key(0)) {
                (Some(sig), Some(key)) => vec![sig, key.as_bytes().to_vec()],
                _ => vec![]
            },
            ScriptInfo::Multisig { required, .. } => {
                if !self.required {
                    vec![vec![]; required + 1]
                } else {
                    //OP_CHECKMULTISIG pops one extra item
                    let mut result: Vec<Vec<u8>> = vec![vec![]];
                    result.extend((0..self.key_count()).filter_map(sig_bytes));
                    result
                }
            }
        }
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
        key::PrivKey,
        transaction::SigHashType
    };

    fn priv_key(b: u8) -> PrivKey {
        PrivKey::from_slice(&[b; 32]).unwrap()
    }

    fn key(b: u8) -> PubKey {
        PubKey::from_priv_key(&priv_key(b))
    }

    fn sig(b: u8) -> TransactionSignature {
        let ec = Secp256k1Adapter::new();
        TransactionSignature::new(ec.sign(&[0x42; 32], &priv_key(b)).unwrap(), SigHashType::All)
    }

    fn two_of_three() -> Checksig {
        Checksig::from_script(&Script::multisig(2, &[key(1), key(2), key(3)]).unwrap()).unwrap()
    }

    #[test]
    fn threshold() {
        let mut c = two_of_three();
        assert_eq!((c.required_sig_count(), c.key_count()), (2, 3));
        assert!(!c.is_fully_signed());

        c.set_signature(2, sig(3)).unwrap();
        assert!(!c.is_fully_signed());
        c.set_signature(0, sig(1)).unwrap();
        assert!(c.is_fully_signed());

        //Overwriting a slot does not add a signature
        c.set_signature(0, sig(1)).unwrap();
        assert_eq!(c.signature_count(), 2);
        assert!(c.is_fully_signed());
    }

    #[test]
    fn index_bounds() {
        let mut c = two_of_three();
        assert!(matches!(c.set_signature(3, sig(1)), Err(SignerError::IndexOutOfRange { index: 3, len: 3 })));
        assert!(matches!(c.set_key(3, None), Err(SignerError::IndexOutOfRange { .. })));
        assert!(matches!(c.has_signature(3), Err(SignerError::IndexOutOfRange { .. })));
        assert!(matches!(c.has_key(7), Err(SignerError::IndexOutOfRange { .. })));
        assert!(!c.has_signature(2).unwrap());
        assert!(c.has_key(2).unwrap());

        c.set_key(2, None).unwrap();
        assert!(!c.has_key(2).unwrap());
    }

    #[test]
    fn multisig_serialization_is_sparse() {
        let mut c = two_of_three();
        c.set_signature(2, sig(3)).unwrap();
        c.set_signature(0, sig(1)).unwrap();
        assert_eq!(c.serialize(), vec![vec![], sig(1).to_bytes(), sig(3).to_bytes()]);

        c.set_required(false);
        assert!(c.is_fully_signed());
        assert_eq!(c.serialize(), vec![Vec::<u8>::new(); 3]);
    }

    #[test]
    fn p2pk_serialization() {
        let mut c = Checksig::from_script(&Script::p2pk(&key(5))).unwrap();
        assert!(c.serialize().is_empty());

        c.set_required(false);
        assert_eq!(c.serialize(), vec![Vec::<u8>::new()]);

        c.set_required(true);
        c.set_signature(0, sig(5)).unwrap();
        assert_eq!(c.serialize(), vec![sig(5).to_bytes()]);
    }

    #[test]
    fn p2pkh_needs_key_and_signature() {
        let mut c = Checksig::from_script(&Script::p2pkh(&key(6).hash160())).unwrap();
        assert!(!c.has_key(0).unwrap());
        assert_eq!(c.key_index(&key(6)), Some(0));
        assert_eq!(c.key_index(&key(7)), None);

        c.set_signature(0, sig(6)).unwrap();
        assert!(c.serialize().is_empty());

        c.set_key(0, Some(key(6))).unwrap();
        assert_eq!(c.serialize(), vec![sig(6).to_bytes(), key(6).as_bytes().to_vec()]);
    }

    #[test]
    fn key_lookup() {
        let c = two_of_three();
        assert_eq!(c.key_index(&key(2)), Some(1));
        assert_eq!(c.key_index(&key(9)), None);
    }

    #[test]
    fn wrappers_are_unsupported() {
        let ms = Script::multisig(1, &[key(1)]).unwrap();
        assert!(matches!(Checksig::from_script(&Script::p2sh(&ms)), Err(SignerError::UnsupportedScriptType(ScriptType::P2SH))));
        assert!(matches!(Checksig::from_script(&Script::p2wpkh(&key(1).hash160())), Err(SignerError::UnsupportedScriptType(ScriptType::P2WPKH))));
        assert!(matches!(Checksig::from_script(&Script::new(vec![0x6a])), Err(SignerError::UnsupportedScriptType(ScriptType::NonStandard))));
    }
}
