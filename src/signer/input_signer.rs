/*
    Drives the signing of one transaction input.

    Construction works out which script the input is really locked with
    (unwrapping P2SH, P2WPKH and P2WSH), breaks that script into steps
    and picks up any signatures already present on the input. After that
    keys can be applied in any order, by any number of cosigners, and the
    result serialized back into a script sig and witness.

    Supported layouts:
        - bare P2PK, P2PKH and multisig
        - P2SH with any of the above as redeem script
        - P2WPKH and P2WSH, also nested in P2SH
        - OP_IF <script> OP_ELSE <script> OP_ENDIF as redeem or witness script
*/

use crate::{
    ecdsa::{
        EcAdapter,
        Secp256k1Adapter
    },
    key::{
        PrivKey,
        PubKey
    },
    script::{
        Branches,
        Script,
        ScriptInfo,
        ScriptType
    },
    signer::{
        Checksig,
        Conditional,
        SignData,
        SignerError,
        SigValues,
        Step,
        VerifyFlags
    },
    transaction::{
        SigHashType,
        SigVersion,
        Transaction,
        TransactionSignature,
        TxError,
        TxOut
    }
};
use log::debug;

/**
    The script the input is locked with once the P2SH and witness layers are peeled off.
*/
struct Solution {
    sig_version: SigVersion,
    redeem_script: Option<Script>,
    witness_script: Option<Script>,
    script_code: Script
}

fn solve(script_pubkey: &Script, sign_data: &SignData) -> Result<Solution, SignerError> {
    let mut redeem_script: Option<Script> = None;
    let mut inner: Script = script_pubkey.clone();

    if ScriptType::classify(script_pubkey) == ScriptType::P2SH {
        let rs = match &sign_data.redeem_script {
            Some(x) => x.clone(),
            None => return Err(SignerError::PreconditionViolation("P2SH output needs a redeem script".to_string()))
        };
        if Script::p2sh(&rs) != *script_pubkey {
            return Err(SignerError::ScriptMismatch("redeem script does not hash to the P2SH output".to_string()))
        }
        inner = rs.clone();
        redeem_script = Some(rs);
    }

    match ScriptType::classify(&inner) {
        ScriptType::P2WPKH => {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&inner.as_bytes()[2..22]);
            Ok(Solution {
                sig_version: SigVersion::WitnessV0,
                redeem_script,
                witness_script: None,
                script_code: Script::p2pkh(&hash)
            })
        },
        ScriptType::P2WSH => {
            let ws = match &sign_data.witness_script {
                Some(x) => x.clone(),
                None => return Err(SignerError::PreconditionViolation("P2WSH output needs a witness script".to_string()))
            };
            if Script::p2wsh(&ws) != inner {
                return Err(SignerError::ScriptMismatch("witness script does not hash to the P2WSH program".to_string()))
            }
            Ok(Solution {
                sig_version: SigVersion::WitnessV0,
                redeem_script,
                witness_script: Some(ws.clone()),
                script_code: ws
            })
        },
        ScriptType::P2SH => Err(SignerError::UnsupportedScriptType(ScriptType::P2SH)),
        _ => Ok(Solution {
            sig_version: SigVersion::Base,
            redeem_script,
            witness_script: None,
            script_code: inner
        })
    }
}

/**
    Steps for a signing script. A branch script only gets steps for the
    side that `logical_path` selects, followed by the branch value.
*/
fn decompose(script: &Script, logical_path: Option<bool>) -> Result<Vec<Step>, SignerError> {
    match Branches::split(script) {
        Some(branches) => {
            let path = match logical_path {
                Some(x) => x,
                None => return Err(SignerError::PreconditionViolation("branch script needs a logical path".to_string()))
            };
            let checksig = Checksig::from_script(branches.branch(path))?;
            let guards = if path { vec![0] } else { vec![] };
            Ok(vec![
                Step::Checksig(checksig),
                Step::Conditional(Conditional::with_value(path, guards))
            ])
        },
        None => Ok(vec![Step::Checksig(Checksig::from_script(script)?)])
    }
}

pub struct InputSigner<'a, E: EcAdapter = Secp256k1Adapter> {
    ec: E,
    tx: &'a Transaction,
    input_index: usize,
    spent_output: TxOut,
    sig_version: SigVersion,
    redeem_script: Option<Script>,
    witness_script: Option<Script>,
    script_code: Script,
    steps: Vec<Step>,
    flags: VerifyFlags
}

impl<'a, E: EcAdapter> InputSigner<'a, E> {
    /**
        Signer for input `input_index` of `tx`, which spends `spent_output`.
        Signatures already on the input are extracted and kept.
    */
    pub fn new(ec: E, tx: &'a Transaction, input_index: usize, spent_output: TxOut, sign_data: SignData) -> Result<Self, SignerError> {
        let mut signer = Self::build(ec, tx, input_index, spent_output, &sign_data, None)?;
        signer.extract()?;
        Ok(signer)
    }

    /**
        Signer over a caller supplied list of steps. The spent output and
        sign data still decide the sighash and how the result is wrapped.
        Every Conditional must already have its value.
    */
    pub fn from_steps(ec: E, tx: &'a Transaction, input_index: usize, spent_output: TxOut, sign_data: SignData, steps: Vec<Step>) -> Result<Self, SignerError> {
        Self::build(ec, tx, input_index, spent_output, &sign_data, Some(steps))
    }

    fn build(ec: E, tx: &'a Transaction, input_index: usize, spent_output: TxOut, sign_data: &SignData, steps: Option<Vec<Step>>) -> Result<Self, SignerError> {
        if input_index >= tx.inputs.len() {
            return Err(TxError::InputIndexOutOfRange { index: input_index, inputs: tx.inputs.len() }.into())
        }

        let solution = solve(&spent_output.script_pubkey, sign_data)?;
        let steps = match steps {
            Some(x) => x,
            None => decompose(&solution.script_code, sign_data.logical_path)?
        };
        debug!("input {}: {} steps, {:?}", input_index, steps.len(), solution.sig_version);

        let mut signer = Self {
            ec,
            tx,
            input_index,
            spent_output,
            sig_version: solution.sig_version,
            redeem_script: solution.redeem_script,
            witness_script: solution.witness_script,
            script_code: solution.script_code,
            steps,
            flags: sign_data.flags.unwrap_or_default()
        };

        for idx in 0..signer.steps.len() {
            if let Step::Conditional(_) = signer.steps[idx] {
                signer.resolve_conditional(idx)?;
            }
        }
        Ok(signer)
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn spent_output(&self) -> &TxOut {
        &self.spent_output
    }

    pub fn sig_version(&self) -> SigVersion {
        self.sig_version
    }

    /**
        The script signatures commit to.
    */
    pub fn script_code(&self) -> &Script {
        &self.script_code
    }

    pub fn redeem_script(&self) -> Option<&Script> {
        self.redeem_script.as_ref()
    }

    pub fn witness_script(&self) -> Option<&Script> {
        self.witness_script.as_ref()
    }

    pub fn flags(&self) -> VerifyFlags {
        self.flags
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, idx: usize) -> Option<&Step> {
        self.steps.get(idx)
    }

    /**
        Apply the value of the Conditional at step `idx` to the Checksig steps it guards.
    */
    pub fn resolve_conditional(&mut self, idx: usize) -> Result<(), SignerError> {
        let conditional = match self.steps.get(idx) {
            Some(Step::Conditional(c)) => c.clone(),
            _ => return Err(SignerError::InvalidStep(idx))
        };
        if !conditional.has_value() {
            return Err(SignerError::PreconditionViolation(format!("conditional at step {} has no value", idx)))
        }

        for &guard in conditional.guards() {
            match self.steps.get_mut(guard) {
                Some(Step::Checksig(c)) => conditional.receives_value(c)?,
                _ => return Err(SignerError::InvalidStep(guard))
            }
        }
        Ok(())
    }

    pub fn get_sig_hash(&self, sighash_type: SigHashType) -> Result<[u8; 32], SignerError> {
        Ok(self.tx.signature_hash(
            self.input_index,
            &self.script_code,
            self.spent_output.value,
            sighash_type,
            self.sig_version
        )?)
    }

    /**
        Sign the Checksig at step `idx` with `key`, into the slot of the key's public key.
    */
    pub fn sign_step(&mut self, idx: usize, key: &PrivKey, sighash_type: SigHashType) -> Result<(), SignerError> {
        let public_key = self.ec.public_key(key);
        let hash = self.get_sig_hash(sighash_type)?;

        let checksig = match self.steps.get_mut(idx) {
            Some(Step::Checksig(c)) => c,
            _ => return Err(SignerError::InvalidStep(idx))
        };
        let slot = match checksig.key_index(&public_key) {
            Some(x) => x,
            None => return Err(SignerError::KeyNotFound)
        };
        if !checksig.has_key(slot)? {
            checksig.set_key(slot, Some(public_key))?;
        }

        let signature = self.ec.sign(&hash, key)?;
        checksig.set_signature(slot, TransactionSignature::new(signature, sighash_type))?;
        debug!("input {}: signed step {} slot {} ({:?})", self.input_index, idx, slot, sighash_type);
        Ok(())
    }

    /**
        Sign every Checksig step `key` belongs to that still needs signatures.
        Returns how many steps were signed.
    */
    pub fn sign(&mut self, key: &PrivKey, sighash_type: SigHashType) -> Result<usize, SignerError> {
        let public_key = self.ec.public_key(key);
        let targets: Vec<usize> = self.steps.iter().enumerate()
            .filter_map(|(i, step)| match step {
                Step::Checksig(c) if !c.is_fully_signed() && c.key_index(&public_key).is_some() => Some(i),
                _ => None
            })
            .collect();

        for &idx in &targets {
            self.sign_step(idx, key, sighash_type)?;
        }
        Ok(targets.len())
    }

    fn signs_for(&self, signature: &TransactionSignature, key: &PubKey) -> bool {
        match self.get_sig_hash(signature.sighash_type) {
            Ok(hash) => self.ec.verify(&hash, &signature.signature.normalized(), key),
            Err(_) => false
        }
    }

    /**
        Check every signature of every required step. False if anything is
        missing or invalid. `flags` defaults to the flags from SignData.
    */
    pub fn verify(&self, flags: Option<VerifyFlags>) -> bool {
        let flags = flags.unwrap_or(self.flags);
        if self.redeem_script.is_some() && !flags.has_flag(VerifyFlags::P2SH) {
            return false
        }
        if self.sig_version == SigVersion::WitnessV0 && !flags.has_flag(VerifyFlags::WITNESS) {
            return false
        }

        for step in &self.steps {
            let checksig = match step {
                Step::Checksig(c) => c,
                Step::Conditional(c) => {
                    if !c.has_value() { return false }
                    continue
                }
            };
            if !checksig.is_required() { continue }
            if !checksig.is_fully_signed() { return false }

            for idx in 0..checksig.key_count() {
                let signature = match checksig.signature(idx) {
                    Some(x) => x,
                    None => continue
                };
                let key = match checksig.key(idx) {
                    Some(x) => x,
                    None => return false
                };
                if let ScriptInfo::PayToPubkeyHash { hash } = checksig.info() {
                    if key.hash160() != *hash { return false }
                }
                if flags.has_flag(VerifyFlags::LOW_S) && !signature.signature.is_low_s() {
                    return false
                }
                if !self.signs_for(signature, key) {
                    return false
                }
            }
        }
        true
    }

    pub fn is_fully_signed(&self) -> bool {
        self.steps.iter().all(|s| s.is_fully_signed())
    }

    /**
        Signatures needed across all required steps.
    */
    pub fn required_sigs(&self) -> usize {
        self.steps.iter()
            .filter_map(|s| s.as_checksig())
            .filter(|c| c.is_required())
            .map(|c| c.required_sig_count())
            .sum()
    }

    /**
        Signature slots of all Checksig steps, in step order.
    */
    pub fn signatures(&self) -> Vec<Option<TransactionSignature>> {
        self.steps.iter()
            .filter_map(|s| s.as_checksig())
            .flat_map(|c| c.signatures().to_vec())
            .collect()
    }

    /**
        Key slots of all Checksig steps, in step order.
    */
    pub fn public_keys(&self) -> Vec<Option<PubKey>> {
        self.steps.iter()
            .filter_map(|s| s.as_checksig())
            .flat_map(|c| c.keys().to_vec())
            .collect()
    }

    /**
        Unlocking data for a fully signed input.
    */
    pub fn serialize_signatures(&self) -> Result<SigValues, SignerError> {
        if !self.is_fully_signed() {
            return Err(SignerError::NotFullySigned)
        }
        self.assemble()
    }

    /**
        Unlocking data with whatever signatures are present, so the
        input can be handed on to the next cosigner.
    */
    pub fn serialize_partial_signatures(&self) -> Result<SigValues, SignerError> {
        self.assemble()
    }

    fn assemble(&self) -> Result<SigValues, SignerError> {
        let mut stack: Vec<Vec<u8>> = vec![];
        for step in &self.steps {
            stack.extend(step.serialize()?);
        }

        let values = match self.sig_version {
            SigVersion::Base => {
                if let Some(rs) = &self.redeem_script {
                    stack.push(rs.code.clone());
                }
                SigValues {
                    script_sig: Script::from_stack(&stack),
                    witness: vec![]
                }
            },
            SigVersion::WitnessV0 => {
                if let Some(ws) = &self.witness_script {
                    stack.push(ws.code.clone());
                }
                //Nested segwit keeps the witness program in the script sig
                let script_sig = match &self.redeem_script {
                    Some(rs) => Script::from_stack(&[rs.code.clone()]),
                    None => Script::default()
                };
                SigValues {
                    script_sig,
                    witness: stack
                }
            }
        };

        debug!("input {}: serialized {} byte script sig, {} witness items", self.input_index, values.script_sig.len(), values.witness.len());
        Ok(values)
    }

    /**
        Read the signatures already present on the input into the steps.
        Every signature found must be valid for one of the step's keys.
    */
    pub fn extract(&mut self) -> Result<(), SignerError> {
        let tx = self.tx;
        let input = &tx.inputs[self.input_index];
        let mut stack: Vec<Vec<u8>> = match self.sig_version {
            SigVersion::Base => input.script_sig.push_only_stack()?,
            SigVersion::WitnessV0 => input.witness.clone()
        };
        if stack.is_empty() { return Ok(()) }

        let layer = match self.sig_version {
            SigVersion::Base => self.redeem_script.as_ref(),
            SigVersion::WitnessV0 => self.witness_script.as_ref()
        };
        if let Some(script) = layer {
            if stack.pop().as_ref() != Some(&script.code) {
                return Err(SignerError::ScriptMismatch("input does not end with the expected script".to_string()))
            }
        }

        if let Some(Step::Conditional(c)) = self.steps.last() {
            let value = c.serialize()?;
            if stack.pop().as_ref() != value.last() {
                return Err(SignerError::ScriptMismatch("branch value on input does not match the logical path".to_string()))
            }
        }

        let checksig = match self.steps.first() {
            Some(Step::Checksig(c)) => c.clone(),
            _ => return Err(SignerError::InvalidStep(0))
        };
        let (keys, signatures) = self.match_stack(&checksig, &stack)?;

        if let Some(Step::Checksig(c)) = self.steps.get_mut(0) {
            for (idx, key) in keys {
                c.set_key(idx, Some(key))?;
            }
            for (idx, signature) in &signatures {
                c.set_signature(*idx, *signature)?;
            }
        }
        debug!("input {}: extracted {} signatures", self.input_index, signatures.len());
        Ok(())
    }

    fn match_stack(&self, checksig: &Checksig, stack: &[Vec<u8>]) -> Result<(Vec<(usize, PubKey)>, Vec<(usize, TransactionSignature)>), SignerError> {
        let mut keys: Vec<(usize, PubKey)> = vec![];
        let mut signatures: Vec<(usize, TransactionSignature)> = vec![];
        let mismatch = |what: &str| SignerError::ScriptMismatch(format!("unexpected {} stack on input", what));

        match checksig.info() {
            ScriptInfo::PayToPubkey { key } => match stack {
                [] => {},
                [item] if item.is_empty() => {},
                [item] => {
                    let signature = TransactionSignature::from_bytes(item)?;
                    if !self.signs_for(&signature, key) { return Err(mismatch("P2PK")) }
                    signatures.push((0, signature));
                },
                _ => return Err(mismatch("P2PK"))
            },
            ScriptInfo::PayToPubkeyHash { .. } => match stack {
                [] => {},
                [sig_item, key_item] => {
                    let key = PubKey::from_slice(key_item)?;
                    if checksig.key_index(&key) != Some(0) { return Err(mismatch("P2PKH")) }
                    let signature = TransactionSignature::from_bytes(sig_item)?;
                    if !self.signs_for(&signature, &key) { return Err(mismatch("P2PKH")) }
                    keys.push((0, key));
                    signatures.push((0, signature));
                },
                _ => return Err(mismatch("P2PKH"))
            },
            ScriptInfo::Multisig { .. } => {
                //First item is the OP_CHECKMULTISIG dummy, empty items are placeholders
                if stack.first().map_or(false, |dummy| !dummy.is_empty()) {
                    return Err(SignerError::ScriptMismatch("multisig dummy item must be empty".to_string()))
                }
                for item in stack.iter().skip(1).filter(|i| !i.is_empty()) {
                    let signature = TransactionSignature::from_bytes(item)?;
                    let slot = (0..checksig.key_count()).find(|&i| {
                        !signatures.iter().any(|(taken, _)| *taken == i)
                            && checksig.key(i).map_or(false, |k| self.signs_for(&signature, k))
                    });
                    match slot {
                        Some(i) => signatures.push((i, signature)),
                        None => return Err(mismatch("multisig"))
                    }
                }
            }
        }
        Ok((keys, signatures))
    }

    /**
        Merge the keys and signatures of another signer for the same input.
        Slots filled on both sides end up with the other signer's signature.
        Once a step has all the signatures it needs, no new slots are filled.
    */
    pub fn combine<F: EcAdapter>(&mut self, other: &InputSigner<'_, F>) -> Result<(), SignerError> {
        if self.steps.len() != other.steps.len() || self.get_sig_hash(SigHashType::All)? != other.get_sig_hash(SigHashType::All)? {
            return Err(SignerError::ScriptMismatch("signers are not for the same input".to_string()))
        }

        for (idx, (mine, theirs)) in self.steps.iter_mut().zip(other.steps.iter()).enumerate() {
            match (mine, theirs) {
                (Step::Checksig(a), Step::Checksig(b)) if a.info() == b.info() => {
                    for slot in 0..b.key_count() {
                        if let Some(key) = b.key(slot) {
                            if !a.has_key(slot)? {
                                a.set_key(slot, Some(*key))?;
                            }
                        }
                        //A complete step only takes replacements for slots it already filled
                        if let Some(signature) = b.signature(slot) {
                            if a.has_signature(slot)? || !a.is_fully_signed() {
                                a.set_signature(slot, *signature)?;
                            }
                        }
                    }
                },
                (Step::Conditional(a), Step::Conditional(b)) if *a == *b => {},
                _ => return Err(SignerError::InvalidStep(idx))
            }
        }
        debug!("input {}: combined signatures, {} collected", self.input_index, self.signatures().iter().filter(|s| s.is_some()).count());
        Ok(())
    }
}
