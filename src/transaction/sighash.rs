/*
    Signature hashing.

    Legacy inputs sign a modified copy of the transaction, segwit v0
    inputs sign the BIP-143 digest. Both commit to the sighash type
    as a trailing little endian u32.
*/

use crate::{
    encoding::parser::write_var_bytes,
    hash,
    script::{
        Instruction,
        Script,
        opcodes
    },
    transaction::{
        OutPoint,
        Transaction,
        TxError,
        TxIn,
        TxOut
    }
};
use log::trace;

const ANYONECANPAY: u32 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigHashType {
    All,
    None,
    Single,
    AllPlusAnyoneCanPay,
    NonePlusAnyoneCanPay,
    SinglePlusAnyoneCanPay
}

impl SigHashType {
    pub fn to_u32(self) -> u32 {
        match self {
            SigHashType::All => 0x01,
            SigHashType::None => 0x02,
            SigHashType::Single => 0x03,
            SigHashType::AllPlusAnyoneCanPay => 0x81,
            SigHashType::NonePlusAnyoneCanPay => 0x82,
            SigHashType::SinglePlusAnyoneCanPay => 0x83
        }
    }

    /**
        Only the six defined values are accepted.
    */
    pub fn from_u32(n: u32) -> Result<Self, TxError> {
        match n {
            0x01 => Ok(SigHashType::All),
            0x02 => Ok(SigHashType::None),
            0x03 => Ok(SigHashType::Single),
            0x81 => Ok(SigHashType::AllPlusAnyoneCanPay),
            0x82 => Ok(SigHashType::NonePlusAnyoneCanPay),
            0x83 => Ok(SigHashType::SinglePlusAnyoneCanPay),
            x => Err(TxError::BadSigHashType(x))
        }
    }

    pub fn anyone_can_pay(self) -> bool {
        self.to_u32() & ANYONECANPAY != 0
    }

    /**
        The type with ANYONECANPAY stripped
    */
    pub fn base(self) -> Self {
        match self {
            SigHashType::AllPlusAnyoneCanPay => SigHashType::All,
            SigHashType::NonePlusAnyoneCanPay => SigHashType::None,
            SigHashType::SinglePlusAnyoneCanPay => SigHashType::Single,
            x => x
        }
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::All
    }
}

/**
    Script code with every OP_CODESEPARATOR removed, as legacy signature
    hashing serializes it. Push data is left alone, and bytes after a
    malformed push are copied unchanged.
*/
fn strip_codeseparators(script: &Script) -> Script {
    let code = script.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(code.len());
    let mut instructions = script.instructions();
    let mut start = instructions.position();

    while let Some(instruction) = instructions.next() {
        let end = instructions.position();
        match instruction {
            Ok(Instruction::Op(op)) if op == opcodes::OP_CODESEPARATOR => {},
            Ok(_) => out.extend_from_slice(&code[start..end]),
            Err(_) => {
                out.extend_from_slice(&code[start..]);
                break
            }
        }
        start = end;
    }
    Script::new(out)
}

/**
    Which digest algorithm an input is signed with.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigVersion {
    Base,
    WitnessV0
}

impl Transaction {
    fn check_input(&self, input_index: usize) -> Result<(), TxError> {
        if input_index >= self.inputs.len() {
            return Err(TxError::InputIndexOutOfRange { index: input_index, inputs: self.inputs.len() })
        }
        Ok(())
    }

    /**
        Signature hash for the input at `input_index`.
        `value` is the amount of the spent output and only used by WitnessV0.
    */
    pub fn signature_hash(&self, input_index: usize, script_code: &Script, value: u64, sighash_type: SigHashType, version: SigVersion) -> Result<[u8; 32], TxError> {
        match version {
            SigVersion::Base => self.legacy_sighash(input_index, script_code, sighash_type),
            SigVersion::WitnessV0 => self.segwit_v0_sighash(input_index, script_code, value, sighash_type)
        }
    }

    /**
        Pre-segwit signature hash.

        SINGLE with no output at the input's index signs the number one,
        as the reference client does. OP_CODESEPARATORs are removed from
        `script_code` but it is not cut at the last one, so pass the part
        of the script after the executed separator when there is one.
    */
    pub fn legacy_sighash(&self, input_index: usize, script_code: &Script, sighash_type: SigHashType) -> Result<[u8; 32], TxError> {
        self.check_input(input_index)?;
        let base = sighash_type.base();
        let script_code = &strip_codeseparators(script_code);

        if base == SigHashType::Single && input_index >= self.outputs.len() {
            let mut one = [0u8; 32];
            one[0] = 0x01;
            return Ok(one)
        }

        let inputs: Vec<TxIn> = self.inputs.iter().enumerate()
            .filter(|(i, _)| !sighash_type.anyone_can_pay() || *i == input_index)
            .map(|(i, input)| {
                let signing = i == input_index;
                TxIn {
                    previous_output: input.previous_output,
                    script_sig: if signing { script_code.clone() } else { Script::default() },
                    sequence: if signing || base == SigHashType::All { input.sequence } else { 0 },
                    witness: vec![]
                }
            })
            .collect();

        let outputs: Vec<TxOut> = match base {
            SigHashType::None => vec![],
            SigHashType::Single => {
                let mut outputs = vec![TxOut::new(u64::MAX, Script::default()); input_index];
                outputs.push(self.outputs[input_index].clone());
                outputs
            },
            _ => self.outputs.clone()
        };

        let copy = Transaction {
            version: self.version,
            inputs,
            outputs,
            lock_time: self.lock_time
        };
        let mut preimage = copy.serialize();
        preimage.extend_from_slice(&sighash_type.to_u32().to_le_bytes());

        let digest = hash::double_sha256(&preimage);
        trace!("legacy sighash for input {} ({:?})", input_index, sighash_type);
        Ok(digest)
    }

    /**
        BIP-143 signature hash for segwit v0 inputs.
    */
    pub fn segwit_v0_sighash(&self, input_index: usize, script_code: &Script, value: u64, sighash_type: SigHashType) -> Result<[u8; 32], TxError> {
        self.check_input(input_index)?;
        let base = sighash_type.base();
        let acp = sighash_type.anyone_can_pay();
        let zero = [0u8; 32];

        let hash_prevouts = if acp { zero } else {
            let mut data: Vec<u8> = vec![];
            for input in &self.inputs {
                input.previous_output.write(&mut data);
            }
            hash::double_sha256(&data)
        };

        let hash_sequence = if acp || base != SigHashType::All { zero } else {
            let data: Vec<u8> = self.inputs.iter().flat_map(|i| i.sequence.to_le_bytes().to_vec()).collect();
            hash::double_sha256(&data)
        };

        let hash_outputs = match base {
            SigHashType::All => {
                let mut data: Vec<u8> = vec![];
                for output in &self.outputs {
                    output.write(&mut data);
                }
                hash::double_sha256(&data)
            },
            SigHashType::Single if input_index < self.outputs.len() => {
                let mut data: Vec<u8> = vec![];
                self.outputs[input_index].write(&mut data);
                hash::double_sha256(&data)
            },
            _ => zero
        };

        let input = &self.inputs[input_index];
        let mut preimage: Vec<u8> = vec![];
        preimage.extend_from_slice(&self.version.to_le_bytes());
        preimage.extend_from_slice(&hash_prevouts);
        preimage.extend_from_slice(&hash_sequence);
        OutPoint::write(&input.previous_output, &mut preimage);
        write_var_bytes(&mut preimage, script_code.as_bytes());
        preimage.extend_from_slice(&value.to_le_bytes());
        preimage.extend_from_slice(&input.sequence.to_le_bytes());
        preimage.extend_from_slice(&hash_outputs);
        preimage.extend_from_slice(&self.lock_time.to_le_bytes());
        preimage.extend_from_slice(&sighash_type.to_u32().to_le_bytes());

        let digest = hash::double_sha256(&preimage);
        trace!("segwit v0 sighash for input {} ({:?})", input_index, sighash_type);
        Ok(digest)
    }
}
