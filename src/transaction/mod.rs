/*
    Bitcoin transactions.

    Only what the input signer needs: consensus serialization (with
    and without witness data), txid and the two signature hash
    algorithms.
*/

pub mod sighash;
pub mod signature;

pub use sighash::{
    SigHashType,
    SigVersion
};
pub use signature::TransactionSignature;

use crate::{
    encoding::{
        parser::{
            write_var_bytes,
            write_varint
        },
        Parser,
        ParserOutOfRange
    },
    hash,
    script::Script
};

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("input index {index} out of range for {inputs} inputs")]
    InputIndexOutOfRange { index: usize, inputs: usize },
    #[error("undefined sighash type {0:#x}")]
    BadSigHashType(u32),
    #[error("bad transaction signature: {0}")]
    BadSignature(String),
    #[error("truncated transaction: {0}")]
    Truncated(#[from] ParserOutOfRange),
    #[error("bad segwit flag {0:#04x}")]
    BadWitnessFlag(u8),
    #[error("{0} bytes left over after the transaction")]
    TrailingBytes(usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutPoint {
    /// Txid in internal byte order
    pub txid: [u8; 32],
    pub vout: u32
}

impl OutPoint {
    pub fn new(txid: [u8; 32], vout: u32) -> Self {
        Self { txid, vout }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.txid);
        out.extend_from_slice(&self.vout.to_le_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>
}

impl TxIn {
    /**
        An unsigned input spending `previous_output`
    */
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::default(),
            sequence: 0xffff_ffff,
            witness: vec![]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Script
}

impl TxOut {
    pub fn new(value: u64, script_pubkey: Script) -> Self {
        Self { value, script_pubkey }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(out, self.script_pubkey.as_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32
}

impl Transaction {
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| !i.witness.is_empty())
    }

    /**
        Serialization without witness data. This is what the txid
        and the legacy signature hash commit to.
    */
    pub fn serialize(&self) -> Vec<u8> {
        let mut out: Vec<u8> = vec![];
        self.write(&mut out, false);
        out
    }

    /**
        BIP-144 serialization (marker, flag and witnesses) if any input
        carries witness data, otherwise the same as serialize().
    */
    pub fn serialize_with_witness(&self) -> Vec<u8> {
        let mut out: Vec<u8> = vec![];
        self.write(&mut out, self.has_witness());
        out
    }

    fn write(&self, out: &mut Vec<u8>, witness: bool) {
        out.extend_from_slice(&self.version.to_le_bytes());
        if witness {
            out.extend_from_slice(&[0x00, 0x01]);
        }

        write_varint(out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.previous_output.write(out);
            write_var_bytes(out, input.script_sig.as_bytes());
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(out);
        }

        if witness {
            for input in &self.inputs {
                write_varint(out, input.witness.len() as u64);
                for item in &input.witness {
                    write_var_bytes(out, item);
                }
            }
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
    }

    /**
        Parse a transaction in either serialization. The whole slice must be consumed.
    */
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TxError> {
        let mut parser = Parser::new(bytes);
        let version = parser.read_u32_le()? as i32;

        let mut input_count = parser.read_varint()?;
        let segwit = input_count == 0 && !parser.is_empty();
        if segwit {
            let flag = parser.read_u8()?;
            if flag != 0x01 { return Err(TxError::BadWitnessFlag(flag)) }
            input_count = parser.read_varint()?;
        }

        let mut inputs: Vec<TxIn> = vec![];
        for _ in 0..input_count {
            let txid = parser.read_array::<32>()?;
            let vout = parser.read_u32_le()?;
            let script_sig = Script::new(parser.read_var_bytes()?.to_vec());
            let sequence = parser.read_u32_le()?;
            inputs.push(TxIn {
                previous_output: OutPoint::new(txid, vout),
                script_sig,
                sequence,
                witness: vec![]
            });
        }

        let output_count = parser.read_varint()?;
        let mut outputs: Vec<TxOut> = vec![];
        for _ in 0..output_count {
            let value = parser.read_u64_le()?;
            let script_pubkey = Script::new(parser.read_var_bytes()?.to_vec());
            outputs.push(TxOut::new(value, script_pubkey));
        }

        if segwit {
            for input in inputs.iter_mut() {
                let items = parser.read_varint()?;
                for _ in 0..items {
                    input.witness.push(parser.read_var_bytes()?.to_vec());
                }
            }
        }

        let lock_time = parser.read_u32_le()?;
        if !parser.is_empty() {
            return Err(TxError::TrailingBytes(parser.remaining()))
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time
        })
    }

    /**
        Double Sha256 of the witness-less serialization, internal byte order.
    */
    pub fn txid(&self) -> [u8; 32] {
        hash::double_sha256(self.serialize())
    }

    /**
        Txid as it is usually displayed (byte reversed hex).
    */
    pub fn txid_hex(&self) -> String {
        let mut txid = self.txid();
        txid.reverse();
        crate::util::encode_02x(&txid)
    }
}
