/*
    Bitcoin scripts.

    Holds the raw script bytes, templates for the standard output
    scripts, an instruction iterator and the classifier the input
    signer uses to find out what a script needs to be unlocked.
*/

pub mod builder;
pub mod classifier;

pub use builder::{
    Builder as ScriptBuilder,
    Opcode,
    opcodes
};
pub use classifier::{
    Branches,
    ScriptInfo,
    ScriptType
};

use crate::{
    encoding::Parser,
    hash,
    key::PubKey
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptErr {
    #[error("script is not a standard template")]
    NonStandardScript,
    #[error("push at offset {0} runs past the end of the script")]
    MalformedPush(usize),
    #[error("opcode {0:#04x} is not a push")]
    NotPushOnly(u8),
    #[error("multisig scripts take 1 to 16 keys")]
    MaxKeyCountExceeded,
    #[error("{required} signatures cannot be required from {keys} keys")]
    KeyCountDoesNotMatch { required: usize, keys: usize }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub code: Vec<u8>
}

impl Script {
    /**
        Create a new instance of self
    */
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            code
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /**
        Hash the script with Hash160
    */
    pub fn hash(&self) -> [u8; 20] {
        hash::hash160(&self.code)
    }

    /**
        Single Sha256 of the script, the P2WSH commitment
    */
    pub fn wsh_hash(&self) -> [u8; 32] {
        hash::sha256(&self.code)
    }

    pub fn instructions(&self) -> Instructions {
        Instructions {
            parser: Parser::new(&self.code),
            done: false
        }
    }

    /**
        Evaluate a push only script into the stack it leaves behind.
        Fails on the first opcode that is not a push.
    */
    pub fn push_only_stack(&self) -> Result<Vec<Vec<u8>>, ScriptErr> {
        let mut stack: Vec<Vec<u8>> = vec![];
        for instruction in self.instructions() {
            match instruction? {
                Instruction::Push(data) => stack.push(data.to_vec()),
                Instruction::Op(op) => match op.small_int() {
                    Some(n) => stack.push(vec![n]),
                    None if op == opcodes::OP_1NEGATE => stack.push(vec![0x81]),
                    None => return Err(ScriptErr::NotPushOnly(op.into_u8()))
                }
            }
        }
        Ok(stack)
    }

    /**
        A push only script that leaves `stack` behind. Inverse of push_only_stack.
    */
    pub fn from_stack(stack: &[Vec<u8>]) -> Self {
        stack.iter()
            .fold(ScriptBuilder::new(), |b, item| b.push_slice(item))
            .into_script()
    }

    /// P2PK script pub key
    /// <Pubkey> OP_CHECKSIG
    pub fn p2pk(pubkey: &PubKey) -> Self {
        ScriptBuilder::new()
            .push_slice(&pubkey.as_bytes())
            .push_opcode(opcodes::OP_CHECKSIG)
            .into_script()
    }

    /// P2PKH script pub key
    /// OP_DUP OP_HASH160 <Pubkey Hash> OP_EQUALVERIFY OP_CHECKSIG
    pub fn p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        ScriptBuilder::new()
            .push_opcode(opcodes::OP_DUP)
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(pubkey_hash)
            .push_opcode(opcodes::OP_EQUALVERIFY)
            .push_opcode(opcodes::OP_CHECKSIG)
            .into_script()
    }

    ///Creates the redeem script for a m-of-n multisig wallet.
    ///Keys keep the order they are given in.
    pub fn multisig(m: u8, keys: &[PubKey]) -> Result<Self, ScriptErr> {
        if keys.is_empty() || keys.len() > 16 { return Err(ScriptErr::MaxKeyCountExceeded) }
        if m == 0 || m as usize > keys.len() {
            return Err(ScriptErr::KeyCountDoesNotMatch { required: m as usize, keys: keys.len() })
        }

        let mut builder = ScriptBuilder::new().push_int(m);
        for key in keys {
            builder = builder.push_slice(&key.as_bytes());
        }

        Ok(builder
            .push_int(keys.len() as u8)
            .push_opcode(opcodes::OP_CHECKMULTISIG)
            .into_script())
    }

    /// P2SH script pub key
    /// OP_HASH160 <Hash160(redeemScript)> OP_EQUAL
    pub fn p2sh(script: &Self) -> Self {
        ScriptBuilder::new()
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(&script.hash())
            .push_opcode(opcodes::OP_EQUAL)
            .into_script()
    }

    /// P2WPKH script pub key
    /// 0x0014 <20-byte-pubkey-hash>
    pub fn p2wpkh(pubkey_hash: &[u8; 20]) -> Self {
        ScriptBuilder::new()
            .push_opcode(opcodes::OP_0)
            .push_slice(pubkey_hash)
            .into_script()
    }

    /// P2WSH script pub key
    /// 0x0020 <32-byte-script-hash>
    pub fn p2wsh(script: &Self) -> Self {
        ScriptBuilder::new()
            .push_opcode(opcodes::OP_0)
            .push_slice(&script.wsh_hash())
            .into_script()
    }
}

/**
    A single step of a script: either data being pushed or any other opcode.
    OP_0 and the PUSHDATA opcodes come out as pushes, OP_1 to OP_16 as opcodes.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Push(&'a [u8]),
    Op(Opcode)
}

pub struct Instructions<'a> {
    parser: Parser<'a>,
    done: bool
}

impl<'a> Instructions<'a> {
    /**
        Byte offset of the next instruction.
    */
    pub fn position(&self) -> usize {
        self.parser.position()
    }

    fn read_push(&mut self, opcode: u8) -> Result<&'a [u8], ScriptErr> {
        let start = self.parser.position() - 1;
        let len: Option<usize> = match opcode {
            0x00..=0x4b => Some(opcode as usize),
            0x4c => self.parser.read_u8().ok().map(|n| n as usize),
            0x4d => self.parser.read_u16_le().ok().map(|n| n as usize),
            _ => self.parser.read_u32_le().ok().map(|n| n as usize)
        };
        match len.map(|n| self.parser.read_bytes(n)) {
            Some(Ok(data)) => Ok(data),
            _ => Err(ScriptErr::MalformedPush(start))
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ScriptErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done { return None }

        let opcode = match self.parser.read_u8() {
            Ok(x) => x,
            Err(_) => return None
        };

        if opcode <= opcodes::OP_PUSHDATA4.into_u8() {
            match self.read_push(opcode) {
                Ok(data) => Some(Ok(Instruction::Push(data))),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            }
        } else {
            Some(Ok(Instruction::Op(Opcode::from(opcode))))
        }
    }
}
