/*

    Script builder module.

*/

use crate::script::Script;

#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub code: Vec<u8>
}

impl Builder {
    /// Return a new instance of self
    pub fn new() -> Self  {
        Self { code: Vec::new() }
    }

    /// Push an opcode into self
    pub fn push_opcode(mut self, opcode: Opcode) -> Self {
        self.code.push(opcode.into_u8());
        self
    }

    /// Push data onto the stack using the smallest possible encoding
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        match data.len() {
            0 => self.code.push(opcodes::OP_0.into_u8()),
            1 if data[0] >= 1 && data[0] <= 16 => self.code.push(opcodes::OP_1.into_u8() + data[0] - 1),
            1 if data[0] == 0x81 => self.code.push(opcodes::OP_1NEGATE.into_u8()),
            n if n < opcodes::OP_PUSHDATA1.into_u8() as usize => {
                self.code.push(n as u8);
                self.code.extend_from_slice(data);
            },
            n if n <= 0xff => {
                self.code.push(opcodes::OP_PUSHDATA1.into_u8());
                self.code.push(n as u8);
                self.code.extend_from_slice(data);
            },
            n if n <= 0xffff => {
                self.code.push(opcodes::OP_PUSHDATA2.into_u8());
                self.code.extend_from_slice(&(n as u16).to_le_bytes());
                self.code.extend_from_slice(data);
            },
            n => {
                self.code.push(opcodes::OP_PUSHDATA4.into_u8());
                self.code.extend_from_slice(&(n as u32).to_le_bytes());
                self.code.extend_from_slice(data);
            }
        }
        self
    }

    /// Push a non negative integer. 0 to 16 use OP_0 ... OP_16,
    /// larger values are pushed as little endian script numbers
    pub fn push_int(self, n: u8) -> Self {
        match n {
            0 => self.push_opcode(opcodes::OP_0),
            1..=16 => self.push_opcode(Opcode::from(opcodes::OP_1.into_u8() + n - 1)),
            //High bit is the sign, so it needs a padding byte
            0x80..=0xff => self.push_slice(&[n, 0x00]),
            _ => self.push_slice(&[n])
        }
    }

    /// Convert self into a script
    pub fn into_script(self) -> Script {
        Script::new(self.code)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    code: u8
}

impl Opcode {
    pub fn into_u8(self) -> u8 {
        self.code
    }

    /// For OP_1 to OP_16, the number it pushes
    pub fn small_int(self) -> Option<u8> {
        if self.code >= opcodes::OP_1.code && self.code <= opcodes::OP_16.code {
            Some(self.code - opcodes::OP_1.code + 1)
        } else {
            None
        }
    }
}

impl From<u8> for Opcode {
    fn from(code: u8) -> Self {
        Self { code }
    }
}

// Opcode constants
pub mod opcodes {
    use super::Opcode;

    /// Push an empty array onto the stack
    pub const OP_0: Opcode = Opcode {code: 0x00};
    /// Read the next byte as N; push the next N bytes as an array onto the stack
    pub const OP_PUSHDATA1: Opcode = Opcode {code: 0x4c};
    /// Read the next 2 bytes as N; push the next N bytes as an array onto the stack
    pub const OP_PUSHDATA2: Opcode = Opcode {code: 0x4d};
    /// Read the next 4 bytes as N; push the next N bytes as an array onto the stack
    pub const OP_PUSHDATA4: Opcode = Opcode {code: 0x4e};
    /// Push the array [0x81] onto the stack
    pub const OP_1NEGATE: Opcode = Opcode {code: 0x4f};
    /// Push the array [0x01] onto the stack
    pub const OP_1: Opcode = Opcode {code: 0x51};
    /// Push the array [0x03] onto the stack
    pub const OP_3: Opcode = Opcode {code: 0x53};
    /// Push the array [0x10] onto the stack
    pub const OP_16: Opcode = Opcode {code: 0x60};
    /// Pop and execute the next statements if a nonzero element was popped
    pub const OP_IF: Opcode = Opcode {code: 0x63};
    /// Pop and execute the next statements if a zero element was popped
    pub const OP_NOTIF: Opcode = Opcode {code: 0x64};
    /// Execute statements if those after the previous OP_IF were not, and vice-versa.
    pub const OP_ELSE: Opcode = Opcode {code: 0x67};
    /// End an if/else block
    pub const OP_ENDIF: Opcode = Opcode {code: 0x68};
    /// Duplicates the top stack item
    pub const OP_DUP: Opcode = Opcode {code: 0x76};
    /// Pushes 1 if the inputs are exactly equal, 0 otherwise
    pub const OP_EQUAL: Opcode = Opcode {code: 0x87};
    /// Returns success if the inputs are exactly equal, failure otherwise
    pub const OP_EQUALVERIFY: Opcode = Opcode {code: 0x88};
    /// Pop the top stack item and push its RIPEMD(SHA256) hash
    pub const OP_HASH160: Opcode = Opcode {code: 0xa9};
    /// Ignore this and everything preceding when deciding what to sign when signature-checking
    pub const OP_CODESEPARATOR: Opcode = Opcode {code: 0xab};
    /// <https://en.bitcoin.it/wiki/OP_CHECKSIG> pushing 1/0 for success/failure
    pub const OP_CHECKSIG: Opcode = Opcode {code: 0xac};
    /// Pop N, N pubkeys, M, M signatures, a dummy (due to bug in reference code), and verify that all M signatures are valid.
    /// Push 1 for "all valid", 0 otherwise
    pub const OP_CHECKMULTISIG: Opcode = Opcode {code: 0xae};
}
