/*
    Script classifier.

    Recognises the standard output templates and, for the ones a
    signature can satisfy directly, extracts what the signer needs
    to know about them (keys, key hash, threshold).
*/

use crate::{
    key::PubKey,
    script::{
        Instruction,
        Opcode,
        Script,
        ScriptErr,
        opcodes
    }
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    P2PK,
    P2PKH,
    Multisig,
    P2SH,
    P2WPKH,
    P2WSH,
    NonStandard
}

impl ScriptType {
    /**
        Classify a script by its byte pattern.
    */
    pub fn classify(script: &Script) -> Self {
        let code = script.as_bytes();
        match code.len() {
            25 if code[0] == 0x76 && code[1] == 0xa9 && code[2] == 0x14 && code[23] == 0x88 && code[24] == 0xac => ScriptType::P2PKH,
            23 if code[0] == 0xa9 && code[1] == 0x14 && code[22] == 0x87 => ScriptType::P2SH,
            22 if code[0] == 0x00 && code[1] == 0x14 => ScriptType::P2WPKH,
            34 if code[0] == 0x00 && code[1] == 0x20 => ScriptType::P2WSH,
            35 if code[0] == 0x21 && code[34] == 0xac => ScriptType::P2PK,
            67 if code[0] == 0x41 && code[66] == 0xac => ScriptType::P2PK,
            _ if ScriptInfo::parse_multisig(script).is_ok() => ScriptType::Multisig,
            _ => ScriptType::NonStandard
        }
    }
}

/**
    What a signature-checking script is waiting for.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptInfo {
    PayToPubkey {
        key: PubKey
    },
    PayToPubkeyHash {
        hash: [u8; 20]
    },
    Multisig {
        required: usize,
        keys: Vec<PubKey>
    }
}

impl ScriptInfo {
    /**
        Decode a P2PK, P2PKH or multisig script. Anything else,
        including the wrapping templates, is NonStandardScript.
    */
    pub fn from_script(script: &Script) -> Result<Self, ScriptErr> {
        let code = script.as_bytes();
        match ScriptType::classify(script) {
            ScriptType::P2PK => {
                let key = match PubKey::from_slice(&code[1..code.len() - 1]) {
                    Ok(x) => x,
                    Err(_) => return Err(ScriptErr::NonStandardScript)
                };
                Ok(ScriptInfo::PayToPubkey { key })
            },
            ScriptType::P2PKH => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&code[3..23]);
                Ok(ScriptInfo::PayToPubkeyHash { hash })
            },
            ScriptType::Multisig => Self::parse_multisig(script),
            _ => Err(ScriptErr::NonStandardScript)
        }
    }

    // OP_m <key 1> ... <key n> OP_n OP_CHECKMULTISIG
    fn parse_multisig(script: &Script) -> Result<Self, ScriptErr> {
        let instructions: Vec<Instruction> = script.instructions().collect::<Result<_, _>>()?;
        if instructions.len() < 4 { return Err(ScriptErr::NonStandardScript) }

        let small_int = |i: &Instruction| -> Option<u8> {
            match i {
                Instruction::Op(op) => op.small_int(),
                _ => None
            }
        };
        let last = instructions.len() - 1;
        let (m, n) = match (small_int(&instructions[0]), small_int(&instructions[last - 1])) {
            (Some(m), Some(n)) => (m as usize, n as usize),
            _ => return Err(ScriptErr::NonStandardScript)
        };
        if instructions[last] != Instruction::Op(opcodes::OP_CHECKMULTISIG) {
            return Err(ScriptErr::NonStandardScript)
        }

        let mut keys: Vec<PubKey> = vec![];
        for i in &instructions[1..last - 1] {
            match i {
                Instruction::Push(data) if data.len() == 33 || data.len() == 65 => match PubKey::from_slice(data) {
                    Ok(k) => keys.push(k),
                    Err(_) => return Err(ScriptErr::NonStandardScript)
                },
                _ => return Err(ScriptErr::NonStandardScript)
            }
        }
        if keys.len() != n || m > n {
            return Err(ScriptErr::KeyCountDoesNotMatch { required: m, keys: keys.len() })
        }

        Ok(ScriptInfo::Multisig { required: m, keys })
    }

    pub fn script_type(&self) -> ScriptType {
        match self {
            ScriptInfo::PayToPubkey { .. } => ScriptType::P2PK,
            ScriptInfo::PayToPubkeyHash { .. } => ScriptType::P2PKH,
            ScriptInfo::Multisig { .. } => ScriptType::Multisig
        }
    }

    pub fn required_sig_count(&self) -> usize {
        match self {
            ScriptInfo::Multisig { required, .. } => *required,
            _ => 1
        }
    }

    pub fn key_count(&self) -> usize {
        match self {
            ScriptInfo::Multisig { keys, .. } => keys.len(),
            _ => 1
        }
    }

    /**
        Keys written into the script itself. Empty for P2PKH,
        where the key is only revealed when spending.
    */
    pub fn keys(&self) -> Vec<PubKey> {
        match self {
            ScriptInfo::PayToPubkey { key } => vec![*key],
            ScriptInfo::PayToPubkeyHash { .. } => vec![],
            ScriptInfo::Multisig { keys, .. } => keys.clone()
        }
    }
}

/**
    The two sides of an `OP_IF <if_branch> OP_ELSE <else_branch> OP_ENDIF` script.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branches {
    pub if_branch: Script,
    pub else_branch: Script
}

impl Branches {
    /**
        Split a script made of exactly one IF/ELSE/ENDIF block.
        Returns None for scripts of any other shape, including nested branches.
    */
    pub fn split(script: &Script) -> Option<Self> {
        let is_op = |i: &Instruction, op: Opcode| *i == Instruction::Op(op);

        let mut iter = script.instructions();
        match iter.next() {
            Some(Ok(i)) if is_op(&i, opcodes::OP_IF) => {},
            _ => return None
        }

        let if_start = iter.position();
        let mut else_at: Option<usize> = None;
        let mut endif_at: Option<usize> = None;
        loop {
            let at = iter.position();
            let i = match iter.next() {
                Some(Ok(i)) => i,
                Some(Err(_)) => return None,
                None => break
            };
            if endif_at.is_some() { return None }

            if is_op(&i, opcodes::OP_IF) || is_op(&i, opcodes::OP_NOTIF) {
                return None
            } else if is_op(&i, opcodes::OP_ELSE) {
                if else_at.is_some() { return None }
                else_at = Some(at);
            } else if is_op(&i, opcodes::OP_ENDIF) {
                endif_at = Some(at);
            }
        }

        let code = script.as_bytes();
        match (else_at, endif_at) {
            (Some(e), Some(end)) => Some(Self {
                if_branch: Script::new(code[if_start..e].to_vec()),
                else_branch: Script::new(code[e + 1..end].to_vec())
            }),
            _ => None
        }
    }

    pub fn branch(&self, logical_path: bool) -> &Script {
        if logical_path { &self.if_branch } else { &self.else_branch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::PrivKey,
        script::ScriptBuilder
    };

    fn key(b: u8) -> PubKey {
        PubKey::from_priv_key(&PrivKey::from_slice(&[b; 32]).unwrap())
    }

    #[test]
    fn classify_templates() {
        let ms = Script::multisig(2, &[key(1), key(2), key(3)]).unwrap();
        assert_eq!(ScriptType::classify(&Script::p2pk(&key(1))), ScriptType::P2PK);
        assert_eq!(ScriptType::classify(&Script::p2pkh(&key(1).hash160())), ScriptType::P2PKH);
        assert_eq!(ScriptType::classify(&ms), ScriptType::Multisig);
        assert_eq!(ScriptType::classify(&Script::p2sh(&ms)), ScriptType::P2SH);
        assert_eq!(ScriptType::classify(&Script::p2wpkh(&key(1).hash160())), ScriptType::P2WPKH);
        assert_eq!(ScriptType::classify(&Script::p2wsh(&ms)), ScriptType::P2WSH);
        assert_eq!(ScriptType::classify(&Script::new(vec![0x6a, 0x01, 0x00])), ScriptType::NonStandard);
        assert_eq!(ScriptType::classify(&Script::default()), ScriptType::NonStandard);
    }

    #[test]
    fn script_info() {
        let info = ScriptInfo::from_script(&Script::p2pk(&key(4))).unwrap();
        assert_eq!(info, ScriptInfo::PayToPubkey { key: key(4) });
        assert_eq!((info.required_sig_count(), info.key_count()), (1, 1));

        let info = ScriptInfo::from_script(&Script::p2pkh(&key(4).hash160())).unwrap();
        assert_eq!(info, ScriptInfo::PayToPubkeyHash { hash: key(4).hash160() });
        assert!(info.keys().is_empty());

        let keys = vec![key(1), key(2), key(3)];
        let info = ScriptInfo::from_script(&Script::multisig(2, &keys).unwrap()).unwrap();
        assert_eq!(info.script_type(), ScriptType::Multisig);
        assert_eq!((info.required_sig_count(), info.key_count()), (2, 3));
        assert_eq!(info.keys(), keys);
    }

    #[test]
    fn wrappers_have_no_info() {
        let ms = Script::multisig(1, &[key(1)]).unwrap();
        assert_eq!(ScriptInfo::from_script(&Script::p2sh(&ms)), Err(ScriptErr::NonStandardScript));
        assert_eq!(ScriptInfo::from_script(&Script::p2wsh(&ms)), Err(ScriptErr::NonStandardScript));
    }

    #[test]
    fn bad_multisig_shapes() {
        //OP_3 <k1> <k2> OP_2 OP_CHECKMULTISIG
        let script = ScriptBuilder::new()
            .push_int(3)
            .push_slice(&key(1).as_bytes())
            .push_slice(&key(2).as_bytes())
            .push_int(2)
            .push_opcode(opcodes::OP_CHECKMULTISIG)
            .into_script();
        assert_eq!(ScriptType::classify(&script), ScriptType::NonStandard);
        assert!(ScriptInfo::from_script(&script).is_err());

        //Key count does not match n
        let script = ScriptBuilder::new()
            .push_int(1)
            .push_slice(&key(1).as_bytes())
            .push_int(2)
            .push_opcode(opcodes::OP_CHECKMULTISIG)
            .into_script();
        assert_eq!(ScriptType::classify(&script), ScriptType::NonStandard);
    }

    #[test]
    fn split_branches() {
        let a = Script::p2pk(&key(1));
        let b = Script::multisig(1, &[key(2), key(3)]).unwrap();
        let mut code = vec![opcodes::OP_IF.into_u8()];
        code.extend_from_slice(&a.code);
        code.push(opcodes::OP_ELSE.into_u8());
        code.extend_from_slice(&b.code);
        code.push(opcodes::OP_ENDIF.into_u8());

        let branches = Branches::split(&Script::new(code.clone())).unwrap();
        assert_eq!(branches.if_branch, a);
        assert_eq!(branches.else_branch, b);
        assert_eq!(branches.branch(true), &a);
        assert_eq!(branches.branch(false), &b);

        //Anything after ENDIF
        code.push(opcodes::OP_CHECKSIG.into_u8());
        assert!(Branches::split(&Script::new(code)).is_none());
        //No branch at all
        assert!(Branches::split(&a).is_none());
        //Missing ELSE
        assert!(Branches::split(&Script::new(vec![0x63, 0x51, 0x68])).is_none());
    }
}
