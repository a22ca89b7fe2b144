/*
    Per input configuration for the signer and the unlocking data it produces.
*/

use crate::{
    script::Script,
    transaction::TxIn
};
use std::ops::BitOr;

/**
    Script verification flags, same bit positions as the reference client.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyFlags(pub u32);

impl VerifyFlags {
    pub const NONE: VerifyFlags = VerifyFlags(0);
    pub const P2SH: VerifyFlags = VerifyFlags(1 << 0);
    pub const LOW_S: VerifyFlags = VerifyFlags(1 << 3);
    pub const WITNESS: VerifyFlags = VerifyFlags(1 << 11);

    /// Flags used when verify is not given any
    pub fn standard() -> Self {
        Self::P2SH | Self::LOW_S | Self::WITNESS
    }

    pub fn has_flag(self, flag: VerifyFlags) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for VerifyFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        VerifyFlags(self.0 | rhs.0)
    }
}

impl Default for VerifyFlags {
    fn default() -> Self {
        Self::standard()
    }
}

/**
    What the signer cannot learn from the spent output alone.
*/
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignData {
    /// Script behind a P2SH output
    pub redeem_script: Option<Script>,
    /// Script behind a P2WSH program
    pub witness_script: Option<Script>,
    /// Branch to take in an IF/ELSE script, true for the IF side
    pub logical_path: Option<bool>,
    pub flags: Option<VerifyFlags>
}

impl SignData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redeem_script(mut self, script: Script) -> Self {
        self.redeem_script = Some(script);
        self
    }

    pub fn witness_script(mut self, script: Script) -> Self {
        self.witness_script = Some(script);
        self
    }

    pub fn logical_path(mut self, path: bool) -> Self {
        self.logical_path = Some(path);
        self
    }

    pub fn flags(mut self, flags: VerifyFlags) -> Self {
        self.flags = Some(flags);
        self
    }
}

/**
    Unlocking data for one input.
*/
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SigValues {
    pub script_sig: Script,
    pub witness: Vec<Vec<u8>>
}

impl SigValues {
    /**
        Overwrite the input's script sig and witness.
    */
    pub fn apply_to(&self, input: &mut TxIn) {
        input.script_sig = self.script_sig.clone();
        input.witness = self.witness.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::OutPoint;

    #[test]
    fn flags() {
        let flags = VerifyFlags::standard();
        assert!(flags.has_flag(VerifyFlags::LOW_S));
        assert!(flags.has_flag(VerifyFlags::P2SH | VerifyFlags::WITNESS));
        assert!(!VerifyFlags::P2SH.has_flag(VerifyFlags::LOW_S));
        assert!(VerifyFlags::NONE.has_flag(VerifyFlags::NONE));
        assert_eq!(VerifyFlags::default(), flags);
        assert_eq!(flags, VerifyFlags(1 | 1 << 3 | 1 << 11));
    }

    #[test]
    fn sign_data_builder() {
        let data = SignData::new()
            .redeem_script(Script::new(vec![0x51]))
            .logical_path(false);
        assert_eq!(data.redeem_script, Some(Script::new(vec![0x51])));
        assert_eq!(data.logical_path, Some(false));
        assert!(data.witness_script.is_none());
        assert!(data.flags.is_none());
    }

    #[test]
    fn apply_to_input() {
        let mut input = TxIn::new(OutPoint::default());
        input.witness = vec![vec![0xff]];

        let values = SigValues {
            script_sig: Script::new(vec![0x00]),
            witness: vec![]
        };
        values.apply_to(&mut input);
        assert_eq!(input.script_sig, Script::new(vec![0x00]));
        assert!(input.witness.is_empty());
    }
}
