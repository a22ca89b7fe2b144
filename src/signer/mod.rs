/*
    Input signing engine.

    An input's locking script is broken down into steps. A Checksig step
    collects the signatures (and keys) one signature-checking template
    needs, a Conditional step holds the value an OP_IF consumes and waives
    the Checksig steps on the branch that is not taken. The InputSigner
    owns the steps of one input and drives them: sighash, sign, verify
    and finally serialization into a script sig and witness.
*/

pub mod checksig;
pub mod conditional;
pub mod sign_data;
pub mod input_signer;

pub use checksig::Checksig;
pub use conditional::Conditional;
pub use sign_data::{
    SignData,
    SigValues,
    VerifyFlags
};
pub use input_signer::InputSigner;

use crate::{
    key::KeyError,
    script::{
        ScriptErr,
        ScriptType
    },
    transaction::TxError
};

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("index {index} out of range for {len} keys")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0:?} scripts cannot be signed directly")]
    UnsupportedScriptType(ScriptType),
    #[error("step {0} cannot be used here")]
    InvalidStep(usize),
    #[error("key is not part of this step")]
    KeyNotFound,
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("input is not fully signed")]
    NotFullySigned,
    #[error("script mismatch: {0}")]
    ScriptMismatch(String),
    #[error(transparent)]
    Script(#[from] ScriptErr),
    #[error(transparent)]
    Transaction(#[from] TxError),
    #[error(transparent)]
    Key(#[from] KeyError)
}

/**
    One unit of work for the signer.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Checksig(Checksig),
    Conditional(Conditional)
}

impl Step {
    /**
        Conditional steps never hold up signing.
    */
    pub fn is_fully_signed(&self) -> bool {
        match self {
            Step::Checksig(c) => c.is_fully_signed(),
            Step::Conditional(_) => true
        }
    }

    /**
        Stack items this step contributes to the unlocking data.
    */
    pub fn serialize(&self) -> Result<Vec<Vec<u8>>, SignerError> {
        match self {
            Step::Checksig(c) => Ok(c.serialize()),
            Step::Conditional(c) => c.serialize()
        }
    }

    pub fn as_checksig(&self) -> Option<&Checksig> {
        match self {
            Step::Checksig(c) => Some(c),
            Step::Conditional(_) => None
        }
    }
}

impl From<Checksig> for Step {
    fn from(c: Checksig) -> Self {
        Step::Checksig(c)
    }
}

impl From<Conditional> for Step {
    fn from(c: Conditional) -> Self {
        Step::Conditional(c)
    }
}
