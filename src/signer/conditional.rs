use crate::signer::{
    Checksig,
    SignerError
};

/**
    The value pushed for an OP_IF, and the Checksig steps
    (by step index) that only run when it is true.
*/
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conditional {
    value: Option<bool>,
    guards: Vec<usize>
}

impl Conditional {
    pub fn new(guards: Vec<usize>) -> Self {
        Self {
            value: None,
            guards
        }
    }

    pub fn with_value(value: bool, guards: Vec<usize>) -> Self {
        Self {
            value: Some(value),
            guards
        }
    }

    /**
        The branch outcome can only be decided once.
    */
    pub fn set_value(&mut self, value: bool) -> Result<(), SignerError> {
        if self.value.is_some() {
            return Err(SignerError::PreconditionViolation("conditional already has a value".to_string()))
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<bool> {
        self.value
    }

    /// Step indices of the Checksig steps this branch guards
    pub fn guards(&self) -> &[usize] {
        &self.guards
    }

    /**
        Apply the branch outcome to a guarded Checksig.
        A false value waives its signature requirement, true leaves it alone.
    */
    pub fn receives_value(&self, target: &mut Checksig) -> Result<(), SignerError> {
        match self.value {
            Some(false) => target.set_required(false),
            Some(true) => {},
            None => return Err(SignerError::PreconditionViolation("conditional has no value".to_string()))
        }
        Ok(())
    }

    /**
        A single stack item: [0x01] for true, empty for false.
    */
    pub fn serialize(&self) -> Result<Vec<Vec<u8>>, SignerError> {
        match self.value {
            Some(true) => Ok(vec![vec![0x01]]),
            Some(false) => Ok(vec![vec![]]),
            None => Err(SignerError::PreconditionViolation("conditional has no value".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::{
            PrivKey,
            PubKey
        },
        script::Script
    };

    fn checksig() -> Checksig {
        let key = PubKey::from_priv_key(&PrivKey::from_slice(&[0x09; 32]).unwrap());
        Checksig::from_script(&Script::p2pk(&key)).unwrap()
    }

    #[test]
    fn false_waives_the_guarded_step() {
        let mut c = checksig();
        assert!(!c.is_fully_signed());

        Conditional::with_value(false, vec![0]).receives_value(&mut c).unwrap();
        assert!(!c.is_required());
        assert!(c.is_fully_signed());
        assert_eq!(c.signature_count(), 0);
    }

    #[test]
    fn true_keeps_the_requirement() {
        let mut c = checksig();
        Conditional::with_value(true, vec![0]).receives_value(&mut c).unwrap();
        assert!(c.is_required());
        assert!(!c.is_fully_signed());
    }

    #[test]
    fn value_must_be_set_first() {
        let mut c = checksig();
        let mut cond = Conditional::new(vec![0]);
        assert!(matches!(cond.receives_value(&mut c), Err(SignerError::PreconditionViolation(_))));
        assert!(cond.serialize().is_err());

        cond.set_value(true).unwrap();
        assert!(matches!(cond.set_value(false), Err(SignerError::PreconditionViolation(_))));
        assert_eq!(cond.value(), Some(true));
        assert_eq!(cond.serialize().unwrap(), vec![vec![0x01]]);
        assert_eq!(Conditional::with_value(false, vec![]).serialize().unwrap(), vec![Vec::<u8>::new()]);
    }
}
