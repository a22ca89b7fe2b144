/*
    This module helps with parsing deriveration paths passed in as strings
    as vectors of ChildOptions that can be used to derive a child key.
*/

use crate::{
    hdwallet::{
        HDWError,
        HARDENED
    }
};
use std::{fmt, str::FromStr};

/**
    A single step in a deriveration path.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOptions {
    Normal(u32),
    Hardened(u32)
}

impl ChildOptions {
    /**
        The BIP32 sequence number, with the high bit set for hardened children.
    */
    pub fn sequence(&self) -> Result<u32, HDWError> {
        match *self {
            ChildOptions::Normal(x) if x < HARDENED => Ok(x),
            ChildOptions::Hardened(x) if x < HARDENED => Ok(x | HARDENED),
            ChildOptions::Normal(x) | ChildOptions::Hardened(x) => Err(HDWError::IndexTooLarge(x))
        }
    }

    pub fn from_sequence(sequence: u32) -> Self {
        if sequence & HARDENED != 0 {
            ChildOptions::Hardened(sequence & !HARDENED)
        } else {
            ChildOptions::Normal(sequence)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub children: Vec<ChildOptions>
}

impl Path {
    pub fn sequences(&self) -> Result<Vec<u32>, HDWError> {
        self.children.iter().map(|c| c.sequence()).collect()
    }
}

impl FromStr for Path {
    type Err = HDWError;

    fn from_str(path: &str) -> Result<Self, HDWError> {
        let mut children = path.split('/');
        if children.next() != Some("m") {
            return Err(HDWError::BadPath(path.to_string()))
        }

        let mut p: Vec<ChildOptions> = vec![];
        for child in children {
            //Hardened children end in ' or h
            let (index, hardened) = match child.strip_suffix('\'').or_else(|| child.strip_suffix('h')) {
                Some(x) => (x, true),
                None => (child, false)
            };

            let index: u32 = match index.parse() {
                Ok(x) => x,
                Err(_) => return Err(HDWError::BadPath(path.to_string()))
            };
            if index >= HARDENED { return Err(HDWError::IndexTooLarge(index)) }

            p.push(if hardened { ChildOptions::Hardened(index) } else { ChildOptions::Normal(index) });
        }

        Ok(Self {
            children: p
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m")?;
        for child in &self.children {
            match child {
                ChildOptions::Normal(x) => write!(f, "/{}", x)?,
                ChildOptions::Hardened(x) => write!(f, "/{}'", x)?
            }
        }
        Ok(())
    }
}
