/*
    Module that bundles together the binary encodings shared by keys,
    scripts and transactions.
*/

pub mod version_prefix;
pub mod parser;
pub use version_prefix::{
    VersionPrefix,
    NetworkConfig
};
pub use parser::{
    Parser,
    ParserOutOfRange
};
