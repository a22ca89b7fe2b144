/*
    This module contains the default imports for the library.

    Import the library using:
        use btc_inputsigner::prelude::*;
    to quickly import the essential parts of the library.
*/

pub use crate::{

    key::{
        PubKey,
        PrivKey,
        KeyError
    },

    ecdsa::{
        EcAdapter,
        Secp256k1Adapter,
        Signature
    },

    hdwallet::{
        HierarchicalKey,
        HdKey,
        ChildOptions,
        Path,
        HDWError,
        HARDENED,
        ExtendedKeySerializer,
        Base58ExtendedKeySerializer
    },

    encoding::{
        VersionPrefix,
        NetworkConfig,
        Parser
    },

    script::{
        Script,
        ScriptBuilder,
        ScriptErr,
        ScriptInfo,
        ScriptType
    },

    transaction::{
        OutPoint,
        SigHashType,
        Transaction,
        TransactionSignature,
        TxError,
        TxIn,
        TxOut
    },

    signer::{
        Checksig,
        Conditional,
        InputSigner,
        SignData,
        SignerError,
        SigValues,
        Step,
        VerifyFlags
    },

    util::{
        encode_02x,
        decode_02x,
        Network
    }

};
