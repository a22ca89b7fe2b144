use crate::{
    util::Network
};

/**
    BIP-32 version bytes for extended keys.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPrefix {
    Xprv = 0x0488ADE4,
    Xpub = 0x0488B21E,
    Tprv = 0x04358394,
    Tpub = 0x043587CF
}

impl VersionPrefix {
    pub fn to_bytes(&self) -> [u8; 4] {
        (*self as u32).to_be_bytes()
    }
}

/**
    Network parameters needed to serialize extended keys.

    Either byte may be missing, for networks that have no HD prefixes
    assigned. Serializers check for both when they are built.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub hd_private: Option<[u8; 4]>,
    pub hd_public: Option<[u8; 4]>
}

impl NetworkConfig {
    pub fn new(hd_private: Option<[u8; 4]>, hd_public: Option<[u8; 4]>) -> Self {
        Self {
            hd_private,
            hd_public
        }
    }

    /**
        Builds a config from a private/public pair of known prefixes
    */
    pub fn from_prefixes(private: VersionPrefix, public: VersionPrefix) -> Self {
        Self::new(Some(private.to_bytes()), Some(public.to_bytes()))
    }

    /// xprv / xpub
    pub fn bitcoin() -> Self {
        Self::from_prefixes(VersionPrefix::Xprv, VersionPrefix::Xpub)
    }

    /// tprv / tpub
    pub fn testnet() -> Self {
        Self::from_prefixes(VersionPrefix::Tprv, VersionPrefix::Tpub)
    }

    pub fn from_network(network: Network) -> Self {
        match network {
            Network::Bitcoin => Self::bitcoin(),
            Network::Testnet => Self::testnet()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_bytes() {
        assert_eq!(VersionPrefix::Xprv.to_bytes(), [0x04, 0x88, 0xAD, 0xE4]);
        assert_eq!(VersionPrefix::Tpub.to_bytes(), [0x04, 0x35, 0x87, 0xCF]);
        assert_eq!(VersionPrefix::Tprv.to_bytes(), [0x04, 0x35, 0x83, 0x94]);
    }

    #[test]
    fn network_presets() {
        let config = NetworkConfig::from_network(Network::Testnet);
        assert_eq!(config.hd_private, Some(VersionPrefix::Tprv.to_bytes()));
        assert_eq!(config.hd_public, Some(VersionPrefix::Tpub.to_bytes()));
        assert_eq!(NetworkConfig::from_network(Network::Bitcoin), NetworkConfig::bitcoin());
    }
}
