/*
    Decodes hex strings into a byte vector
*/
pub fn decode_02x(hex: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(hex)
}

/*
    Encodes byte slices into hex string
*/
pub fn encode_02x(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Network {
    Bitcoin,
    Testnet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_helpers() {
        assert_eq!(encode_02x(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(decode_02x("00AB10").unwrap(), vec![0x00, 0xab, 0x10]);
        assert!(decode_02x("0g").is_err());
        assert!(decode_02x("abc").is_err());
    }
}
