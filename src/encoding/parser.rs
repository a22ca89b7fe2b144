/*
    Streaming byte cursor. Every read either returns exactly the
    requested number of bytes or fails without moving the cursor.
*/

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parser out of range: wanted {requested} bytes at offset {position}, {available} left")]
pub struct ParserOutOfRange {
    pub requested: usize,
    pub position: usize,
    pub available: usize
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /**
        Reads the next n bytes.
    */
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParserOutOfRange> {
        if n > self.remaining() {
            return Err(ParserOutOfRange {
                requested: n,
                position: self.position,
                available: self.remaining()
            })
        }

        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    /**
        Reads the next N bytes into a fixed size array.
    */
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParserOutOfRange> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParserOutOfRange> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ParserOutOfRange> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, ParserOutOfRange> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ParserOutOfRange> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, ParserOutOfRange> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /**
        Bitcoin CompactSize integer
    */
    pub fn read_varint(&mut self) -> Result<u64, ParserOutOfRange> {
        let start = self.position;
        let value = match self.read_u8()? {
            0xfd => self.read_u16_le().map(u64::from),
            0xfe => self.read_u32_le().map(u64::from),
            0xff => self.read_u64_le(),
            x => Ok(x as u64)
        };
        if value.is_err() {
            self.position = start;
        }
        value
    }

    /**
        Reads a varint length prefix followed by that many bytes.
    */
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], ParserOutOfRange> {
        let start = self.position;
        let len = self.read_varint()?;
        let bytes = self.read_bytes(len as usize);
        if bytes.is_err() {
            self.position = start;
        }
        bytes
    }
}

/**
    Appends a Bitcoin CompactSize integer
*/
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/**
    Appends a varint length prefix followed by the bytes
*/
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_order() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x02, 0xaa, 0xbb];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_u32_le().unwrap(), 1);
        assert_eq!(parser.read_u8().unwrap(), 2);
        assert_eq!(parser.read_bytes(2).unwrap(), &[0xaa, 0xbb]);
        assert!(parser.is_empty());
    }

    #[test]
    fn short_reads_fail_without_consuming() {
        let data = [0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data);
        let err = parser.read_bytes(4).unwrap_err();
        assert_eq!(err, ParserOutOfRange { requested: 4, position: 0, available: 3 });
        assert_eq!(parser.position(), 0);
        assert_eq!(parser.read_array::<3>().unwrap(), [0x01, 0x02, 0x03]);
    }

    #[test]
    fn varints() {
        for n in [0u64, 0xfc, 0xfd, 0xffff, 0x10000, 0xffff_ffff, 0x1_0000_0000].iter() {
            let mut out = vec![];
            write_varint(&mut out, *n);
            let mut parser = Parser::new(&out);
            assert_eq!(parser.read_varint().unwrap(), *n);
            assert!(parser.is_empty());
        }

        //Truncated 0xfd prefix
        let mut parser = Parser::new(&[0xfd, 0x01]);
        assert!(parser.read_varint().is_err());
        assert_eq!(parser.position(), 0);
    }
}
