//! Fail-closed byte cursor
//!
//! All record parsing goes through this reader: every read states how
//! many bytes it needs and fails with MalformedInput on underrun, so a
//! truncated stream can never decode into a shorter-but-plausible batch.

use alloy_primitives::{Address, B256, U256};
use tideclear_types::{Result, SettlementError};

/// Cursor over an input byte stream
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether the whole stream has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Take exactly `n` bytes, advancing the cursor
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(SettlementError::MalformedInput {
                reason: format!(
                    "stream exhausted: needed {n} bytes at offset {}, {} remain",
                    self.pos,
                    self.remaining()
                ),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a single byte
    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian u16
    pub fn u16_be(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32
    pub fn u32_be(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a 32-byte big-endian unsigned integer
    pub fn u256(&mut self) -> Result<U256> {
        let bytes = self.take(32)?;
        Ok(U256::from_be_slice(bytes))
    }

    /// Read a 20-byte address
    pub fn address(&mut self) -> Result<Address> {
        Ok(Address::from_slice(self.take(20)?))
    }

    /// Read a 32-byte word
    pub fn b256(&mut self) -> Result<B256> {
        Ok(B256::from_slice(self.take(32)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance_in_order() {
        let mut buf = vec![0u8; 2];
        buf[1] = 0x07;
        buf.extend_from_slice(&[0xaa; 20]);
        buf.push(0xff);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.u16_be().unwrap(), 7);
        assert_eq!(reader.address().unwrap(), Address::repeat_byte(0xaa));
        assert_eq!(reader.byte().unwrap(), 0xff);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_underrun_fails_closed() {
        let buf = [0u8; 3];
        let mut reader = ByteReader::new(&buf);
        let err = reader.u32_be().unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_INPUT");
        // A failed read consumes nothing
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_u256_big_endian() {
        let mut buf = [0u8; 32];
        buf[30] = 0x01;
        buf[31] = 0x02;
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.u256().unwrap(), U256::from(0x0102u64));
    }
}
