//! Little-endian primitives shared by the header and segment payloads.

use types::Reg;

use crate::error::SaveError;

#[derive(Debug, Default)]
pub struct Writer {
    out: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }

    pub fn u8(&mut self, value: u8) {
        self.out.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u64(&mut self, value: u64) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    /// Segment then offset; integers carry segment 0.
    pub fn reg(&mut self, reg: Reg) {
        let (segment, offset) = reg.to_raw();
        self.u16(segment);
        self.u16(offset);
    }

    pub fn regs(&mut self, regs: &[Reg]) {
        self.u16(regs.len() as u16);
        for &reg in regs {
            self.reg(reg);
        }
    }

    /// u16 length prefix; callers keep these short (names, small buffers).
    pub fn short_bytes(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(u16::MAX as usize);
        self.u16(len as u16);
        self.out.extend_from_slice(&bytes[..len]);
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.out.extend_from_slice(bytes);
    }

    pub fn string(&mut self, value: &str) {
        self.short_bytes(value.as_bytes());
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }
}

#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], SaveError> {
        if len > self.remaining() {
            return Err(SaveError::Truncated { offset: self.data.len(), what });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn u8(&mut self, what: &'static str) -> Result<u8, SaveError> {
        Ok(self.take(1, what)?[0])
    }

    pub fn u16(&mut self, what: &'static str) -> Result<u16, SaveError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32, SaveError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn u64(&mut self, what: &'static str) -> Result<u64, SaveError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn reg(&mut self, what: &'static str) -> Result<Reg, SaveError> {
        let segment = self.u16(what)?;
        let offset = self.u16(what)?;
        Ok(Reg::from_raw(segment, offset))
    }

    pub fn regs(&mut self, what: &'static str) -> Result<Vec<Reg>, SaveError> {
        let count = self.u16(what)?;
        (0..count).map(|_| self.reg(what)).collect()
    }

    pub fn short_bytes(&mut self, what: &'static str) -> Result<Vec<u8>, SaveError> {
        let len = self.u16(what)? as usize;
        Ok(self.take(len, what)?.to_vec())
    }

    pub fn bytes(&mut self, what: &'static str) -> Result<Vec<u8>, SaveError> {
        let len = self.u32(what)? as usize;
        Ok(self.take(len, what)?.to_vec())
    }

    pub fn string(&mut self, what: &'static str) -> Result<String, SaveError> {
        let at = self.pos;
        let bytes = self.short_bytes(what)?;
        String::from_utf8(bytes).map_err(|_| SaveError::Malformed {
            offset: at,
            reason: format!("{} is not valid UTF-8", what),
        })
    }

    pub fn malformed(&self, reason: impl Into<String>) -> SaveError {
        SaveError::Malformed { offset: self.pos, reason: reason.into() }
    }
}
