//! Lecteur séquentiel little-endian sur un slice d’octets.

use byteorder::{ByteOrder, LittleEndian};

use crate::{CoreError, CoreResult};

/// Sequential reader over a byte slice (little-endian helpers).
///
/// Every read is bounds-checked and fails with
/// [`CoreError::MarshalTruncated`] instead of panicking.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, off: 0 }
    }

    /// Offset courant.
    pub fn offset(&self) -> usize {
        self.off
    }

    /// Taille restante.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.off)
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Lit `n` octets (ou erreur si EOF).
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::MarshalTruncated { needed: n as u64, at: self.off as u64 });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un octet.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Lit un u16 LE.
    pub fn read_u16_le(&mut self) -> CoreResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// Lit un u32 LE.
    pub fn read_u32_le(&mut self) -> CoreResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Lit un i32 LE (complément à deux).
    pub fn read_i32_le(&mut self) -> CoreResult<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    /// Lit un i64 LE (complément à deux).
    pub fn read_i64_le(&mut self) -> CoreResult<i64> {
        Ok(LittleEndian::read_i64(self.read_bytes(8)?))
    }

    /// Lit un f64 LE.
    pub fn read_f64_le(&mut self) -> CoreResult<f64> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }
}
