//! Conteneur `.pyc` : en-tête + un code object marshalé.
//!
//! ```text
//! magic u16 LE + "\r\n"
//! flags u32 LE
//! flags & 1 == 0 : mtime u32 + source size u32
//! flags & 1 == 1 : source hash [u8; 8]   (flags & 2 : check_source)
//! marshal(code object)
//! ```

use std::{fs, path::Path, sync::Arc};

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::{profile_for, resolve_version, ByteReader, CoreError, CoreResult, Version};

use crate::{CodeUnit, MarshalValue, Unmarshaller};

/// Header size for every supported generation.
pub const HEADER_LEN: usize = 16;

const FLAG_HASH_BASED: u32 = 0b01;
const FLAG_CHECK_SOURCE: u32 = 0b10;

/// How the pyc records its source dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Invalidation {
    /// Source modification time and size.
    Timestamp {
        /// Seconds since the epoch, truncated to 32 bits.
        mtime: u32,
        /// Source size in bytes, truncated to 32 bits.
        source_size: u32,
    },
    /// SipHash of the source file.
    Hash {
        /// Whether the importer re-validates against the source.
        check_source: bool,
        /// Raw hash bytes.
        hash: [u8; 8],
    },
}

/// Decoded pyc header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PycHeader {
    /// Raw magic number.
    pub magic: u16,
    /// Version resolved from the magic.
    pub version: Version,
    /// Raw flags word.
    pub flags: u32,
    /// Invalidation data.
    pub invalidation: Invalidation,
}

impl PycHeader {
    /// Parse the 16-byte header at the start of `data`.
    pub fn parse(data: &[u8]) -> CoreResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(CoreError::header(format!("need {HEADER_LEN} bytes, got {}", data.len())));
        }
        let version = resolve_version(data)?;
        let mut rd = ByteReader::new(data);
        let magic = rd.read_u16_le()?;
        if rd.read_bytes(2)? != b"\r\n" {
            return Err(CoreError::header("magic number not followed by \\r\\n"));
        }
        let flags = rd.read_u32_le()?;
        let invalidation = if flags & FLAG_HASH_BASED == 0 {
            Invalidation::Timestamp { mtime: rd.read_u32_le()?, source_size: rd.read_u32_le()? }
        } else {
            let mut hash = [0u8; 8];
            hash.copy_from_slice(rd.read_bytes(8)?);
            Invalidation::Hash { check_source: flags & FLAG_CHECK_SOURCE != 0, hash }
        };
        log::debug!("pyc header: magic {magic} -> python {version}, flags {flags:#x}");
        Ok(Self { magic, version, flags, invalidation })
    }
}

/// A whole pyc file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PycFile {
    /// Header.
    pub header: PycHeader,
    /// Top-level code unit.
    pub code: CodeUnit,
}

impl PycFile {
    /// Parse a pyc image held in memory.
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        let header = PycHeader::parse(data)?;
        let profile = profile_for(header.version)?;
        let value = Unmarshaller::new(&data[HEADER_LEN..], profile).read_top_level()?;
        match value {
            MarshalValue::Code(code) => Ok(Self { header, code: Arc::unwrap_or_clone(code) }),
            other => Err(CoreError::malformed(
                "<module>",
                format!("top-level value is {}, not code", other.type_name()),
            )),
        }
    }
}

/// Parse a pyc image and return its top-level code unit.
pub fn load(data: &[u8]) -> CoreResult<CodeUnit> {
    PycFile::from_bytes(data).map(|pyc| pyc.code)
}

/// Read and parse a pyc file from disk.
pub fn load_file(path: impl AsRef<Path>) -> CoreResult<PycFile> {
    let path = path.as_ref();
    log::debug!("loading {}", path.display());
    let data = fs::read(path)?;
    PycFile::from_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(magic: u16, flags: u32, tail: [u8; 8]) -> Vec<u8> {
        let mut out = magic.to_le_bytes().to_vec();
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&tail);
        out
    }

    #[test]
    fn timestamp_header() -> CoreResult<()> {
        let h = PycHeader::parse(&header(3413, 0, [1, 0, 0, 0, 42, 0, 0, 0]))?;
        assert_eq!(h.version, Version::V3_8);
        assert_eq!(h.invalidation, Invalidation::Timestamp { mtime: 1, source_size: 42 });
        Ok(())
    }

    #[test]
    fn hash_header() -> CoreResult<()> {
        let h = PycHeader::parse(&header(3531, 0b11, [9; 8]))?;
        assert_eq!(h.version, Version::V3_12);
        assert_eq!(h.invalidation, Invalidation::Hash { check_source: true, hash: [9; 8] });
        Ok(())
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(PycHeader::parse(&[0x55, 0x0D]), Err(CoreError::InvalidHeader(_))));
        let mut bad = header(3413, 0, [0; 8]);
        bad[2] = b'X';
        assert!(matches!(PycHeader::parse(&bad), Err(CoreError::InvalidHeader(_))));
        assert_eq!(
            PycHeader::parse(&header(2000, 0, [0; 8])),
            Err(CoreError::UnknownMagicNumber { magic: 2000 })
        );
    }

    fn small_str(out: &mut Vec<u8>, s: &str) {
        out.push(b'z');
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }

    fn bytes(out: &mut Vec<u8>, b: &[u8]) {
        out.push(b's');
        out.extend_from_slice(&(b.len() as i32).to_le_bytes());
        out.extend_from_slice(b);
    }

    fn names(out: &mut Vec<u8>, items: &[&str]) {
        out.push(b')');
        out.push(items.len() as u8);
        for item in items {
            small_str(out, item);
        }
    }

    fn ints(out: &mut Vec<u8>, values: &[i32]) {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// `x = 1` as compiled by 3.8.
    fn module_38() -> Vec<u8> {
        let mut out = header(3413, 0, [0; 8]);
        out.push(b'c');
        ints(&mut out, &[0, 0, 0, 0, 1, 0x40]);
        bytes(&mut out, &[100, 0, 90, 0, 100, 1, 83, 0]);
        out.extend_from_slice(b")\x02i\x01\x00\x00\x00N");
        names(&mut out, &["x"]);
        names(&mut out, &[]);
        names(&mut out, &[]);
        names(&mut out, &[]);
        small_str(&mut out, "m.py");
        small_str(&mut out, "<module>");
        ints(&mut out, &[1]);
        bytes(&mut out, &[]);
        out
    }

    /// `def f(a): return a` body as compiled by 3.11.
    fn function_311() -> Vec<u8> {
        let mut out = header(3495, 0, [0; 8]);
        out.push(b'c');
        ints(&mut out, &[1, 0, 0, 1, 0x03]);
        bytes(&mut out, &[151, 0, 124, 0, 83, 0]);
        out.extend_from_slice(b")\x01N");
        names(&mut out, &[]);
        names(&mut out, &["a"]);
        bytes(&mut out, &[0x26]);
        small_str(&mut out, "m.py");
        small_str(&mut out, "f");
        small_str(&mut out, "f");
        ints(&mut out, &[1]);
        bytes(&mut out, &[0x80, 0x00]);
        bytes(&mut out, &[]);
        out
    }

    #[test]
    fn split_layout_code_unit() -> CoreResult<()> {
        let code = load(&module_38())?;
        assert_eq!(code.version, Version::V3_8);
        assert_eq!(&*code.name, "<module>");
        assert_eq!(code.names, [Arc::<str>::from("x")]);
        assert_eq!(*code.consts, [MarshalValue::Int(1), MarshalValue::None]);
        assert_eq!(*code.code, [100, 0, 90, 0, 100, 1, 83, 0]);
        assert_eq!(code.first_line, 1);
        assert!(code.flags.contains(crate::CodeFlags::NOFREE));
        assert!(code.qualname.is_none());
        assert!(code.exceptiontable.is_empty());
        Ok(())
    }

    #[test]
    fn unified_layout_code_unit() -> CoreResult<()> {
        let code = load(&function_311())?;
        assert_eq!(code.version, Version::V3_11);
        assert_eq!(code.qualname.as_deref(), Some("f"));
        assert_eq!(code.varnames(), ["a"]);
        assert_eq!(code.nlocals, 1);
        assert_eq!(*code.linetable, [0x80, 0x00]);
        assert!(code.flags.contains(crate::CodeFlags::OPTIMIZED | crate::CodeFlags::NEWLOCALS));
        Ok(())
    }

    #[test]
    fn load_file_reads_from_disk() -> CoreResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("m.cpython-38.pyc");
        fs::write(&path, module_38())?;
        let pyc = load_file(&path)?;
        assert_eq!(pyc.header.magic, 3413);
        assert_eq!(&*pyc.code.filename, "m.py");
        assert!(matches!(load_file(dir.path().join("missing.pyc")), Err(CoreError::Io(_))));
        Ok(())
    }

    #[test]
    fn trailing_bytes_after_code() {
        let mut data = module_38();
        data.push(b'N');
        assert_eq!(load(&data), Err(CoreError::MarshalTrailingData { remaining: 1 }));
    }

    #[test]
    fn top_level_must_be_code() {
        let mut data = header(3425, 0, [0; 8]);
        data.push(b'N');
        assert!(matches!(load(&data), Err(CoreError::MalformedCode { .. })));
    }
}
