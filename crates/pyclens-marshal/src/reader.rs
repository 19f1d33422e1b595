//! Lecteur marshal récursif.
//!
//! Every value starts with a one-byte tag. When bit 7 (`FLAG_REF`) is set the
//! value owns a slot in the reference table; the slot is reserved when the tag
//! is read, before any child, so indices match the writer's numbering. Lists,
//! dicts and sets are visible through their slot while they are being filled
//! (a backreference yields [`MarshalValue::Ref`]); other values only once
//! complete.
//!
//! Finished values stay in the slot arena; a backreference clones the
//! [`MarshalValue`] handle, which shares every heap payload with the slot.

use std::sync::Arc;

use num_bigint::{BigInt, BigUint, Sign};

use pyclens_core::{profile_for, ByteReader, CodeLayout, CoreError, CoreResult, Version, VersionProfile};

use crate::code::{local_kind, CodeFlags, CodeUnit, LocalsLayout};
use crate::value::{MarshalValue, Text};

/* ─────────────────────────── Tags ─────────────────────────── */

const FLAG_REF: u8 = 0x80;

const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_STOPITER: u8 = b'S';
const TYPE_ELLIPSIS: u8 = b'.';
const TYPE_INT: u8 = b'i';
const TYPE_INT64: u8 = b'I';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BINARY_FLOAT: u8 = b'g';
const TYPE_COMPLEX: u8 = b'x';
const TYPE_BINARY_COMPLEX: u8 = b'y';
const TYPE_LONG: u8 = b'l';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_REF: u8 = b'r';
const TYPE_STRINGREF: u8 = b'R';
const TYPE_TUPLE: u8 = b'(';
const TYPE_LIST: u8 = b'[';
const TYPE_DICT: u8 = b'{';
const TYPE_CODE: u8 = b'c';
const TYPE_UNICODE: u8 = b'u';
const TYPE_SET: u8 = b'<';
const TYPE_FROZENSET: u8 = b'>';
const TYPE_ASCII: u8 = b'a';
const TYPE_ASCII_INTERNED: u8 = b'A';
const TYPE_SMALL_TUPLE: u8 = b')';
const TYPE_SHORT_ASCII: u8 = b'z';
const TYPE_SHORT_ASCII_INTERNED: u8 = b'Z';

/// Same bound as the reference interpreter's reader.
const MAX_DEPTH: usize = 2000;

const LONG_SHIFT: u32 = 15;
const LONG_DIGIT_MASK: u16 = (1 << LONG_SHIFT) - 1;

#[derive(Debug)]
enum Slot {
    /// Reserved, value not built yet.
    Pending,
    /// Mutable container currently receiving its elements.
    Filling,
    Ready(MarshalValue),
}

/// Stateful reader over one marshal stream.
#[derive(Debug)]
pub struct Unmarshaller<'a> {
    rd: ByteReader<'a>,
    profile: &'static VersionProfile,
    refs: Vec<Slot>,
    interned: Vec<Arc<str>>,
    depth: usize,
}

impl<'a> Unmarshaller<'a> {
    /// Reader for `data`, decoding code units with `profile`'s layout.
    pub fn new(data: &'a [u8], profile: &'static VersionProfile) -> Self {
        Self { rd: ByteReader::new(data), profile, refs: Vec::new(), interned: Vec::new(), depth: 0 }
    }

    /// Reader for `data` using the profile of `version`.
    pub fn for_version(data: &'a [u8], version: Version) -> CoreResult<Self> {
        Ok(Self::new(data, profile_for(version)?))
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.rd.offset()
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rd.remaining()
    }

    /// Number of reference slots reserved so far.
    pub fn reference_count(&self) -> usize {
        self.refs.len()
    }

    /// Read one complete value. A null tag is a format error here.
    pub fn read_object(&mut self) -> CoreResult<MarshalValue> {
        let at = self.rd.offset() as u64;
        self.read_optional()?.ok_or(CoreError::MarshalFormat { tag: TYPE_NULL, at })
    }

    /// Read the single top-level value and reject trailing bytes.
    pub fn read_top_level(&mut self) -> CoreResult<MarshalValue> {
        let value = self.read_object()?;
        match self.rd.remaining() {
            0 => Ok(value),
            remaining => Err(CoreError::MarshalTrailingData { remaining: remaining as u64 }),
        }
    }

    fn read_optional(&mut self) -> CoreResult<Option<MarshalValue>> {
        if self.depth >= MAX_DEPTH {
            return Err(CoreError::RecursionLimit { limit: MAX_DEPTH, at: self.rd.offset() as u64 });
        }
        self.depth += 1;
        let value = self.read_tagged();
        self.depth -= 1;
        value
    }

    fn read_tagged(&mut self) -> CoreResult<Option<MarshalValue>> {
        let at = self.rd.offset() as u64;
        let byte = self.rd.read_u8()?;
        let tag = byte & !FLAG_REF;
        let value = match tag {
            TYPE_NULL => return Ok(None),
            TYPE_NONE => MarshalValue::None,
            TYPE_FALSE => MarshalValue::Bool(false),
            TYPE_TRUE => MarshalValue::Bool(true),
            TYPE_STOPITER => MarshalValue::StopIteration,
            TYPE_ELLIPSIS => MarshalValue::Ellipsis,
            TYPE_REF => {
                let index = self.rd.read_u32_le()?;
                self.lookup(index)?
            }
            TYPE_STRINGREF => {
                let index = self.rd.read_u32_le()?;
                let value = self
                    .interned
                    .get(index as usize)
                    .ok_or(CoreError::InvalidReference { index })?;
                MarshalValue::Str(Text::interned(Arc::clone(value)))
            }
            _ => {
                let slot = (byte & FLAG_REF != 0).then(|| self.reserve());
                let value = self.read_body(tag, at, slot)?;
                if let Some(idx) = slot {
                    self.refs[idx] = Slot::Ready(value.clone());
                }
                value
            }
        };
        Ok(Some(value))
    }

    fn reserve(&mut self) -> usize {
        self.refs.push(Slot::Pending);
        self.refs.len() - 1
    }

    fn mark_filling(&mut self, slot: Option<usize>) {
        if let Some(idx) = slot {
            self.refs[idx] = Slot::Filling;
        }
    }

    fn lookup(&self, index: u32) -> CoreResult<MarshalValue> {
        match self.refs.get(index as usize) {
            Some(Slot::Ready(value)) => Ok(value.clone()),
            Some(Slot::Filling) => Ok(MarshalValue::Ref(index)),
            Some(Slot::Pending) => Err(CoreError::IncompleteReference { index }),
            None => Err(CoreError::InvalidReference { index }),
        }
    }

    fn read_body(&mut self, tag: u8, at: u64, slot: Option<usize>) -> CoreResult<MarshalValue> {
        Ok(match tag {
            TYPE_INT => MarshalValue::Int(self.rd.read_i32_le()?),
            TYPE_INT64 => MarshalValue::Int64(self.rd.read_i64_le()?),
            TYPE_LONG => MarshalValue::Long(Arc::new(self.read_long(at)?)),
            TYPE_FLOAT => MarshalValue::Float(self.read_text_float(at)?),
            TYPE_BINARY_FLOAT => MarshalValue::Float(self.rd.read_f64_le()?),
            TYPE_COMPLEX => {
                let re = self.read_text_float(at)?;
                MarshalValue::Complex(re, self.read_text_float(at)?)
            }
            TYPE_BINARY_COMPLEX => {
                let re = self.rd.read_f64_le()?;
                MarshalValue::Complex(re, self.rd.read_f64_le()?)
            }
            TYPE_STRING => {
                let n = self.read_len(tag, at)?;
                MarshalValue::Bytes(Arc::from(self.rd.read_bytes(n)?))
            }
            TYPE_UNICODE | TYPE_INTERNED => {
                let n = self.read_len(tag, at)?;
                let value = decode_utf8(self.rd.read_bytes(n)?, at);
                self.text(value, tag == TYPE_INTERNED)
            }
            TYPE_ASCII | TYPE_ASCII_INTERNED => {
                let n = self.read_len(tag, at)?;
                let value = decode_latin1(self.rd.read_bytes(n)?);
                self.text(value, tag == TYPE_ASCII_INTERNED)
            }
            TYPE_SHORT_ASCII | TYPE_SHORT_ASCII_INTERNED => {
                let n = usize::from(self.rd.read_u8()?);
                let value = decode_latin1(self.rd.read_bytes(n)?);
                self.text(value, tag == TYPE_SHORT_ASCII_INTERNED)
            }
            TYPE_TUPLE => {
                let n = self.read_len(tag, at)?;
                MarshalValue::Tuple(self.read_items(n)?.into())
            }
            TYPE_SMALL_TUPLE => {
                let n = usize::from(self.rd.read_u8()?);
                MarshalValue::Tuple(self.read_items(n)?.into())
            }
            TYPE_LIST => {
                let n = self.read_len(tag, at)?;
                self.mark_filling(slot);
                MarshalValue::List(self.read_items(n)?.into())
            }
            TYPE_SET => {
                let n = self.read_len(tag, at)?;
                self.mark_filling(slot);
                MarshalValue::Set(self.read_items(n)?.into())
            }
            TYPE_FROZENSET => {
                let n = self.read_len(tag, at)?;
                MarshalValue::FrozenSet(self.read_items(n)?.into())
            }
            TYPE_DICT => {
                self.mark_filling(slot);
                let mut pairs = Vec::new();
                while let Some(key) = self.read_optional()? {
                    let value = self.read_object()?;
                    pairs.push((key, value));
                }
                MarshalValue::Dict(pairs.into())
            }
            TYPE_CODE => MarshalValue::Code(Arc::new(self.read_code()?)),
            _ => return Err(CoreError::MarshalFormat { tag, at }),
        })
    }

    fn text(&mut self, value: String, interned: bool) -> MarshalValue {
        let value: Arc<str> = value.into();
        if interned {
            self.interned.push(Arc::clone(&value));
            MarshalValue::Str(Text::interned(value))
        } else {
            MarshalValue::Str(Text::new(value))
        }
    }

    /// 4-byte signed length; negative sizes are a format error.
    fn read_len(&mut self, tag: u8, at: u64) -> CoreResult<usize> {
        usize::try_from(self.rd.read_i32_le()?).map_err(|_| CoreError::MarshalFormat { tag, at })
    }

    fn read_items(&mut self, n: usize) -> CoreResult<Vec<MarshalValue>> {
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(n.min(self.rd.remaining()));
        for _ in 0..n {
            items.push(self.read_object()?);
        }
        Ok(items)
    }

    fn read_text_float(&mut self, at: u64) -> CoreResult<f64> {
        let n = usize::from(self.rd.read_u8()?);
        let raw = self.rd.read_bytes(n)?;
        core::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or(CoreError::MarshalFormat { tag: TYPE_FLOAT, at })
    }

    /// Signed digit count, then base-2^15 digits, least significant first.
    fn read_long(&mut self, at: u64) -> CoreResult<BigInt> {
        let count = self.rd.read_i32_le()?;
        let size = count.unsigned_abs() as usize;
        let mut digits = Vec::with_capacity(size.min(self.rd.remaining() / 2));
        for _ in 0..size {
            let digit = self.rd.read_u16_le()?;
            if digit > LONG_DIGIT_MASK {
                return Err(CoreError::MarshalFormat { tag: TYPE_LONG, at });
            }
            digits.push(digit);
        }
        let magnitude = digits
            .iter()
            .rev()
            .fold(BigUint::default(), |acc, &d| (acc << LONG_SHIFT) | BigUint::from(d));
        let sign = match count {
            0 => Sign::NoSign,
            c if c < 0 => Sign::Minus,
            _ => Sign::Plus,
        };
        Ok(BigInt::from_biguint(sign, magnitude))
    }

    /* ─────────────────────────── Code objects ─────────────────────────── */

    fn read_count(&mut self, field: &'static str) -> CoreResult<u32> {
        let raw = self.rd.read_i32_le()?;
        u32::try_from(raw).map_err(|_| CoreError::malformed(field, format!("negative count {raw}")))
    }

    fn read_bytes_field(&mut self, field: &'static str) -> CoreResult<Arc<[u8]>> {
        match self.read_object()? {
            MarshalValue::Bytes(b) => Ok(b),
            other => Err(CoreError::malformed(field, format!("expected bytes, got {}", other.type_name()))),
        }
    }

    fn read_str_field(&mut self, field: &'static str) -> CoreResult<Arc<str>> {
        match self.read_object()? {
            MarshalValue::Str(t) => Ok(t.value),
            // Very old writers stored names as byte strings.
            MarshalValue::Bytes(b) => Ok(decode_latin1(&b).into()),
            other => Err(CoreError::malformed(field, format!("expected str, got {}", other.type_name()))),
        }
    }

    fn read_tuple_field(&mut self, field: &'static str) -> CoreResult<Arc<[MarshalValue]>> {
        match self.read_object()? {
            MarshalValue::Tuple(items) | MarshalValue::List(items) => Ok(items),
            MarshalValue::None => Ok(Arc::from([])),
            other => Err(CoreError::malformed(field, format!("expected tuple, got {}", other.type_name()))),
        }
    }

    fn read_names_field(&mut self, field: &'static str) -> CoreResult<Vec<Arc<str>>> {
        self.read_tuple_field(field)?
            .iter()
            .map(|item| match item {
                MarshalValue::Str(t) => Ok(Arc::clone(&t.value)),
                other => Err(CoreError::malformed(field, format!("expected str item, got {}", other.type_name()))),
            })
            .collect()
    }

    fn read_code(&mut self) -> CoreResult<CodeUnit> {
        let unit = match self.profile.layout {
            CodeLayout::Split => self.read_split_code()?,
            CodeLayout::Unified => self.read_unified_code()?,
        };
        log::trace!(
            "code unit `{}` ({} bytes of wordcode, {} consts)",
            unit.name,
            unit.code.len(),
            unit.consts.len()
        );
        Ok(unit)
    }

    fn read_split_code(&mut self) -> CoreResult<CodeUnit> {
        let argcount = self.read_count("argcount")?;
        let posonlyargcount = self.read_count("posonlyargcount")?;
        let kwonlyargcount = self.read_count("kwonlyargcount")?;
        let nlocals = self.read_count("nlocals")?;
        let stacksize = self.read_count("stacksize")?;
        let flags = CodeFlags::from_bits_retain(self.rd.read_u32_le()?);
        let code = self.read_bytes_field("code")?;
        let consts = self.read_tuple_field("consts")?;
        let names = self.read_names_field("names")?;
        let varnames = self.read_names_field("varnames")?;
        let freevars = self.read_names_field("freevars")?;
        let cellvars = self.read_names_field("cellvars")?;
        let filename = self.read_str_field("filename")?;
        let name = self.read_str_field("name")?;
        let first_line = self.rd.read_i32_le()?;
        let linetable = self.read_bytes_field("lnotab")?;
        Ok(CodeUnit {
            version: self.profile.version,
            argcount,
            posonlyargcount,
            kwonlyargcount,
            nlocals,
            stacksize,
            flags,
            code,
            consts,
            names,
            locals: LocalsLayout::Split { varnames, cellvars, freevars },
            filename,
            name,
            qualname: None,
            first_line,
            linetable,
            exceptiontable: Arc::from([]),
        })
    }

    fn read_unified_code(&mut self) -> CoreResult<CodeUnit> {
        let argcount = self.read_count("argcount")?;
        let posonlyargcount = self.read_count("posonlyargcount")?;
        let kwonlyargcount = self.read_count("kwonlyargcount")?;
        let stacksize = self.read_count("stacksize")?;
        let flags = CodeFlags::from_bits_retain(self.rd.read_u32_le()?);
        let code = self.read_bytes_field("code")?;
        let consts = self.read_tuple_field("consts")?;
        let names = self.read_names_field("names")?;
        let slot_names = self.read_names_field("localsplusnames")?;
        let kinds = self.read_bytes_field("localspluskinds")?;
        if kinds.len() != slot_names.len() {
            return Err(CoreError::malformed(
                "localspluskinds",
                format!("{} kinds for {} names", kinds.len(), slot_names.len()),
            ));
        }
        let filename = self.read_str_field("filename")?;
        let name = self.read_str_field("name")?;
        let qualname = self.read_str_field("qualname")?;
        let first_line = self.rd.read_i32_le()?;
        let linetable = self.read_bytes_field("linetable")?;
        let exceptiontable = self.read_bytes_field("exceptiontable")?;
        let nlocals = kinds.iter().filter(|k| **k & local_kind::LOCAL != 0).count() as u32;
        Ok(CodeUnit {
            version: self.profile.version,
            argcount,
            posonlyargcount,
            kwonlyargcount,
            nlocals,
            stacksize,
            flags,
            code,
            consts,
            names,
            locals: LocalsLayout::Unified { names: slot_names, kinds },
            filename,
            name,
            qualname: Some(qualname),
            first_line,
            linetable,
            exceptiontable,
        })
    }
}

fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

fn decode_utf8(raw: &[u8], at: u64) -> String {
    match core::str::from_utf8(raw) {
        Ok(s) => s.to_owned(),
        Err(e) => {
            log::warn!("invalid utf-8 in string at offset {at}: {e}; decoding lossily");
            String::from_utf8_lossy(raw).into_owned()
        }
    }
}

/// Decode a complete marshal stream for `version`.
pub fn loads(data: &[u8], version: Version) -> CoreResult<MarshalValue> {
    Unmarshaller::for_version(data, version)?.read_top_level()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(data: &[u8]) -> CoreResult<MarshalValue> {
        loads(data, Version::V3_9)
    }

    fn text(v: &str) -> MarshalValue {
        MarshalValue::Str(Text::new(v))
    }

    #[test]
    fn singletons() -> CoreResult<()> {
        assert_eq!(load(b"N")?, MarshalValue::None);
        assert_eq!(load(b"F")?, MarshalValue::Bool(false));
        assert_eq!(load(b"T")?, MarshalValue::Bool(true));
        assert_eq!(load(b"S")?, MarshalValue::StopIteration);
        assert_eq!(load(b".")?, MarshalValue::Ellipsis);
        Ok(())
    }

    #[test]
    fn fixed_width_integers() -> CoreResult<()> {
        assert_eq!(load(b"i\x01\x02\x03\x04")?, MarshalValue::Int(0x0403_0201));
        assert_eq!(load(b"i\xff\xff\xff\xff")?, MarshalValue::Int(-1));
        assert_eq!(load(b"I\x01\x02\x03\x04\x05\x06\x07\x08")?, MarshalValue::Int64(0x0807_0605_0403_0201));
        assert_eq!(load(b"I\xff\xff\xff\xff\xff\xff\xff\xff")?, MarshalValue::Int64(-1));
        Ok(())
    }

    #[test]
    fn long_integers() -> CoreResult<()> {
        let v = load(b"l\x03\x00\x00\x00\x01\x00\x02\x00\x03\x00")?;
        assert_eq!(v, MarshalValue::Long(BigInt::from(1 + 2 * (1_i64 << 15) + 3 * (1_i64 << 30)).into()));
        assert_eq!(load(b"l\xff\xff\xff\xff\x01\x00")?, MarshalValue::Long(BigInt::from(-1).into()));
        assert_eq!(load(b"l\xfe\xff\xff\xff\x01\x00\x02\x00")?, MarshalValue::Long(BigInt::from(-65537).into()));
        assert_eq!(load(b"l\x00\x00\x00\x00")?, MarshalValue::Long(BigInt::from(0).into()));
        Ok(())
    }

    #[test]
    fn long_digit_out_of_range() {
        let err = load(b"l\x01\x00\x00\x00\x00\x80").unwrap_err();
        assert_eq!(err, CoreError::MarshalFormat { tag: b'l', at: 0 });
    }

    #[test]
    fn floats_and_complex() -> CoreResult<()> {
        assert_eq!(load(b"f\x040.25")?, MarshalValue::Float(0.25));
        let mut long_float = b"f\xff0.".to_vec();
        long_float.extend(std::iter::repeat(b'9').take(253));
        assert_eq!(load(&long_float)?, MarshalValue::Float(1.0));
        assert_eq!(load(b"g\x00\x00\x00\x00\x00\x00\xd0\x3f")?, MarshalValue::Float(0.25));
        assert_eq!(load(b"x\x03.25\x03.25")?, MarshalValue::Complex(0.25, 0.25));
        let binary = b"y\x00\x00\x00\x00\x00\x00\xf0\x3f\x00\x00\x00\x00\x00\x00\xf0\x3f";
        assert_eq!(load(binary)?, MarshalValue::Complex(1.0, 1.0));
        Ok(())
    }

    #[test]
    fn bytes_and_text_stay_distinct() -> CoreResult<()> {
        assert_eq!(load(b"s\x04\x00\x00\x00test")?, MarshalValue::Bytes(Arc::from(&b"test"[..])));
        for data in [
            &b"t\x04\x00\x00\x00test"[..],
            b"u\x04\x00\x00\x00test",
            b"a\x04\x00\x00\x00test",
            b"A\x04\x00\x00\x00test",
            b"z\x04test",
            b"Z\x04test",
        ] {
            assert_eq!(load(data)?, text("test"));
        }
        assert_eq!(load(b"u\x02\x00\x00\x00\xc3\xa4")?, text("\u{e4}"));
        Ok(())
    }

    #[test]
    fn interned_flag_tracks_tag() -> CoreResult<()> {
        let MarshalValue::Str(t) = load(b"Z\x04test")? else { panic!("expected str") };
        assert!(t.interned);
        let MarshalValue::Str(t) = load(b"z\x04test")? else { panic!("expected str") };
        assert!(!t.interned);
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_lossy() -> CoreResult<()> {
        assert_eq!(load(b"u\x01\x00\x00\x00\xff")?, text("\u{fffd}"));
        Ok(())
    }

    #[test]
    fn containers() -> CoreResult<()> {
        let t = MarshalValue::Bool(true);
        let f = MarshalValue::Bool(false);
        assert_eq!(load(b"(\x02\x00\x00\x00TF")?, MarshalValue::Tuple(vec![t.clone(), f.clone()].into()));
        assert_eq!(load(b")\x02TF")?, MarshalValue::Tuple(vec![t.clone(), f.clone()].into()));
        assert_eq!(load(b"[\x02\x00\x00\x00TF")?, MarshalValue::List(vec![t.clone(), f.clone()].into()));
        assert_eq!(
            load(b"{TFFN0")?,
            MarshalValue::Dict(vec![(t.clone(), f.clone()), (f.clone(), MarshalValue::None)].into())
        );
        assert_eq!(
            load(b"<\x03\x00\x00\x00FTN")?,
            MarshalValue::Set(vec![f.clone(), t.clone(), MarshalValue::None].into())
        );
        assert_eq!(load(b">\x03\x00\x00\x00FTN")?, MarshalValue::FrozenSet(vec![f, t, MarshalValue::None].into()));
        Ok(())
    }

    #[test]
    fn flagged_values_are_shared() -> CoreResult<()> {
        let data = b"(\x04\x00\x00\x00\xe9\x00\x01\x02\x03\xe9\x04\x05\x06\x07r\x00\x00\x00\x00r\x01\x00\x00\x00";
        let a = MarshalValue::Int(0x0302_0100);
        let b = MarshalValue::Int(0x0706_0504);
        assert_eq!(load(data)?, MarshalValue::Tuple(vec![a.clone(), b.clone(), a, b].into()));
        Ok(())
    }

    #[test]
    fn legacy_string_references() -> CoreResult<()> {
        let data = b"(\x04\x00\x00\x00t\x04\x00\x00\x00abcdt\x04\x00\x00\x00efghR\x00\x00\x00\x00R\x01\x00\x00\x00";
        let items = ["abcd", "efgh", "abcd", "efgh"].map(text).to_vec();
        assert_eq!(load(data)?, MarshalValue::Tuple(items.into()));
        Ok(())
    }

    #[test]
    fn slots_are_reserved_in_tag_order() -> CoreResult<()> {
        // A flagged tuple holding a flagged string: tuple is slot 0, string slot 1.
        let data = b"\xa9\x02\xda\x01ar\x01\x00\x00\x00";
        assert_eq!(load(data)?, MarshalValue::Tuple(vec![text("a"), text("a")].into()));
        Ok(())
    }

    #[test]
    fn self_referencing_list_yields_ref() -> CoreResult<()> {
        assert_eq!(load(b"\xdb\x01\x00\x00\x00r\x00\x00\x00\x00")?, MarshalValue::List(vec![MarshalValue::Ref(0)].into()));
        Ok(())
    }

    #[test]
    fn self_referencing_dict_and_set_yield_ref() -> CoreResult<()> {
        let dict = load(b"\xfbz\x01kr\x00\x00\x00\x000")?;
        assert_eq!(dict, MarshalValue::Dict(vec![(text("k"), MarshalValue::Ref(0))].into()));
        let set = load(b"\xbc\x01\x00\x00\x00r\x00\x00\x00\x00")?;
        assert_eq!(set, MarshalValue::Set(vec![MarshalValue::Ref(0)].into()));
        // Frozen sets are immutable: not visible until complete.
        assert_eq!(
            load(b"\xbe\x01\x00\x00\x00r\x00\x00\x00\x00"),
            Err(CoreError::IncompleteReference { index: 0 })
        );
        Ok(())
    }

    /// Flagged 3.9 code object `name` returning None.
    fn flagged_code(name: &str) -> Vec<u8> {
        let mut out = vec![TYPE_CODE | FLAG_REF];
        for v in [0_i32, 0, 0, 0, 1, 0x40] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(b"s\x04\x00\x00\x00d\x00S\x00");
        out.extend_from_slice(b")\x01N)\x00)\x00)\x00)\x00z\x04m.py");
        out.push(b'z');
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&1_i32.to_le_bytes());
        out.extend_from_slice(b"s\x00\x00\x00\x00");
        out
    }

    #[test]
    fn backreference_to_finished_code_unit_shares_it() -> CoreResult<()> {
        let mut data = b")\x02".to_vec();
        data.extend(flagged_code("f"));
        data.extend_from_slice(b"r\x00\x00\x00\x00");
        let MarshalValue::Tuple(items) = load(&data)? else { panic!("expected tuple") };
        let (MarshalValue::Code(first), MarshalValue::Code(second)) = (&items[0], &items[1]) else {
            panic!("expected two code units")
        };
        assert!(Arc::ptr_eq(first, second));
        assert_eq!(&*first.name, "f");
        assert_eq!(first.consts.len(), 1);
        Ok(())
    }

    /// `levels + 1` flagged tuples, each holding two backreferences to the previous one.
    fn doubling_chain(levels: u32) -> Vec<u8> {
        let mut data = vec![TYPE_TUPLE];
        data.extend_from_slice(&(levels + 1).to_le_bytes());
        data.extend_from_slice(&[TYPE_SMALL_TUPLE | FLAG_REF, 0]);
        for k in 1..=levels {
            data.extend_from_slice(&[TYPE_SMALL_TUPLE | FLAG_REF, 2]);
            for _ in 0..2 {
                data.push(TYPE_REF);
                data.extend_from_slice(&(k - 1).to_le_bytes());
            }
        }
        data
    }

    #[test]
    fn chained_backreferences_share_nodes() -> CoreResult<()> {
        // A copied tree would hold 2^64 leaves.
        let MarshalValue::Tuple(levels) = load(&doubling_chain(64))? else { panic!("expected tuple") };
        assert_eq!(levels.len(), 65);
        for pair in levels.windows(2) {
            let (MarshalValue::Tuple(prev), MarshalValue::Tuple(cur)) = (&pair[0], &pair[1]) else {
                panic!("expected tuples")
            };
            assert_eq!(cur.len(), 2);
            for child in cur.iter() {
                let MarshalValue::Tuple(child) = child else { panic!("expected tuple") };
                assert!(Arc::ptr_eq(child, prev));
            }
        }
        Ok(())
    }

    #[test]
    fn reference_errors() {
        assert_eq!(load(b"\xa9\x01r\x00\x00\x00\x00"), Err(CoreError::IncompleteReference { index: 0 }));
        assert_eq!(load(b"r\x05\x00\x00\x00"), Err(CoreError::InvalidReference { index: 5 }));
        assert_eq!(load(b"R\x00\x00\x00\x00"), Err(CoreError::InvalidReference { index: 0 }));
    }

    #[test]
    fn structural_failures() {
        assert_eq!(load(b"\x07"), Err(CoreError::MarshalFormat { tag: 7, at: 0 }));
        assert_eq!(load(b"f"), Err(CoreError::MarshalTruncated { needed: 1, at: 1 }));
        assert_eq!(load(b"f\x020"), Err(CoreError::MarshalTruncated { needed: 2, at: 2 }));
        assert_eq!(load(b"N\x00"), Err(CoreError::MarshalTrailingData { remaining: 1 }));
        assert_eq!(load(b"0"), Err(CoreError::MarshalFormat { tag: b'0', at: 0 }));
        assert_eq!(load(b"s\xff\xff\xff\xff"), Err(CoreError::MarshalFormat { tag: b's', at: 0 }));
    }

    #[test]
    fn nesting_is_bounded() {
        let mut data = Vec::new();
        for _ in 0..=MAX_DEPTH {
            data.extend_from_slice(b")\x01");
        }
        data.push(b'N');
        // Debug frames are large; give the recursion room.
        let result = std::thread::Builder::new()
            .stack_size(256 << 20)
            .spawn(move || load(&data))
            .expect("spawn")
            .join()
            .expect("join");
        assert!(matches!(result, Err(CoreError::RecursionLimit { limit: MAX_DEPTH, .. })));
    }

    #[test]
    fn unsupported_version() {
        assert_eq!(loads(b"N", Version::new(3, 7)), Err(CoreError::UnsupportedVersion { version: Version::new(3, 7) }));
    }
}
