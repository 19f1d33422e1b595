//! Arbre de valeurs produit par le lecteur marshal.

use core::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::CodeUnit;

/// A decoded text string.
///
/// `interned` records which tag produced the value; it does not take part in
/// equality. Characters are shared, so backreferences clone a pointer.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Text {
    /// Decoded characters.
    pub value: Arc<str>,
    /// Whether the writer marked the string as interned.
    pub interned: bool,
}

impl Text {
    /// Non-interned text.
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self { value: value.into(), interned: false }
    }

    /// Interned text.
    pub fn interned(value: impl Into<Arc<str>>) -> Self {
        Self { value: value.into(), interned: true }
    }

    /// Borrow the characters.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// One node of a marshal value tree.
///
/// Heap payloads sit behind [`Arc`]: a value reached through several
/// backreferences is stored once and cloning a node is O(1).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum MarshalValue {
    /// `None`
    None,
    /// `True` / `False`
    Bool(bool),
    /// The `StopIteration` singleton.
    StopIteration,
    /// The `Ellipsis` singleton.
    Ellipsis,
    /// 4-byte integer (`i`).
    Int(i32),
    /// 8-byte integer (`I`).
    Int64(i64),
    /// Arbitrary precision integer (`l`).
    Long(Arc<BigInt>),
    /// Float, binary or textual.
    Float(f64),
    /// Complex `(real, imag)`, binary or textual.
    Complex(f64, f64),
    /// Raw byte string.
    Bytes(Arc<[u8]>),
    /// Text string.
    Str(Text),
    /// Tuple.
    Tuple(Arc<[MarshalValue]>),
    /// List.
    List(Arc<[MarshalValue]>),
    /// Mapping, in stream order.
    Dict(Arc<[(MarshalValue, MarshalValue)]>),
    /// Set, in stream order.
    Set(Arc<[MarshalValue]>),
    /// Frozen set, in stream order.
    FrozenSet(Arc<[MarshalValue]>),
    /// Backreference to a container that was still being filled.
    Ref(u32),
    /// Nested code unit.
    Code(Arc<CodeUnit>),
}

impl MarshalValue {
    /// Short type label, for diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            MarshalValue::None => "None",
            MarshalValue::Bool(_) => "bool",
            MarshalValue::StopIteration => "StopIteration",
            MarshalValue::Ellipsis => "ellipsis",
            MarshalValue::Int(_) | MarshalValue::Int64(_) | MarshalValue::Long(_) => "int",
            MarshalValue::Float(_) => "float",
            MarshalValue::Complex(..) => "complex",
            MarshalValue::Bytes(_) => "bytes",
            MarshalValue::Str(_) => "str",
            MarshalValue::Tuple(_) => "tuple",
            MarshalValue::List(_) => "list",
            MarshalValue::Dict(_) => "dict",
            MarshalValue::Set(_) => "set",
            MarshalValue::FrozenSet(_) => "frozenset",
            MarshalValue::Ref(_) => "ref",
            MarshalValue::Code(_) => "code",
        }
    }

    /// Text content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MarshalValue::Str(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Byte content, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MarshalValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Integer value if it fits an `i64`, whatever the encoding.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MarshalValue::Int(v) => Some(i64::from(*v)),
            MarshalValue::Int64(v) => Some(*v),
            MarshalValue::Long(v) => v.to_i64(),
            _ => None,
        }
    }

    /// Elements of a tuple or list.
    pub fn as_sequence(&self) -> Option<&[MarshalValue]> {
        match self {
            MarshalValue::Tuple(items) | MarshalValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Nested code unit.
    pub fn as_code(&self) -> Option<&CodeUnit> {
        match self {
            MarshalValue::Code(code) => Some(code),
            _ => None,
        }
    }
}

/* ─────────────────────────── repr ─────────────────────────── */

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("nan")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "inf" } else { "-inf" })
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

fn write_quoted(
    f: &mut fmt::Formatter<'_>,
    chars: impl Iterator<Item = char> + Clone,
    escape_high: bool,
) -> fmt::Result {
    let quote = if chars.clone().any(|c| c == '\'') && !chars.clone().any(|c| c == '"') { '"' } else { '\'' };
    write!(f, "{quote}")?;
    for c in chars {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7F || (escape_high && c as u32 > 0x7F) => {
                write!(f, "\\x{:02x}", c as u32)?;
            }
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[MarshalValue]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for MarshalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalValue::None => f.write_str("None"),
            MarshalValue::Bool(true) => f.write_str("True"),
            MarshalValue::Bool(false) => f.write_str("False"),
            MarshalValue::StopIteration => f.write_str("StopIteration"),
            MarshalValue::Ellipsis => f.write_str("Ellipsis"),
            MarshalValue::Int(v) => write!(f, "{v}"),
            MarshalValue::Int64(v) => write!(f, "{v}"),
            MarshalValue::Long(v) => write!(f, "{v}"),
            MarshalValue::Float(v) => write_float(f, *v),
            MarshalValue::Complex(re, im) => {
                if *re == 0.0 && re.is_sign_positive() {
                    write!(f, "{im}j")
                } else {
                    let sign = if im.is_sign_negative() { '-' } else { '+' };
                    write!(f, "({re}{sign}{}j)", im.abs())
                }
            }
            MarshalValue::Bytes(b) => {
                f.write_str("b")?;
                write_quoted(f, b.iter().map(|&byte| char::from(byte)), true)
            }
            MarshalValue::Str(t) => write_quoted(f, t.value.chars(), false),
            MarshalValue::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            MarshalValue::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            MarshalValue::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            MarshalValue::Set(items) if items.is_empty() => f.write_str("set()"),
            MarshalValue::Set(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            MarshalValue::FrozenSet(items) if items.is_empty() => f.write_str("frozenset()"),
            MarshalValue::FrozenSet(items) => {
                f.write_str("frozenset({")?;
                write_items(f, items)?;
                f.write_str("})")
            }
            MarshalValue::Ref(idx) => write!(f, "<ref {idx}>"),
            MarshalValue::Code(code) => write!(f, "<code:{}>", code.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> MarshalValue {
        MarshalValue::Str(Text::new(v))
    }

    #[test]
    fn interned_flag_is_ignored_by_equality() {
        assert_eq!(Text::new("x"), Text::interned("x"));
        assert_ne!(s("x"), MarshalValue::Bytes(Arc::from(&b"x"[..])));
    }

    #[test]
    fn repr_scalars() {
        assert_eq!(MarshalValue::None.to_string(), "None");
        assert_eq!(MarshalValue::Bool(true).to_string(), "True");
        assert_eq!(MarshalValue::Float(1.0).to_string(), "1.0");
        assert_eq!(MarshalValue::Float(0.25).to_string(), "0.25");
        assert_eq!(MarshalValue::Complex(1.0, -2.0).to_string(), "(1-2j)");
        assert_eq!(MarshalValue::Complex(0.0, 2.5).to_string(), "2.5j");
        assert_eq!(MarshalValue::Long(BigInt::from(-65537).into()).to_string(), "-65537");
    }

    #[test]
    fn repr_strings() {
        assert_eq!(s("it's").to_string(), "\"it's\"");
        assert_eq!(s("a\nb").to_string(), "'a\\nb'");
        assert_eq!(MarshalValue::Bytes(vec![b'a', 0, 0xFF].into()).to_string(), "b'a\\x00\\xff'");
    }

    #[test]
    fn repr_containers() {
        let one = MarshalValue::Tuple(vec![MarshalValue::Int(1)].into());
        assert_eq!(one.to_string(), "(1,)");
        let dict = MarshalValue::Dict(vec![(s("k"), MarshalValue::List(Arc::from([])))].into());
        assert_eq!(dict.to_string(), "{'k': []}");
        assert_eq!(MarshalValue::Set(Arc::from([])).to_string(), "set()");
        assert_eq!(MarshalValue::FrozenSet(vec![MarshalValue::None].into()).to_string(), "frozenset({None})");
    }

    #[test]
    fn integer_views() {
        assert_eq!(MarshalValue::Int(-1).as_i64(), Some(-1));
        assert_eq!(MarshalValue::Long(BigInt::from(1u64 << 40).into()).as_i64(), Some(1 << 40));
        assert_eq!(s("1").as_i64(), None);
    }
}
