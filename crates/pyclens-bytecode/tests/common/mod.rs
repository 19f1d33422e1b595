//! Fixtures `.pyc` assemblées à la main (aucun interpréteur requis).
//!
//! `trivial(version)` is the compiled form of:
//!
//! ```python
//! x = 1
//! y = 2
//! z = x + y
//! w = x * y
//! ```
#![allow(dead_code)]

use pyclens_core::{magic_bytes, Version};

/// Nombre de lignes du source `trivial`.
pub const TRIVIAL_LINES: i32 = 4;

/// Minimal marshal writer.
#[derive(Default)]
pub struct Writer {
    out: Vec<u8>,
}

impl Writer {
    /// Starts a pyc image with a timestamp header.
    pub fn pyc(version: Version) -> Self {
        let mut out = magic_bytes(version).expect("supported version").to_vec();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        out.extend_from_slice(&64u32.to_le_bytes());
        Self { out }
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.raw(&v.to_le_bytes())
    }

    pub fn int(&mut self, v: i32) -> &mut Self {
        self.out.push(b'i');
        self.i32(v)
    }

    pub fn none(&mut self) -> &mut Self {
        self.raw(b"N")
    }

    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.out.push(b's');
        self.i32(b.len() as i32).raw(b)
    }

    /// `z` : ASCII court.
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.out.push(b'z');
        self.out.push(s.len() as u8);
        self.raw(s.as_bytes())
    }

    /// `Z | FLAG_REF` : ASCII court interné, enregistré dans la table.
    pub fn interned_ref(&mut self, s: &str) -> &mut Self {
        self.out.push(b'Z' | 0x80);
        self.out.push(s.len() as u8);
        self.raw(s.as_bytes())
    }

    pub fn backref(&mut self, index: u32) -> &mut Self {
        self.out.push(b'r');
        self.raw(&index.to_le_bytes())
    }

    pub fn small_tuple(&mut self, len: u8) -> &mut Self {
        self.out.push(b')');
        self.out.push(len);
        self
    }

    pub fn names(&mut self, items: &[&str]) -> &mut Self {
        self.small_tuple(items.len() as u8);
        for item in items {
            self.text(item);
        }
        self
    }
}

/// Champs variables d'un code object.
pub struct CodeFixture<'a> {
    pub argcount: i32,
    pub nlocals: i32,
    pub flags: u32,
    pub code: &'a [u8],
    pub consts: &'a dyn Fn(&mut Writer),
    pub names: &'a [&'a str],
    pub locals: &'a [&'a str],
    pub kinds: &'a [u8],
    pub name: &'a dyn Fn(&mut Writer),
    pub qualname: &'a str,
    pub first_line: i32,
    pub linetable: &'a [u8],
    pub exceptiontable: &'a [u8],
}

/// Writes a code object in `version`'s layout.
pub fn write_code(w: &mut Writer, version: Version, fx: &CodeFixture<'_>) {
    w.raw(b"c");
    if version >= Version::V3_11 {
        w.i32(fx.argcount).i32(0).i32(0).i32(4).raw(&fx.flags.to_le_bytes());
        w.bytes(fx.code);
        (fx.consts)(w);
        w.names(fx.names).names(fx.locals).bytes(fx.kinds);
        w.text("trivial.py");
        (fx.name)(w);
        w.text(fx.qualname);
        w.i32(fx.first_line).bytes(fx.linetable).bytes(fx.exceptiontable);
    } else {
        w.i32(fx.argcount).i32(0).i32(0).i32(fx.nlocals).i32(4).raw(&fx.flags.to_le_bytes());
        w.bytes(fx.code);
        (fx.consts)(w);
        w.names(fx.names).names(fx.locals).names(&[]).names(&[]);
        w.text("trivial.py");
        (fx.name)(w);
        w.i32(fx.first_line).bytes(fx.linetable);
    }
}

const SPLIT_CODE: &[u8] = &[
    100, 0, 90, 0, 100, 1, 90, 1, // x = 1 ; y = 2
    101, 0, 101, 1, 23, 0, 90, 2, // z = x + y
    101, 0, 101, 1, 20, 0, 90, 3, // w = x * y
    100, 2, 83, 0,
];

const CODE_311: &[u8] = &[
    151, 0, 100, 0, 90, 0, 100, 1, 90, 1, //
    101, 0, 101, 1, 122, 0, 0, 0, 90, 2, //
    101, 0, 101, 1, 122, 5, 0, 0, 90, 3, //
    100, 2, 83, 0,
];

const CODE_312: &[u8] = &[
    151, 0, 100, 0, 90, 0, 100, 1, 90, 1, //
    101, 0, 101, 1, 122, 0, 0, 0, 90, 2, //
    101, 0, 101, 1, 122, 5, 0, 0, 90, 3, //
    121, 2,
];

const LOCATIONS_BODY: &[u8] = &[
    0xF0, 0x03, 0x01, 0x01, 0x01, //
    0xD8, 0x04, 0x05, 0x80, 0x01, //
    0xD8, 0x04, 0x05, 0x80, 0x01, //
    0xD8, 0x04, 0x05, 0x88, 0x01, 0x81, 0x45, 0x80, 0x01, //
    0xD8, 0x04, 0x05, 0x88, 0x01, 0x81, 0x45, 0x80, 0x01,
];

/// Protected ranges used by the exception table tests.
pub const NESTED_EXCEPTIONS: &[u8] =
    &[0x82, 0x04, 0x0A, 0x00, 0x8A, 0x03, 0x14, 0x03, 0x94, 0x41, 0x06, 0x41, 0x24, 0x05];

/// `trivial` compiled for `version`, with an optional exception table (3.11+ only).
pub fn trivial_with(version: Version, exceptiontable: &[u8]) -> Vec<u8> {
    let (code, linetable): (&[u8], Vec<u8>) = match version {
        Version::V3_8 | Version::V3_9 => (SPLIT_CODE, vec![4, 1, 4, 1, 8, 1]),
        Version::V3_10 => (SPLIT_CODE, vec![4, 0, 4, 1, 8, 1, 12, 1]),
        Version::V3_11 => (CODE_311, [LOCATIONS_BODY, &[0x81, 0x09]].concat()),
        _ => (CODE_312, [LOCATIONS_BODY, &[0x80, 0x09]].concat()),
    };
    let mut w = Writer::pyc(version);
    write_code(
        &mut w,
        version,
        &CodeFixture {
            argcount: 0,
            nlocals: 0,
            flags: 0x40,
            code,
            consts: &|w| {
                w.small_tuple(3).int(1).int(2).none();
            },
            names: &["x", "y", "z", "w"],
            locals: &[],
            kinds: &[],
            name: &|w| {
                w.text("<module>");
            },
            qualname: "<module>",
            first_line: 1,
            linetable: &linetable,
            exceptiontable,
        },
    );
    w.finish()
}

/// `trivial` compiled for `version`.
pub fn trivial(version: Version) -> Vec<u8> {
    trivial_with(version, &[])
}

/// `def f(a): return a` as a 3.8 module; the function name is shared via a backreference.
pub fn function_module_38() -> Vec<u8> {
    let mut w = Writer::pyc(Version::V3_8);
    write_code(
        &mut w,
        Version::V3_8,
        &CodeFixture {
            argcount: 0,
            nlocals: 0,
            flags: 0x40,
            // LOAD_CONST 0 ; LOAD_CONST 1 ; MAKE_FUNCTION 0 ; STORE_NAME 0 ; LOAD_CONST 2 ; RETURN_VALUE
            code: &[100, 0, 100, 1, 132, 0, 90, 0, 100, 2, 83, 0],
            consts: &|w| {
                w.small_tuple(3);
                write_code(
                    w,
                    Version::V3_8,
                    &CodeFixture {
                        argcount: 1,
                        nlocals: 1,
                        flags: 0x43,
                        code: &[124, 0, 83, 0],
                        consts: &|w| {
                            w.small_tuple(1).none();
                        },
                        names: &[],
                        locals: &["a"],
                        kinds: &[],
                        name: &|w| {
                            w.interned_ref("f");
                        },
                        qualname: "f",
                        first_line: 1,
                        linetable: &[0, 1],
                        exceptiontable: &[],
                    },
                );
                w.backref(0).none();
            },
            names: &["f"],
            locals: &[],
            kinds: &[],
            name: &|w| {
                w.text("<module>");
            },
            qualname: "<module>",
            first_line: 1,
            linetable: &[],
            exceptiontable: &[],
        },
    );
    w.finish()
}
