//! Term encoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::FORMAT_VERSION;
use crate::tag::Tag;
use crate::term::Term;

/// Encode a root term, prefixed with the version marker.
pub fn encode(term: &Term) -> Bytes {
    let mut buf = BytesMut::with_capacity(64);
    encode_into(term, &mut buf);
    buf.freeze()
}

/// Encode a root term into an existing buffer.
pub fn encode_into(term: &Term, buf: &mut impl BufMut) {
    buf.put_u8(FORMAT_VERSION);
    write_term(term, buf);
}

fn write_term(term: &Term, buf: &mut impl BufMut) {
    match term {
        Term::Nil => write_atom("nil", buf),
        Term::Bool(true) => write_atom("true", buf),
        Term::Bool(false) => write_atom("false", buf),
        Term::Atom(name) => write_atom(name, buf),
        Term::Integer(value) => write_integer(*value, buf),
        Term::Float(value) => {
            buf.put_u8(Tag::NewFloat as u8);
            buf.put_f64(*value);
        }
        Term::Binary(bytes) => write_binary(bytes, buf),
        Term::List(items) if items.is_empty() => buf.put_u8(Tag::Nil as u8),
        Term::List(items) => {
            buf.put_u8(Tag::List as u8);
            buf.put_u32(items.len() as u32);
            for item in items {
                write_term(item, buf);
            }
            buf.put_u8(Tag::Nil as u8);
        }
        Term::Map(entries) => {
            buf.put_u8(Tag::Map as u8);
            buf.put_u32(entries.len() as u32);
            for (key, value) in entries {
                write_term(key, buf);
                write_term(value, buf);
            }
        }
    }
}

fn write_atom(name: &str, buf: &mut impl BufMut) {
    let len = name.len();
    if len <= usize::from(u8::MAX) {
        buf.put_u8(Tag::SmallAtomUtf8 as u8);
        buf.put_u8(len as u8);
    } else if len <= usize::from(u16::MAX) {
        buf.put_u8(Tag::AtomUtf8 as u8);
        buf.put_u16(len as u16);
    } else {
        // atoms cannot carry more than u16::MAX bytes
        write_binary(name.as_bytes(), buf);
        return;
    }
    buf.put_slice(name.as_bytes());
}

fn write_binary(bytes: &[u8], buf: &mut impl BufMut) {
    buf.put_u8(Tag::Binary as u8);
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn write_integer(value: i128, buf: &mut impl BufMut) {
    if (0..=i128::from(u8::MAX)).contains(&value) {
        buf.put_u8(Tag::SmallInteger as u8);
        buf.put_u8(value as u8);
    } else if let Ok(small) = i32::try_from(value) {
        buf.put_u8(Tag::Integer as u8);
        buf.put_i32(small);
    } else {
        let magnitude = value.unsigned_abs().to_le_bytes();
        let len = magnitude
            .iter()
            .rposition(|&b| b != 0)
            .map_or(1, |last| last + 1);
        buf.put_u8(Tag::SmallBig as u8);
        buf.put_u8(len as u8);
        buf.put_u8(u8::from(value < 0));
        buf.put_slice(&magnitude[..len]);
    }
}
