//! Term decoding.

use bytes::Buf;
use tracing::{debug, trace};

use crate::FORMAT_VERSION;
use crate::error::{EtfError, EtfResult};
use crate::tag::Tag;
use crate::term::Term;

/// Default nesting limit for lists and maps.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Decode a complete payload with the default depth limit.
pub fn decode(payload: &[u8]) -> EtfResult<Term> {
    Decoder::new().decode(payload)
}

/// Configurable payload decoder.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply lists and maps may nest.
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decode a payload. The whole input must be consumed by one root term.
    pub fn decode(&self, payload: &[u8]) -> EtfResult<Term> {
        trace!(bytes = payload.len(), "decoding term payload");
        let result = self.decode_inner(payload);
        if let Err(ref err) = result {
            debug!(code = err.code(), error = %err, "term payload rejected");
        }
        result
    }

    fn decode_inner(&self, payload: &[u8]) -> EtfResult<Term> {
        let mut reader = Reader {
            buf: payload,
            max_depth: self.max_depth,
        };
        let version = reader.u8()?;
        if version != FORMAT_VERSION {
            return Err(EtfError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: version,
            });
        }
        let term = reader.term(0)?;
        match reader.buf.remaining() {
            0 => Ok(term),
            n => Err(EtfError::TrailingBytes(n)),
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    max_depth: usize,
}

impl<'a> Reader<'a> {
    fn need(&self, needed: usize) -> EtfResult<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            Err(EtfError::UnexpectedEof { needed, remaining })
        } else {
            Ok(())
        }
    }

    fn u8(&mut self) -> EtfResult<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self) -> EtfResult<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    fn u32(&mut self) -> EtfResult<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn bytes(&mut self, len: usize) -> EtfResult<&'a [u8]> {
        self.need(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn term(&mut self, depth: usize) -> EtfResult<Term> {
        let raw = self.u8()?;
        let tag = Tag::from_u8(raw).ok_or(EtfError::UnknownTag(raw))?;
        match tag {
            Tag::SmallInteger => Ok(Term::Integer(i128::from(self.u8()?))),
            Tag::Integer => {
                self.need(4)?;
                Ok(Term::Integer(i128::from(self.buf.get_i32())))
            }
            Tag::NewFloat => {
                self.need(8)?;
                Ok(Term::Float(self.buf.get_f64()))
            }
            Tag::SmallBig => {
                let len = usize::from(self.u8()?);
                self.big(len)
            }
            Tag::LargeBig => {
                let len = self.u32()? as usize;
                self.big(len)
            }
            Tag::Atom | Tag::AtomUtf8 => {
                let len = usize::from(self.u16()?);
                self.atom(tag, len)
            }
            Tag::SmallAtom | Tag::SmallAtomUtf8 => {
                let len = usize::from(self.u8()?);
                self.atom(tag, len)
            }
            Tag::Binary => {
                let len = self.u32()? as usize;
                Ok(Term::Binary(self.bytes(len)?.to_vec()))
            }
            Tag::String => {
                let len = usize::from(self.u16()?);
                Ok(Term::Binary(self.bytes(len)?.to_vec()))
            }
            Tag::Nil => Ok(Term::List(Vec::new())),
            Tag::List => {
                let depth = self.descend(depth)?;
                let len = self.u32()? as usize;
                // every element takes at least one byte
                self.need(len)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.term(depth)?);
                }
                if self.u8()? != Tag::Nil as u8 {
                    return Err(EtfError::ImproperList);
                }
                Ok(Term::List(items))
            }
            Tag::Map => {
                let depth = self.descend(depth)?;
                let arity = self.u32()? as usize;
                self.need(arity.saturating_mul(2))?;
                let mut entries = Vec::with_capacity(arity);
                for _ in 0..arity {
                    let key = self.term(depth)?;
                    let value = self.term(depth)?;
                    entries.push((key, value));
                }
                Ok(Term::Map(entries))
            }
        }
    }

    fn descend(&self, depth: usize) -> EtfResult<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            Err(EtfError::DepthExceeded(self.max_depth))
        } else {
            Ok(next)
        }
    }

    fn atom(&mut self, tag: Tag, len: usize) -> EtfResult<Term> {
        let raw = self.bytes(len)?;
        let name = match tag {
            // latin-1: every byte maps to the code point of the same value
            Tag::Atom | Tag::SmallAtom => raw.iter().map(|&b| char::from(b)).collect(),
            _ => std::str::from_utf8(raw)
                .map_err(|_| EtfError::InvalidUtf8)?
                .to_owned(),
        };
        Ok(match name.as_str() {
            "nil" | "null" => Term::Nil,
            "true" => Term::Bool(true),
            "false" => Term::Bool(false),
            _ => Term::Atom(name),
        })
    }

    fn big(&mut self, len: usize) -> EtfResult<Term> {
        let sign = self.u8()?;
        let digits = self.bytes(len)?;
        if len > 16 {
            return Err(EtfError::IntegerOutOfRange(len));
        }
        let mut le = [0u8; 16];
        le[..len].copy_from_slice(digits);
        let magnitude = u128::from_le_bytes(le);
        let value = if sign == 0 {
            i128::try_from(magnitude).map_err(|_| EtfError::IntegerOutOfRange(len))?
        } else if magnitude == i128::MIN.unsigned_abs() {
            i128::MIN
        } else {
            -i128::try_from(magnitude).map_err(|_| EtfError::IntegerOutOfRange(len))?
        };
        Ok(Term::Integer(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_version_mismatch() {
        let err = decode(&[130, 97, 1]).unwrap_err();
        assert_eq!(
            err,
            EtfError::VersionMismatch {
                expected: 131,
                found: 130
            }
        );
    }

    #[test]
    fn test_decode_empty_payload() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, EtfError::UnexpectedEof { needed: 1, .. }));
    }

    #[test]
    fn test_decode_truncated_binary() {
        let err = decode(&[131, 109, 0, 0, 0, 5, b'a']).unwrap_err();
        assert_eq!(
            err,
            EtfError::UnexpectedEof {
                needed: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let err = decode(&[131, 97, 1, 0, 0]).unwrap_err();
        assert_eq!(err, EtfError::TrailingBytes(2));
    }

    #[test]
    fn test_decode_unknown_tag() {
        let err = decode(&[131, 104, 0]).unwrap_err();
        assert_eq!(err, EtfError::UnknownTag(104));
    }

    #[test]
    fn test_decode_latin1_atom() {
        let term = decode(&[131, 115, 3, b'f', 0xe9, b'e']).unwrap();
        assert_eq!(term, Term::Atom("f\u{e9}e".to_string()));
    }

    #[test]
    fn test_decode_null_atom() {
        let term = decode(&[131, 100, 0, 4, b'n', b'u', b'l', b'l']).unwrap();
        assert_eq!(term, Term::Nil);
    }

    #[test]
    fn test_decode_string_ext_as_binary() {
        let term = decode(&[131, 107, 0, 2, b'o', b'k']).unwrap();
        assert_eq!(term, Term::binary("ok"));
    }

    #[test]
    fn test_decode_improper_list() {
        let err = decode(&[131, 108, 0, 0, 0, 1, 97, 1, 97, 2]).unwrap_err();
        assert_eq!(err, EtfError::ImproperList);
    }

    #[test]
    fn test_decode_large_big() {
        let term = decode(&[131, 111, 0, 0, 0, 2, 1, 0, 1]).unwrap();
        assert_eq!(term, Term::Integer(-256));
    }

    #[test]
    fn test_decode_big_out_of_range() {
        let mut payload = vec![131, 110, 17, 0];
        payload.extend(std::iter::repeat_n(0xff, 17));
        assert_eq!(decode(&payload).unwrap_err(), EtfError::IntegerOutOfRange(17));
    }

    #[test]
    fn test_depth_limit() {
        let nested = Term::List(vec![Term::List(vec![Term::List(vec![Term::Nil])])]);
        let bytes = encode(&nested);

        assert!(Decoder::new().with_max_depth(3).decode(&bytes).is_ok());
        assert_eq!(
            Decoder::new().with_max_depth(2).decode(&bytes).unwrap_err(),
            EtfError::DepthExceeded(2)
        );
    }

    #[test]
    fn test_huge_declared_length_fails_fast() {
        let err = decode(&[131, 108, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, EtfError::UnexpectedEof { .. }));
    }
}
