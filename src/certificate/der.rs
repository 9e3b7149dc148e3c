//! Just enough DER to walk an X.509 certificate.
//!
//! Every read returns `None` on malformed input; callers decide whether that
//! is an error or simply means "not there".

use std::fmt;

pub(crate) const BOOLEAN: u8 = 0x01;
pub(crate) const OCTET_STRING: u8 = 0x04;
pub(crate) const OBJECT_IDENTIFIER: u8 = 0x06;
pub(crate) const UTF8_STRING: u8 = 0x0c;
pub(crate) const PRINTABLE_STRING: u8 = 0x13;
pub(crate) const IA5_STRING: u8 = 0x16;
pub(crate) const SEQUENCE: u8 = 0x30;
pub(crate) const SET: u8 = 0x31;
pub(crate) const CONTEXT_0: u8 = 0xa0;
pub(crate) const CONTEXT_3: u8 = 0xa3;

/// A single tag-length-value element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tlv<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// The contents of a string type as text.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.tag {
            UTF8_STRING | PRINTABLE_STRING | IA5_STRING => std::str::from_utf8(self.value).ok(),
            _ => None,
        }
    }

    /// A reader over the contents of a constructed element.
    pub fn reader(&self) -> Reader<'a> {
        Reader::new(self.value)
    }
}

/// Reads consecutive elements from a buffer.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader { input }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.input.first().copied()
    }

    pub fn read(&mut self) -> Option<Tlv<'a>> {
        let (&tag, rest) = self.input.split_first()?;

        // High tag numbers never show up in the structures we read.
        if tag & 0x1f == 0x1f {
            return None;
        }

        let (&first, rest) = rest.split_first()?;

        let (len, rest) = if first < 0x80 {
            (first as usize, rest)
        } else {
            let count = (first & 0x7f) as usize;

            // 0x80 is the BER indefinite form, not allowed in DER.
            if count == 0 || count > std::mem::size_of::<usize>() || rest.len() < count {
                return None;
            }

            let (len_bytes, rest) = rest.split_at(count);
            let len = len_bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);

            (len, rest)
        };

        if rest.len() < len {
            return None;
        }

        let (value, rest) = rest.split_at(len);
        self.input = rest;

        Some(Tlv { tag, value })
    }

    /// Reads the next element, failing if it does not carry `tag`.
    pub fn expect(&mut self, tag: u8) -> Option<Tlv<'a>> {
        match self.read()? {
            tlv if tlv.tag == tag => Some(tlv),
            _ => None,
        }
    }
}

/// Dotted decimal notation of an encoded object identifier.
///
/// Arcs may be of any width, e.g. the 128 bit UUID arcs under `2.25`.
pub(crate) fn decode_oid(bytes: &[u8]) -> Option<String> {
    let mut arcs = Vec::new();
    let mut current = Arc::default();

    for (i, byte) in bytes.iter().enumerate() {
        current.mul_add(128, u32::from(byte & 0x7f));

        if byte & 0x80 == 0 {
            arcs.push(std::mem::take(&mut current));
        } else if i == bytes.len() - 1 {
            return None;
        }
    }

    let (first, rest) = arcs.split_first_mut()?;
    let (root, second) = match first.small() {
        Some(value) if value < 40 => (0, Arc::from(value)),
        Some(value) if value < 80 => (1, Arc::from(value - 40)),
        _ => {
            first.sub(80);
            (2, std::mem::take(first))
        }
    };

    let mut oid = format!("{}.{}", root, second);

    for arc in rest {
        oid.push('.');
        oid.push_str(&arc.to_string());
    }

    Some(oid)
}

const LIMB: u64 = 1_000_000_000;

/// An unbounded arc value in base 10^9 limbs, least significant first.
#[derive(Debug, Default)]
struct Arc {
    limbs: Vec<u32>,
}

impl From<u32> for Arc {
    fn from(value: u32) -> Self {
        let mut arc = Arc::default();
        arc.mul_add(1, value);
        arc
    }
}

impl Arc {
    fn mul_add(&mut self, factor: u32, addend: u32) {
        let mut carry = u64::from(addend);

        for limb in self.limbs.iter_mut() {
            let value = u64::from(*limb) * u64::from(factor) + carry;
            *limb = (value % LIMB) as u32;
            carry = value / LIMB;
        }

        while carry > 0 {
            self.limbs.push((carry % LIMB) as u32);
            carry /= LIMB;
        }
    }

    /// Only called with `self >= value`.
    fn sub(&mut self, value: u32) {
        let mut borrow = u64::from(value);

        for limb in self.limbs.iter_mut() {
            if borrow == 0 {
                break;
            }

            let current = u64::from(*limb);

            if current >= borrow {
                *limb = (current - borrow) as u32;
                borrow = 0;
            } else {
                *limb = (current + LIMB - borrow) as u32;
                borrow = 1;
            }
        }

        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    fn small(&self) -> Option<u32> {
        match self.limbs.as_slice() {
            [] => Some(0),
            [value] => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((most, rest)) = self.limbs.split_last() else {
            return f.write_str("0");
        };

        write!(f, "{}", most)?;

        for limb in rest.iter().rev() {
            write!(f, "{:09}", limb)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_short_form() {
        let mut reader = Reader::new(&[0x0c, 0x03, b'a', b'p', b'p', 0x05, 0x00]);

        let tlv = reader.read().unwrap();
        assert_eq!(UTF8_STRING, tlv.tag);
        assert_eq!(Some("app"), tlv.as_str());

        let tlv = reader.read().unwrap();
        assert_eq!(0x05, tlv.tag);
        assert!(tlv.value.is_empty());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_long_form() {
        let mut input = vec![OCTET_STRING, 0x81, 0x80];
        input.extend_from_slice(&[0xab; 0x80]);

        let tlv = Reader::new(&input).read().unwrap();
        assert_eq!(0x80, tlv.value.len());
    }

    #[test]
    fn test_read_truncated() {
        assert_eq!(None, Reader::new(&[SEQUENCE, 0x05, 0x01]).read());
        assert_eq!(None, Reader::new(&[SEQUENCE]).read());
        assert_eq!(None, Reader::new(&[SEQUENCE, 0x82, 0x01]).read());
    }

    #[test]
    fn test_read_indefinite_length() {
        assert_eq!(None, Reader::new(&[SEQUENCE, 0x80, 0x00, 0x00]).read());
    }

    #[test]
    fn test_expect_wrong_tag() {
        assert_eq!(None, Reader::new(&[SET, 0x00]).expect(SEQUENCE));
    }

    #[test]
    fn test_decode_oid() {
        let universal = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x63, 0x64, 0x06, 0x03, 0x06];
        assert_eq!(Some("1.2.840.113635.100.6.3.6".to_string()), decode_oid(&universal));

        let uid = [0x09, 0x92, 0x26, 0x89, 0x93, 0xf2, 0x2c, 0x64, 0x01, 0x01];
        assert_eq!(Some("0.9.2342.19200300.100.1.1".to_string()), decode_oid(&uid));
    }

    #[test]
    fn test_decode_oid_uuid_arc() {
        // 2.25.329800735698586629295641978511506172918
        let oid = [
            0x69, 0x83, 0xf0, 0x9d, 0xa7, 0xeb, 0xcf, 0xde, 0xe0, 0xc7, 0xa1, 0xa7, 0xb2, 0xc0, 0x94, 0x8c, 0xc8, 0xf9,
            0xd7, 0x76,
        ];

        assert_eq!(
            Some("2.25.329800735698586629295641978511506172918".to_string()),
            decode_oid(&oid)
        );
    }

    #[test]
    fn test_decode_oid_wide_first_arc() {
        // 2.999 shares its first subidentifier with the root arc
        assert_eq!(Some("2.999.3".to_string()), decode_oid(&[0x88, 0x37, 0x03]));
    }

    #[test]
    fn test_decode_oid_truncated() {
        assert_eq!(None, decode_oid(&[0x2a, 0x86]));
        assert_eq!(None, decode_oid(&[]));
    }
}
