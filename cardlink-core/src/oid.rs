//! ASN.1 object identifier encoding
//!
//! The first two components are merged into one byte as `c0 * 40 + c1`;
//! every later component is split into 7-bit groups, most significant
//! first, with the continuation bit set on all but the last group.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Encode an OID from its numeric components
///
/// # Errors
///
/// Returns [`Error::OidTooShort`] for fewer than two components and
/// [`Error::InvalidOid`] when the merged first byte does not fit.
///
/// # Examples
///
/// ```
/// use cardlink_core::oid::encode_oid;
///
/// let der = encode_oid(&[1, 3, 6, 1, 4, 1, 311, 21, 20]).unwrap();
/// assert_eq!(der.as_ref(), &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x15, 0x14]);
/// ```
pub fn encode_oid(components: &[u32]) -> Result<Bytes> {
    if components.len() < 2 {
        return Err(Error::OidTooShort {
            components: components.len(),
        });
    }

    let first = components[0]
        .checked_mul(40)
        .and_then(|v| v.checked_add(components[1]))
        .filter(|v| *v <= 0xFF)
        .ok_or_else(|| {
            Error::InvalidOid(format!(
                "first two components {}.{} do not merge into one byte",
                components[0], components[1]
            ))
        })?;

    let mut buf = BytesMut::new();
    buf.put_u8(first as u8);

    for &component in &components[2..] {
        put_base128(&mut buf, component);
    }

    Ok(buf.freeze())
}

/// Parse a dotted-decimal OID string into numeric components
pub fn parse_oid(input: &str) -> Result<Vec<u32>> {
    input
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| Error::InvalidOid(format!("bad component {:?} in {:?}", part, input)))
        })
        .collect()
}

/// Append one component as 7-bit groups with continuation bits
fn put_base128(buf: &mut BytesMut, component: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut rest = component;

    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    for i in (1..count).rev() {
        buf.put_u8(groups[i] | 0x80);
    }
    buf.put_u8(groups[0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_vector() {
        // Pinned vector: 311 splits into 0x82 0x37.
        let der = encode_oid(&[1, 3, 6, 1, 4, 1, 311, 21, 20]).unwrap();
        assert_eq!(
            der.as_ref(),
            &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x15, 0x14]
        );
    }

    #[test]
    fn test_parse_then_encode() {
        let components = parse_oid("1.3.6.1.4.1.311.21.20").unwrap();
        let der = encode_oid(&components).unwrap();
        assert_eq!(der[0], 0x2B);
        assert_eq!(der.len(), 9);
    }

    #[test]
    fn test_two_components_only() {
        let der = encode_oid(&[1, 2]).unwrap();
        assert_eq!(der.as_ref(), &[42]);
    }

    #[test]
    fn test_large_component_groups() {
        // 0x4000 needs three 7-bit groups: 81 80 00.
        let der = encode_oid(&[1, 2, 0x4000]).unwrap();
        assert_eq!(der.as_ref(), &[42, 0x81, 0x80, 0x00]);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(encode_oid(&[1]), Err(Error::OidTooShort { components: 1 }));
        assert_eq!(encode_oid(&[]), Err(Error::OidTooShort { components: 0 }));
    }

    #[test]
    fn test_unmergeable_first_pair() {
        assert!(matches!(encode_oid(&[7, 0]), Err(Error::InvalidOid(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_oid("1.3.x"), Err(Error::InvalidOid(_))));
    }
}
