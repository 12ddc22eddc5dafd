//! Private utility module
pub use byteordered::Endianness;

/// Byte order of every data block decoded by this crate.
///
/// NRRD files declare an `endian` field, but the loader always reads data
/// as little endian.
pub const DATA_ENDIANNESS: Endianness = Endianness::Little;

/// Locate the blank line separating a text header from its data block.
///
/// Returns the length of the header text (excluding the blank line) and the
/// offset of the first data byte. Both `\n\n` and `\r\n\r\n` are accepted.
pub fn find_header_end(bytes: &[u8]) -> Option<(usize, usize)> {
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            if bytes[i - 1] == b'\n' {
                return Some((i - 1, i + 1));
            }
            if i >= 2 && bytes[i - 1] == b'\r' && bytes[i - 2] == b'\n' {
                return Some((i - 2, i + 1));
            }
        }
        i += 1;
    }
    None
}

/// Round to the nearest integer, with halves rounded up.
///
/// This differs from `f32::round` for negative halves, which matters for
/// colour channels computed from decreasing gradients.
#[inline]
pub fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Convert a floating point channel value to a byte, rounding half up and
/// saturating at the byte range.
#[inline]
pub fn channel_to_u8(value: f32) -> u8 {
    round_half_up(value).max(0.).min(255.) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_end_lf() {
        let bytes = b"NRRD0004\ntype: int\n\n\x01\x02";
        assert_eq!(find_header_end(bytes), Some((18, 20)));
        assert_eq!(&bytes[..18], b"NRRD0004\ntype: int".as_ref());
    }

    #[test]
    fn header_end_crlf() {
        let bytes = b"NRRD0004\r\ntype: int\r\n\r\n\x01";
        let (header_len, data_start) = find_header_end(bytes).unwrap();
        assert_eq!(&bytes[..header_len], b"NRRD0004\r\ntype: int\r".as_ref());
        assert_eq!(&bytes[data_start..], b"\x01".as_ref());
    }

    #[test]
    fn header_end_missing() {
        assert_eq!(find_header_end(b"NRRD0004\ntype: int\n"), None);
        assert_eq!(find_header_end(b""), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_half_up(127.5), 128.);
        assert_eq!(round_half_up(-0.5), 0.);
        assert_eq!(channel_to_u8(300.), 255);
        assert_eq!(channel_to_u8(-3.), 0);
        assert_eq!(channel_to_u8(12.49), 12);
    }
}
