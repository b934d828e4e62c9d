use crate::error::ParseError;

macro_rules! read_as {
    ($ty:ty, $buf:ident, $start:expr) => {{
        let end = $start + std::mem::size_of::<$ty>();
        <$ty>::from_be_bytes($buf[$start..end].try_into().unwrap())
    }};
}
pub(crate) use read_as;

/// Fails unless `buf` holds at least `needed` bytes.
#[inline]
pub(crate) fn ensure_len(buf: &[u8], needed: usize) -> Result<(), ParseError> {
    if buf.len() < needed {
        Err(ParseError::UnexpectedEndOfData(buf.len()))
    } else {
        Ok(())
    }
}

/// Pads `s` on the right with underscores up to `width` characters, the way
/// identifiers are laid out in xRIT file names.
pub(crate) fn underscore_padded(s: &str, width: usize) -> String {
    let mut padded = String::with_capacity(width.max(s.len()));
    padded.push_str(s);
    while padded.len() < width {
        padded.push('_');
    }
    padded
}

/// Reads a fixed-width ASCII field, dropping trailing blanks and NULs.
pub(crate) fn ascii_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\0', ' '])
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_big_endian_values() {
        let buf = [0x00, 0x01, 0xff, 0xff, 0xff, 0xfe];
        assert_eq!(read_as!(u16, buf, 0), 1);
        assert_eq!(read_as!(i32, buf, 2), -2);
    }

    #[test]
    fn length_check() {
        assert!(ensure_len(&[0; 4], 4).is_ok());
        assert_eq!(
            ensure_len(&[0; 3], 4),
            Err(ParseError::UnexpectedEndOfData(3))
        );
    }

    macro_rules! test_underscore_padding {
        ($(($name:ident, $input:expr, $width:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!(underscore_padded($input, $width), $expected);
            }
        )*);
    }

    test_underscore_padding! {
        (padding_short_identifier, "MSG1", 12, "MSG1________"),
        (padding_exact_identifier, "IR_108___", 9, "IR_108___"),
        (padding_long_identifier, "LONGER_THAN", 4, "LONGER_THAN"),
        (padding_placeholder, "_", 9, "_________"),
    }

    #[test]
    fn ascii_field_trimming() {
        assert_eq!(ascii_field(b"GEOS(+000.0)    \0\0"), "GEOS(+000.0)");
    }
}
