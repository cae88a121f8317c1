//! UTF-16 code unit classification and surrogate pair arithmetic
//!
//! Callers validate their input before combining or splitting, so none of
//! these functions report errors.

/// Lowest code point that needs a surrogate pair in UTF-16
pub const SUPPLEMENTARY_START: u32 = 0x10000;

/// Highest valid Unicode code point
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Byte order mark code point
pub const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// Default decode-side replacement character
pub const REPLACEMENT_CHARACTER: u16 = 0xFFFD;

/// True for units in 0xD800..=0xDBFF
#[inline]
pub fn is_high_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xD800
}

/// True for units in 0xDC00..=0xDFFF
#[inline]
pub fn is_low_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xDC00
}

/// True for any unit in 0xD800..=0xDFFF
#[inline]
pub fn is_surrogate(unit: u16) -> bool {
    unit & 0xF800 == 0xD800
}

/// Combine a high and low surrogate into the code point they encode
#[inline]
pub fn combine(high: u16, low: u16) -> u32 {
    debug_assert!(is_high_surrogate(high) && is_low_surrogate(low));
    ((u32::from(high) & 0x3FF) << 10) + (u32::from(low) & 0x3FF) + SUPPLEMENTARY_START
}

/// Split a supplementary code point into its (high, low) surrogate pair
#[inline]
pub fn split_to_surrogate_pair(codepoint: u32) -> (u16, u16) {
    debug_assert!((SUPPLEMENTARY_START..=MAX_CODEPOINT).contains(&codepoint));
    let offset = codepoint - SUPPLEMENTARY_START;
    let high = 0xD800 | ((offset >> 10) & 0x3FF) as u16;
    let low = 0xDC00 | (offset & 0x3FF) as u16;
    (high, low)
}

/// True for UTF-8 continuation bytes (0b10xx_xxxx)
#[inline]
pub fn is_continuation_byte(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(is_high_surrogate(0xD800));
        assert!(is_high_surrogate(0xDBFF));
        assert!(!is_high_surrogate(0xDC00));
        assert!(is_low_surrogate(0xDC00));
        assert!(is_low_surrogate(0xDFFF));
        assert!(!is_low_surrogate(0xDBFF));
        assert!(is_surrogate(0xD800));
        assert!(is_surrogate(0xDFFF));
        assert!(!is_surrogate(0xD7FF));
        assert!(!is_surrogate(0xE000));
    }

    #[test]
    fn test_combine_and_split() {
        assert_eq!(combine(0xD83D, 0xDE00), 0x1F600);
        assert_eq!(split_to_surrogate_pair(0x1F600), (0xD83D, 0xDE00));
        assert_eq!(split_to_surrogate_pair(0x10000), (0xD800, 0xDC00));
        assert_eq!(split_to_surrogate_pair(0x10FFFF), (0xDBFF, 0xDFFF));
    }

    #[test]
    fn test_pair_arithmetic_matches_std() {
        for ch in ['\u{10000}', '\u{1F600}', '\u{2A6D6}', '\u{10FFFF}'] {
            let mut buf = [0u16; 2];
            ch.encode_utf16(&mut buf);
            assert_eq!(split_to_surrogate_pair(ch as u32), (buf[0], buf[1]));
            assert_eq!(combine(buf[0], buf[1]), ch as u32);
        }
    }

    #[test]
    fn test_continuation_byte() {
        assert!(is_continuation_byte(0x80));
        assert!(is_continuation_byte(0xBF));
        assert!(!is_continuation_byte(0x7F));
        assert!(!is_continuation_byte(0xC0));
    }
}
