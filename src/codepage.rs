//! Single-byte code pages
//!
//! A code page is described by its upper half only: bytes below 0x80 are
//! ASCII in every page supported here. Decoding indexes the 128-entry table
//! directly. Encoding goes through a reverse table sorted by code point,
//! built on first use and shared by every stream that uses the page.

use std::fmt;
use std::sync::OnceLock;

/// A single-byte encoding whose bytes 0x80..=0xFF map through a fixed table
pub struct CodePage {
    name: &'static str,
    high: [u16; 128],
    reverse: OnceLock<Box<[(u16, u8)]>>,
}

impl CodePage {
    /// Create a code page from the code points of bytes 0x80..=0xFF
    ///
    /// The table must be injective: no two bytes may map to the same code point.
    pub const fn new(name: &'static str, high: [u16; 128]) -> Self {
        Self {
            name,
            high,
            reverse: OnceLock::new(),
        }
    }

    /// Canonical name of the page
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Decode one byte. Total over all 256 byte values.
    #[inline]
    pub fn decode_byte(&self, byte: u8) -> u16 {
        if byte < 0x80 {
            u16::from(byte)
        } else {
            self.high[usize::from(byte - 0x80)]
        }
    }

    /// Encode one code point, or `None` when the page has no byte for it
    #[inline]
    pub fn encode_codepoint(&self, codepoint: u32) -> Option<u8> {
        if codepoint < 0x80 {
            return Some(codepoint as u8);
        }
        let unit = u16::try_from(codepoint).ok()?;
        let table = self.reverse_table();
        table
            .binary_search_by_key(&unit, |&(cp, _)| cp)
            .ok()
            .map(|idx| table[idx].1)
    }

    /// The codepoint-sorted reverse table, built once
    pub fn reverse_table(&self) -> &[(u16, u8)] {
        self.reverse.get_or_init(|| {
            let mut table: Vec<(u16, u8)> = self
                .high
                .iter()
                .enumerate()
                .map(|(idx, &cp)| (cp, 0x80 + idx as u8))
                .collect();
            table.sort_unstable_by_key(|&(cp, _)| cp);
            debug_assert!(
                table.windows(2).all(|pair| pair[0].0 < pair[1].0),
                "code page {} maps two bytes to one code point",
                self.name
            );
            tracing::debug!(code_page = self.name, entries = table.len(), "built reverse table");
            table.into_boxed_slice()
        })
    }
}

impl fmt::Debug for CodePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodePage")
            .field("name", &self.name)
            .field("reverse_built", &self.reverse.get().is_some())
            .finish()
    }
}

impl PartialEq for CodePage {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CodePage {}

const fn latin1_high() -> [u16; 128] {
    let mut high = [0u16; 128];
    let mut i = 0;
    while i < 128 {
        high[i] = 0x80 + i as u16;
        i += 1;
    }
    high
}

const fn iso_8859_15_high() -> [u16; 128] {
    let mut high = latin1_high();
    high[0xA4 - 0x80] = 0x20AC; // €
    high[0xA6 - 0x80] = 0x0160; // Š
    high[0xA8 - 0x80] = 0x0161; // š
    high[0xB4 - 0x80] = 0x017D; // Ž
    high[0xB8 - 0x80] = 0x017E; // ž
    high[0xBC - 0x80] = 0x0152; // Œ
    high[0xBD - 0x80] = 0x0153; // œ
    high[0xBE - 0x80] = 0x0178; // Ÿ
    high
}

// 0x81, 0x8D, 0x8F, 0x90 and 0x9D are undefined and pass through as C1 controls.
const WINDOWS_1252_C1: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, //
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x008D, 0x017D, 0x008F, //
    0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, //
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

const fn windows_1252_high() -> [u16; 128] {
    let mut high = latin1_high();
    let mut i = 0;
    while i < WINDOWS_1252_C1.len() {
        high[i] = WINDOWS_1252_C1[i];
        i += 1;
    }
    high
}

/// ISO-8859-1 (Latin-1), Western European
pub static ISO_8859_1: CodePage = CodePage::new("ISO-8859-1", latin1_high());

/// ISO-8859-15 (Latin-9), Western European with Euro
pub static ISO_8859_15: CodePage = CodePage::new("ISO-8859-15", iso_8859_15_high());

/// Windows-1252, Western European
pub static WINDOWS_1252: CodePage = CodePage::new("Windows-1252", windows_1252_high());

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pages() -> [&'static CodePage; 3] {
        [&ISO_8859_1, &ISO_8859_15, &WINDOWS_1252]
    }

    #[test]
    fn test_reverse_tables_are_strictly_increasing() {
        for page in all_pages() {
            let table = page.reverse_table();
            assert_eq!(table.len(), 128, "{}", page.name());
            assert!(
                table.windows(2).all(|pair| pair[0].0 < pair[1].0),
                "{} is not injective",
                page.name()
            );
        }
    }

    #[test]
    fn test_reverse_table_built_once() {
        let first = WINDOWS_1252.reverse_table().as_ptr();
        let second = WINDOWS_1252.reverse_table().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reverse_table_concurrent_first_use() {
        static FRESH: CodePage = CodePage::new("Fresh-1252", windows_1252_high());
        assert!(FRESH.reverse.get().is_none());

        let tables: Vec<(usize, usize)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let table = FRESH.reverse_table();
                        (table.as_ptr() as usize, table.len())
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let first = FRESH.reverse_table().as_ptr() as usize;
        for (ptr, len) in tables {
            assert_eq!(ptr, first);
            assert_eq!(len, 128);
        }
        assert_eq!(FRESH.encode_codepoint(0x20AC), Some(0x80));
    }

    #[test]
    fn test_every_byte_round_trips() {
        for page in all_pages() {
            for byte in 0u8..=0xFF {
                let cp = page.decode_byte(byte);
                assert_eq!(
                    page.encode_codepoint(u32::from(cp)),
                    Some(byte),
                    "{} byte 0x{:02X}",
                    page.name(),
                    byte
                );
            }
        }
    }

    #[test]
    fn test_windows_1252_special_chars() {
        assert_eq!(WINDOWS_1252.decode_byte(0x80), 0x20AC);
        assert_eq!(WINDOWS_1252.decode_byte(0x99), 0x2122);
        assert_eq!(WINDOWS_1252.decode_byte(0x81), 0x0081);
        assert_eq!(WINDOWS_1252.encode_codepoint(0x20AC), Some(0x80));
        assert_eq!(WINDOWS_1252.encode_codepoint(0x0080), None);
    }

    #[test]
    fn test_iso_8859_15_euro_support() {
        assert_eq!(ISO_8859_15.decode_byte(0xA4), 0x20AC);
        assert_eq!(ISO_8859_15.encode_codepoint(0x20AC), Some(0xA4));
        // The Latin-1 currency sign it displaced is gone.
        assert_eq!(ISO_8859_15.encode_codepoint(0x00A4), None);
        assert_eq!(ISO_8859_1.encode_codepoint(0x00A4), Some(0xA4));
    }

    #[test]
    fn test_unmappable_codepoints() {
        assert_eq!(ISO_8859_1.encode_codepoint(0x0100), None);
        assert_eq!(ISO_8859_1.encode_codepoint(0x1F600), None);
        assert_eq!(WINDOWS_1252.encode_codepoint(0xFFFD), None);
    }
}
