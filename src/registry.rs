//! Name lookup and Accept-Charset header generation
//!
//! The registry is an ordered list of entries. A lookup returns the codec of
//! the first entry with a matching alias. Matching ignores ASCII case and the
//! separators `-`, `_` and space, so `utf8`, `UTF-8` and `Utf_8` are the same name.

use crate::Codec;

#[derive(Debug, Clone)]
struct Entry {
    aliases: Vec<String>,
    codec: Codec,
    quality: f32,
}

/// Ordered set of named codecs
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(Codec::UTF8, &["UTF-8", "unicode-1-1-utf-8"], 1.0)
            .register(Codec::UTF16LE, &["UTF-16LE", "UTF-16", "UCS-2"], 0.8)
            .register(Codec::UTF16BE, &["UTF-16BE"], 0.8)
            .register(
                Codec::iso_8859_1(),
                &["ISO-8859-1", "ISO_8859-1:1987", "latin1", "l1", "CP819", "IBM819"],
                0.7,
            )
            .register(Codec::windows_1252(), &["Windows-1252", "CP1252", "WIN1252"], 0.7)
            .register(Codec::iso_8859_15(), &["ISO-8859-15", "latin9", "l9"], 0.6)
            .register(
                Codec::ASCII,
                &["US-ASCII", "ASCII", "ANSI_X3.4-1968", "ISO646-US", "CP367", "IBM367"],
                0.5,
            );
        registry
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry; earlier entries win on lookup
    ///
    /// `quality` is clamped to 0.0..=1.0.
    pub fn register(&mut self, codec: Codec, aliases: &[&str], quality: f32) -> &mut Self {
        self.entries.push(Entry {
            aliases: aliases.iter().map(|alias| normalize(alias)).collect(),
            codec,
            quality: quality.clamp(0.0, 1.0),
        });
        self
    }

    /// Find the codec registered under `name`
    pub fn lookup(&self, name: &str) -> Option<Codec> {
        let wanted = normalize(name);
        let found = self
            .entries
            .iter()
            .find(|entry| entry.aliases.iter().any(|alias| *alias == wanted))
            .map(|entry| entry.codec);
        if found.is_none() {
            tracing::debug!(name, "no codec registered under name");
        }
        found
    }

    /// Registered codecs and their quality weights, in order
    pub fn codecs(&self) -> impl Iterator<Item = (Codec, f32)> + '_ {
        self.entries.iter().map(|entry| (entry.codec, entry.quality))
    }

    /// Build an Accept-Charset header value such as `UTF-8,UTF-16LE;q=0.8`
    pub fn accept_charset(&self) -> String {
        self.codecs()
            .map(|(codec, quality)| {
                if quality >= 1.0 {
                    codec.name().to_string()
                } else {
                    format!("{};q={}", codec.name(), format_quality(quality))
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn format_quality(quality: f32) -> String {
    let fixed = format!("{quality:.3}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
