use std::fmt;

use encoding_rs::{Decoder, Encoding, UTF_8, WINDOWS_1252};

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum TextEncoding {
    Ascii,
    Utf8,
    Latin1,
    Windows1252,
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::Ascii
    }
}

impl TextEncoding {
    pub const fn available_variants() -> &'static [&'static str] {
        &["ascii", "utf-8", "latin1", "windows-1252"]
    }

    pub fn for_label(label: &str) -> Option<TextEncoding> {
        let encoding = match label.to_ascii_lowercase().as_str() {
            "ascii" | "us-ascii" => TextEncoding::Ascii,
            "utf-8" | "utf8" => TextEncoding::Utf8,
            "latin1" | "latin-1" | "iso-8859-1" => TextEncoding::Latin1,
            "windows-1252" | "cp1252" => TextEncoding::Windows1252,
            _ => return None,
        };

        Some(encoding)
    }

    // windows-1252 is the ASCII-compatible single-byte codec; the ascii and
    // latin1 labels are byte-identical to it on their own ranges.
    fn encoding(self) -> &'static Encoding {
        use TextEncoding::*;

        match self {
            Utf8 => UTF_8,
            Ascii | Latin1 | Windows1252 => WINDOWS_1252,
        }
    }

    pub fn new_decoder(self) -> Decoder {
        self.encoding().new_decoder_with_bom_removal()
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding().encode(text);
        bytes.into_owned()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TextEncoding::*;

        let s = match self {
            Ascii => "ASCII",
            Utf8 => "UTF-8",
            Latin1 => "Latin-1",
            Windows1252 => "Windows-1252",
        };

        write!(f, "{}", s)
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(TextEncoding::for_label("ascii"), Some(TextEncoding::Ascii));
        assert_eq!(TextEncoding::for_label("UTF-8"), Some(TextEncoding::Utf8));
        assert_eq!(
            TextEncoding::for_label("cp1252"),
            Some(TextEncoding::Windows1252)
        );
        assert_eq!(TextEncoding::for_label("ebcdic"), None);
    }

    #[test]
    fn ascii_encode_is_passthrough() {
        assert_eq!(TextEncoding::Ascii.encode("hello"), b"hello");
    }

    #[test]
    fn latin1_high_byte_decodes() {
        let mut decoder = TextEncoding::Latin1.new_decoder();
        let mut out = String::with_capacity(8);
        let _ = decoder.decode_to_string(&[0xe9], &mut out, true);
        assert_eq!(out, "\u{e9}");
    }

    #[test]
    fn utf8_round_trips() {
        let text = "h\u{e9}llo";
        let bytes = TextEncoding::Utf8.encode(text);
        assert_eq!(bytes, text.as_bytes());
    }

    #[test]
    fn display() {
        assert_eq!(TextEncoding::Ascii.to_string(), "ASCII");
        assert_eq!(format!("{:?}", TextEncoding::Utf8), "UTF-8");
    }
}
