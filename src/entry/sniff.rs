//! Guessing what kind of data an attachment holds.

/// What we say when we have no idea.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Looks at some bytes and names their media type.
pub trait ContentSniffer {
    /// Detect the media type of `bytes`. Returns [`OCTET_STREAM`] when the
    /// data isn't recognized.
    fn detect(&self, bytes: &[u8]) -> String;
}

/// Did the sniffer give up?
pub fn is_inconclusive(media_type: &str) -> bool {
    media_type == OCTET_STREAM
}

/// Magic number prefixes.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x1a\x45\xdf\xa3", "video/webm"),
];

/// Detects media types from magic numbers, falling back to `text/plain` for
/// anything that's valid UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

impl MagicSniffer {
    fn riff(bytes: &[u8]) -> Option<&'static str> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" {
            return None;
        }
        match &bytes[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        }
    }

    fn iso_media(bytes: &[u8]) -> Option<&'static str> {
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            Some("video/mp4")
        } else {
            None
        }
    }

    fn text(bytes: &[u8]) -> Option<&'static str> {
        let text = std::str::from_utf8(bytes).ok()?;
        let head = text.trim_start().get(..14).unwrap_or("").to_ascii_lowercase();
        if head.starts_with("<!doctype html") || head.starts_with("<html") {
            Some("text/html")
        } else if head.starts_with("<svg") {
            Some("image/svg+xml")
        } else {
            Some("text/plain")
        }
    }
}

impl ContentSniffer for MagicSniffer {
    fn detect(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return OCTET_STREAM.into();
        }
        SIGNATURES
            .iter()
            .find(|(magic, _)| bytes.starts_with(magic))
            .map(|(_, media_type)| *media_type)
            .or_else(|| Self::riff(bytes))
            .or_else(|| Self::iso_media(bytes))
            .or_else(|| Self::text(bytes))
            .unwrap_or(OCTET_STREAM)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_magic() {
        let sniffer = MagicSniffer;
        assert_eq!(sniffer.detect(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniffer.detect(b"\xff\xd8\xff\xe0\0\x10JFIF"), "image/jpeg");
        assert_eq!(sniffer.detect(b"GIF89a\x01\0"), "image/gif");
        assert_eq!(sniffer.detect(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniffer.detect(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniffer.detect(b"RIFF\x24\0\0\0WAVEfmt "), "audio/wav");
        assert_eq!(sniffer.detect(b"\0\0\0\x18ftypmp42"), "video/mp4");
    }

    #[test]
    fn sniff_text() {
        let sniffer = MagicSniffer;
        assert_eq!(sniffer.detect(b"hello there"), "text/plain");
        assert_eq!(sniffer.detect("ünïcødé".as_bytes()), "text/plain");
        assert_eq!(sniffer.detect(b"  <!DOCTYPE html><html></html>"), "text/html");
        assert_eq!(sniffer.detect(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), "image/svg+xml");
    }

    #[test]
    fn sniff_unknown() {
        let sniffer = MagicSniffer;
        assert_eq!(sniffer.detect(b""), OCTET_STREAM);
        assert_eq!(sniffer.detect(&[0xc3, 0x28, 0xa0, 0xa1]), OCTET_STREAM);
        assert!(is_inconclusive(&sniffer.detect(&[0xfe, 0xed, 0xfa, 0xce, 0xff])));
        assert!(!is_inconclusive("image/png"));
    }
}
