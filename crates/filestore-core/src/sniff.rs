//! Magic-byte content-type sniffing.
//!
//! The registered content type always comes from the object's leading bytes,
//! never from the caller or the filename extension.

/// How many leading bytes of an object are fetched for sniffing.
pub const SNIFF_WINDOW_BYTES: u64 = 8192;

/// Sniff the MIME type from the leading bytes of an object. Returns `None`
/// when no known magic-byte signature matches.
pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
    infer::get(header).map(|kind| kind.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];
    const PDF_MAGIC: &[u8] = b"%PDF-1.7\n";

    #[test]
    fn detects_png_regardless_of_claimed_extension() {
        assert_eq!(sniff_mime(PNG_MAGIC), Some("image/png"));
    }

    #[test]
    fn detects_jpeg_and_pdf() {
        assert_eq!(sniff_mime(JPEG_MAGIC), Some("image/jpeg"));
        assert_eq!(sniff_mime(PDF_MAGIC), Some("application/pdf"));
    }

    #[test]
    fn unknown_bytes_yield_none() {
        assert_eq!(sniff_mime(b"plain text, no signature"), None);
        assert_eq!(sniff_mime(&[]), None);
    }
}
