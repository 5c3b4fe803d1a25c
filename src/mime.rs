//! Content type detection from magic bytes, used when an upload does not
//! name its own content type.

/// content type used when nothing matches
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the media type of `data` from its leading bytes
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if data.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if riff(data, b"WEBP") {
        return Some("image/webp");
    }
    if riff(data, b"WAVE") {
        return Some("audio/vnd.wave");
    }
    if data.starts_with(b"BM") && data.len() >= 14 {
        return Some("image/bmp");
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some("image/tiff");
    }
    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if data.starts_with(&[0x1f, 0x8b, 0x08]) {
        return Some("application/gzip");
    }
    if data.starts_with(b"PK\x03\x04") {
        return Some("application/zip");
    }
    if data.starts_with(b"OggS") {
        return Some("audio/ogg");
    }
    if data.starts_with(&[0x1a, 0x45, 0xdf, 0xa3]) {
        return Some(ebml(data));
    }
    if let Some(brand) = ftyp_brand(data) {
        return Some(match brand {
            b"M4A " | b"M4B " => "audio/x-m4a",
            b"qt  " => "video/quicktime",
            b"3gp4" | b"3gp5" | b"3g2a" => "video/3gpp",
            _ => "video/mp4",
        });
    }
    if data.starts_with(b"ID3") || mpeg_frame_sync(data) {
        return Some("audio/mpeg");
    }
    None
}

/// [`sniff`] with the `application/octet-stream` fallback
pub fn sniff_or_default(data: &[u8]) -> &'static str {
    sniff(data).unwrap_or(OCTET_STREAM)
}

fn riff(data: &[u8], form: &[u8; 4]) -> bool {
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == form
}

// ISO base media: 4 byte box size, then `ftyp` and the major brand
fn ftyp_brand(data: &[u8]) -> Option<&[u8]> {
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        Some(&data[8..12])
    } else {
        None
    }
}

fn ebml(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(64)];
    if head.windows(4).any(|w| w == b"webm") {
        "video/webm"
    } else {
        "video/x-matroska"
    }
}

fn mpeg_frame_sync(data: &[u8]) -> bool {
    // layer III only, any version
    data.len() >= 2 && data[0] == 0xff && (data[1] & 0xe6) == 0xe2
}
