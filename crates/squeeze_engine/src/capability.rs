//! WebP decode-capability detection.

/// Minimal 1x1 lossless WebP used to feature-detect decode support.
const WEBP_SAMPLE: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x1e, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
    0x4c, 0x11, 0x00, 0x00, 0x00, 0x2f, 0x00, 0x00, 0x00, 0x00, 0x07, 0xd0, 0xff, 0xfe, 0xf7,
    0xbf, 0xff, 0x81, 0x88, 0xe8, 0x7f, 0x00, 0x00,
];

/// Whether `bytes` decode as a WebP image.
pub fn can_decode_webp(bytes: &[u8]) -> bool {
    image::load_from_memory_with_format(bytes, image::ImageFormat::WebP).is_ok()
}

/// Probes WebP decode support once at session start.
///
/// Any failure means "unsupported"; the session then asks the proxy for
/// JPEG output instead.
pub fn detect_webp_support() -> bool {
    can_decode_webp(WEBP_SAMPLE)
}
