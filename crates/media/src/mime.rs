//! Content type to file extension mapping.

/// File extension (with leading dot) for an attachment content type.
///
/// Parameters such as `; charset=...` are ignored. Unknown types yield `None`
/// so the filename is left without an extension.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let ext = match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/tiff" => ".tiff",
        "image/heic" => ".heic",
        "image/heif" => ".heif",
        "video/mp4" => ".mp4",
        "video/3gpp" => ".3gp",
        "video/quicktime" => ".mov",
        "audio/amr" => ".amr",
        "audio/mpeg" => ".mp3",
        "text/vcard" | "text/x-vcard" => ".vcf",
        "application/pdf" => ".pdf",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_image_types() {
        assert_eq!(extension_for("image/jpeg"), Some(".jpg"));
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("image/gif"), Some(".gif"));
    }

    #[test]
    fn ignores_case_and_parameters() {
        assert_eq!(extension_for("Image/JPEG; charset=binary"), Some(".jpg"));
    }

    #[test]
    fn unknown_type_has_no_extension() {
        assert_eq!(extension_for("application/x-unknown"), None);
        assert_eq!(extension_for(""), None);
    }
}
