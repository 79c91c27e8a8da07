use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Receipt image formats accepted for upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
}

impl MediaType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// Detect the format from the file content.
    ///
    /// The client-reported file name is never trusted; it only feeds the
    /// error message when detection fails.
    pub fn detect(bytes: &[u8], client_name: Option<&str>) -> ResultEngine<Self> {
        let detected = infer::get(bytes).map(|kind| kind.extension());
        match detected {
            Some("jpg") => Ok(Self::Jpeg),
            Some("png") => Ok(Self::Png),
            Some("gif") => Ok(Self::Gif),
            other => {
                let provided = other
                    .map(ToString::to_string)
                    .or_else(|| {
                        client_name
                            .and_then(|name| name.rsplit_once('.'))
                            .map(|(_, ext)| ext.to_ascii_lowercase())
                    })
                    .unwrap_or_else(|| "unknown".to_string());
                Err(EngineError::UnsupportedMediaType(format!(
                    "only .jpg, .png or .gif images are allowed, got .{provided}"
                )))
            }
        }
    }
}

/// Unique blob name `YYYYMMDD-HHMMSS-<random>.<ext>`.
pub fn blob_name(now: DateTime<Utc>, media: MediaType) -> String {
    format!(
        "{}-{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        Uuid::new_v4().simple(),
        media.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const GIF: &[u8] = b"GIF89a\x01\0\x01\0";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn allowed_formats_are_detected() {
        assert_eq!(MediaType::detect(PNG, None).unwrap(), MediaType::Png);
        assert_eq!(MediaType::detect(GIF, None).unwrap(), MediaType::Gif);
        assert_eq!(
            MediaType::detect(JPEG, Some("r.jpeg")).unwrap(),
            MediaType::Jpeg
        );
    }

    #[test]
    fn disguised_executable_is_rejected_by_content() {
        let err = MediaType::detect(b"MZ\x90\0\x03\0\0\0", Some("receipt.png")).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedMediaType(_)));
    }

    #[test]
    fn unknown_content_reports_client_extension() {
        let err = MediaType::detect(b"plain text", Some("notes.TXT")).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedMediaType(
                "only .jpg, .png or .gif images are allowed, got .txt".to_string()
            )
        );
    }

    #[test]
    fn blob_names_are_unique_and_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 8, 7).unwrap();
        let a = blob_name(now, MediaType::Png);
        let b = blob_name(now, MediaType::Png);
        assert_ne!(a, b);
        assert!(a.starts_with("20240105-090807-"));
        assert!(a.ends_with(".png"));
    }
}
