//! QR code image URL for the poster header.

use crate::models::poster::PosterData;

pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const DEFAULT_QR_COLOR: &str = "#000000";
/// Pixel size requested from the QR service.
pub const QR_IMAGE_SIZE: u32 = 150;

/// Request URL for the QR image encoding `data` in `color`.
///
/// `color` may carry a leading `#`; the service expects bare hex.
pub fn qr_request_url(base: &str, data: &str, color: Option<&str>) -> String {
    let color = color
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_QR_COLOR);
    format!(
        "{base}?size={size}x{size}&data={data}&color={color}",
        size = QR_IMAGE_SIZE,
        data = urlencoding::encode(data),
        color = color.trim_start_matches('#'),
    )
}

/// QR image URL for a poster, or `None` when the QR block is hidden or has
/// no payload.
pub fn poster_qr_url(base: &str, poster: &PosterData) -> Option<String> {
    if !poster.qr_code_shown() {
        return None;
    }
    let data = poster
        .qr_code_url
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())?;
    Some(qr_request_url(base, data, poster.qr_code_color.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poster_with_url(url: &str) -> PosterData {
        PosterData {
            qr_code_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_url_encodes_payload_and_strips_hash() {
        let url = qr_request_url(
            DEFAULT_QR_SERVICE_URL,
            "https://lab.example.org/poster?id=7&v=2",
            Some("#264796"),
        );
        assert_eq!(
            url,
            "https://api.qrserver.com/v1/create-qr-code/?size=150x150\
             &data=https%3A%2F%2Flab.example.org%2Fposter%3Fid%3D7%26v%3D2\
             &color=264796"
        );
    }

    #[test]
    fn test_default_color_is_black() {
        let url = qr_request_url(DEFAULT_QR_SERVICE_URL, "x", None);
        assert!(url.ends_with("&color=000000"));
        let blank = qr_request_url(DEFAULT_QR_SERVICE_URL, "x", Some("  "));
        assert!(blank.ends_with("&color=000000"));
    }

    #[test]
    fn test_poster_qr_url_requires_payload() {
        assert!(poster_qr_url(DEFAULT_QR_SERVICE_URL, &PosterData::default()).is_none());
        assert!(poster_qr_url(DEFAULT_QR_SERVICE_URL, &poster_with_url("  ")).is_none());
        assert!(poster_qr_url(DEFAULT_QR_SERVICE_URL, &poster_with_url("https://a.b")).is_some());
    }

    #[test]
    fn test_poster_qr_url_respects_show_flag() {
        let mut poster = poster_with_url("https://a.b");
        poster.show_qr_code = Some(false);
        assert!(poster_qr_url(DEFAULT_QR_SERVICE_URL, &poster).is_none());
    }

    #[test]
    fn test_custom_base_url() {
        let url = qr_request_url("http://qr.local/render", "abc", Some("fff"));
        assert_eq!(url, "http://qr.local/render?size=150x150&data=abc&color=fff");
    }
}
