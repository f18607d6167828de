//! Image reference plumbing: data-URL decoding and the proxy rewrite for
//! attachments hosted on Baserow's S3 backing storage.

use base64::Engine;

use crate::baserow::BaserowError;

/// Attachment URLs served from Baserow's object storage can't be loaded
/// cross-origin by a browser, so they get routed through the image proxy.
pub fn is_store_hosted(url: &str) -> bool {
    url.contains("baserow-backend") || url.contains("s3.amazonaws.com")
}

/// Rewrite a store-hosted attachment URL to go through the proxy
/// collaborator (`GET <proxy_base>?url=<encoded>`). Everything else
/// (data URLs, local URLs) passes through unchanged.
pub fn proxied_image_url(raw: &str, proxy_base: &str) -> String {
    if raw.is_empty() || !is_store_hosted(raw) {
        return raw.to_string();
    }
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", raw)
        .finish();
    format!("{proxy_base}?{query}")
}

/// Undo the proxy rewrite: recover the raw attachment URL from a proxied
/// one, so a server-side refetch hits the real host and not a relative
/// proxy path.
pub fn unproxied_url(url: &str, proxy_base: &str) -> Option<String> {
    let rest = url.strip_prefix(proxy_base)?.strip_prefix('?')?;
    url::form_urlencoded::parse(rest.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

/// Where the bytes behind an image URL come from when it has to be
/// uploaded to the store.
#[derive(Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// A `data:` payload, decodable in place.
    DataUrl(String),
    /// An absolute URL to refetch server-side.
    Fetch(String),
    /// Nothing uploadable (relative paths, junk).
    Unsupported(String),
}

/// Classify an image URL for upload. Proxied links are unwrapped to the
/// raw attachment URL first, so a `<proxy_base>?url=…` string from a
/// previously decoded row is refetched from its real host and not
/// treated as an opaque relative path.
pub fn image_source(url: &str, proxy_base: &str) -> ImageSource {
    let target = unproxied_url(url, proxy_base).unwrap_or_else(|| url.to_string());
    if target.starts_with("data:") {
        ImageSource::DataUrl(target)
    } else if target.starts_with("http://") || target.starts_with("https://") {
        ImageSource::Fetch(target)
    } else {
        ImageSource::Unsupported(target)
    }
}

/// A decoded `data:` URL payload ready for upload.
pub struct DataUrl {
    pub mime: mime::Mime,
    pub bytes: Vec<u8>,
}

/// Decode a `data:<mime>;base64,<payload>` URL (the camera capture
/// format) into raw bytes. Unparseable mime types fall back to JPEG.
pub fn parse_data_url(data_url: &str) -> Result<DataUrl, BaserowError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| BaserowError::Upload("not a data URL".into()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| BaserowError::Upload("malformed data URL: missing comma".into()))?;

    if !header.ends_with(";base64") {
        return Err(BaserowError::Upload("data URL is not base64-encoded".into()));
    }
    let mime_str = header.trim_end_matches(";base64");
    let mime = mime_str.parse::<mime::Mime>().unwrap_or(mime::IMAGE_JPEG);

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| BaserowError::Upload(format!("bad base64 payload: {e}")))?;

    Ok(DataUrl { mime, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROXY: &str = "/proxy-image";

    #[test]
    fn store_hosted_urls_get_proxied() {
        let raw = "https://baserow-backend-prod.s3.amazonaws.com/user_files/cat.jpg?sig=a+b";
        let proxied = proxied_image_url(raw, PROXY);
        assert!(proxied.starts_with("/proxy-image?url="));
        // the query must round-trip the full original URL
        assert_eq!(unproxied_url(&proxied, PROXY), Some(raw.to_string()));
    }

    #[test]
    fn non_store_urls_pass_through() {
        let raw = "https://example.com/photo.jpg";
        assert_eq!(proxied_image_url(raw, PROXY), raw);
        let data = "data:image/png;base64,AAAA";
        assert_eq!(proxied_image_url(data, PROXY), data);
        assert_eq!(proxied_image_url("", PROXY), "");
    }

    #[test]
    fn parses_a_base64_data_url() {
        // "hi!" in base64
        let decoded = parse_data_url("data:image/png;base64,aGkh").unwrap();
        assert_eq!(decoded.mime, mime::IMAGE_PNG);
        assert_eq!(decoded.bytes, b"hi!");
    }

    #[test]
    fn rejects_malformed_data_urls() {
        assert!(parse_data_url("http://example.com").is_err());
        assert!(parse_data_url("data:image/png;base64").is_err());
        assert!(parse_data_url("data:image/png,plain").is_err());
        assert!(parse_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn proxied_urls_classify_as_refetchable() {
        let raw = "https://baserow-backend-prod.s3.amazonaws.com/a.jpg";
        let proxied = proxied_image_url(raw, PROXY);
        // a relative proxy link must resolve back to its real host
        assert_eq!(image_source(&proxied, PROXY), ImageSource::Fetch(raw.to_string()));

        assert_eq!(
            image_source("https://example.com/b.png", PROXY),
            ImageSource::Fetch("https://example.com/b.png".to_string())
        );
        assert_eq!(
            image_source("data:image/png;base64,aGkh", PROXY),
            ImageSource::DataUrl("data:image/png;base64,aGkh".to_string())
        );
        assert_eq!(
            image_source("/somewhere/else.jpg", PROXY),
            ImageSource::Unsupported("/somewhere/else.jpg".to_string())
        );
    }

    #[test]
    fn unknown_mime_falls_back_to_jpeg() {
        let decoded = parse_data_url("data:not a mime;base64,aGkh").unwrap();
        assert_eq!(decoded.mime, mime::IMAGE_JPEG);
    }
}
