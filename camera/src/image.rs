use std::fmt;

use base64::Engine;

/// Image encodings a drawing surface can export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// A still frame serialised as a data URI, e.g. `data:image/png;base64,iVBOR...`.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    data_uri: String,
}

impl CapturedImage {
    pub fn from_data_uri(data_uri: impl Into<String>) -> CapturedImage {
        CapturedImage {
            data_uri: data_uri.into(),
        }
    }

    /// Encode raw image bytes into a data URI of the given format.
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> CapturedImage {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        CapturedImage {
            data_uri: format!("data:{};base64,{}", format.mime_type(), encoded),
        }
    }

    /// The full data URI, suitable for an `<img src>`.
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// The base64 payload with the `data:image/<subtype>;base64,` prefix
    /// removed. Anything not carrying that prefix comes back untouched.
    pub fn base64_payload(&self) -> &str {
        strip_data_uri_prefix(&self.data_uri)
    }

    pub fn is_empty(&self) -> bool {
        self.base64_payload().is_empty()
    }
}

// Data URIs run to megabytes; only print the head
impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.data_uri.chars().take(32).collect();
        f.debug_struct("CapturedImage")
            .field("data_uri", &format_args!("{}...", head))
            .field("len", &self.data_uri.len())
            .finish()
    }
}

fn strip_data_uri_prefix(uri: &str) -> &str {
    let Some(rest) = uri.strip_prefix("data:image/") else {
        return uri;
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return uri;
    };

    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    if subtype.is_empty() || !subtype.chars().all(is_word) {
        return uri;
    }

    payload
}
