use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error;

const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image extension: {0}")]
    UnsupportedExtension(String),

    #[error("malformed data URL: {0}")]
    InvalidDataUrl(String),

    #[error("invalid base64 image payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("image payload is empty")]
    Empty,
}

/// A decoded image attached to the prompt of a vision model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInput {
    mime_type: String,
    data: Vec<u8>,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Result<Self, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self {
            mime_type: mime_type.into(),
            data,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let mime_type = mime_type_for(path)?;
        let data = fs::read(path).map_err(|source| ImageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(mime_type, data)
    }

    pub fn from_base64(payload: &str) -> Result<Self, ImageError> {
        let trimmed = payload.trim();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::InvalidDataUrl("missing ',' separator".to_string()))?;
            let mime_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| ImageError::InvalidDataUrl("only base64 data URLs are supported".to_string()))?;
            if !mime_type.starts_with("image/") {
                return Err(ImageError::InvalidDataUrl(format!("not an image type: {}", mime_type)));
            }
            return Self::new(mime_type, STANDARD.decode(body)?);
        }
        Self::new(DEFAULT_MIME_TYPE, STANDARD.decode(trimmed)?)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// An image as the host hands it over, decoded only when the node runs.
///
/// JSON strings deserialize to [`ImageSource::Encoded`]: a `data:` URL, or bare
/// base64 taken to be PNG.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ImageSource {
    Encoded(String),
    File(PathBuf),
    Decoded(ImageInput),
}

impl ImageSource {
    pub fn load(&self) -> Result<ImageInput, ImageError> {
        match self {
            ImageSource::Encoded(payload) => ImageInput::from_base64(payload),
            ImageSource::File(path) => ImageInput::from_path(path),
            ImageSource::Decoded(image) => Ok(image.clone()),
        }
    }
}

impl From<String> for ImageSource {
    fn from(payload: String) -> Self {
        ImageSource::Encoded(payload)
    }
}

impl From<&str> for ImageSource {
    fn from(payload: &str) -> Self {
        ImageSource::Encoded(payload.to_string())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<ImageInput> for ImageSource {
    fn from(image: ImageInput) -> Self {
        ImageSource::Decoded(image)
    }
}

fn mime_type_for(path: &Path) -> Result<&'static str, ImageError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "bmp" => Ok("image/bmp"),
        _ => Err(ImageError::UnsupportedExtension(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_keeps_mime_type() {
        let image = ImageInput::from_base64("data:image/jpeg;base64,AQID").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn bare_base64_defaults_to_png() {
        let image = ImageInput::from_base64("AQID").unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn rejects_non_image_data_url() {
        let err = ImageInput::from_base64("data:text/plain;base64,AQID").unwrap_err();
        assert!(matches!(err, ImageError::InvalidDataUrl(_)));
    }

    #[test]
    fn rejects_bad_base64_and_empty_payload() {
        assert!(matches!(ImageInput::from_base64("***"), Err(ImageError::InvalidBase64(_))));
        assert!(matches!(ImageInput::from_base64(""), Err(ImageError::Empty)));
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type_for(Path::new("a/b/photo.JPG")).unwrap(), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("shot.webp")).unwrap(), "image/webp");
        assert!(mime_type_for(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn json_string_is_decoded_on_load() {
        let source: ImageSource = serde_json::from_str("\"data:image/gif;base64,R0lG\"").unwrap();
        assert_eq!(source, ImageSource::Encoded("data:image/gif;base64,R0lG".to_string()));
        assert_eq!(source.load().unwrap().mime_type(), "image/gif");
    }

    #[test]
    fn bad_payload_deserializes_but_fails_to_load() {
        let source: ImageSource = serde_json::from_str("\"***not base64\"").unwrap();
        assert!(matches!(source.load(), Err(ImageError::InvalidBase64(_))));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let source = ImageSource::from(PathBuf::from("/nonexistent/cat.png"));
        assert!(matches!(source.load(), Err(ImageError::Io { .. })));
    }
}
