//! Book images: resolving stored references to URLs and vetting uploads.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shown when a book has no usable image.
pub const FALLBACK_IMAGE: &str = "/assets/images/fallback.jpg";

/// Maximum number of images attached to one book.
pub const MAX_IMAGES: usize = 5;

/// Maximum size of one image in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image MIME types.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Resolve an image reference stored on a book to a fetchable URL.
///
/// - empty references resolve to [`FALLBACK_IMAGE`]
/// - absolute `http(s)` URLs pass through
/// - paths starting with `/` are served from the API host
/// - bare file names live under `/uploads/`
///
/// The API host is the base URL with its `/api` suffix removed.
#[must_use]
pub fn resolve_image_url(api_base: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return FALLBACK_IMAGE.to_string();
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }

    let base = api_base.trim_end_matches('/');
    let base = base.strip_suffix("/api").unwrap_or(base);
    if reference.starts_with('/') {
        format!("{base}{reference}")
    } else {
        format!("{base}/uploads/{reference}")
    }
}

/// Resolve the first image of a book, or the fallback.
#[must_use]
pub fn primary_image_url(api_base: &str, references: &[String]) -> String {
    references
        .first()
        .map_or_else(|| FALLBACK_IMAGE.to_string(), |r| resolve_image_url(api_base, r))
}

/// Rejected image upload. Messages are shown to the user as-is.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("الحد الأقصى {max} صور")]
    TooMany { max: usize },

    #[error("حجم الصورة \"{file_name}\" يجب أن يكون أقل من 5 ميجابايت")]
    TooLarge { file_name: String, size: usize },

    #[error("الصورة \"{file_name}\" يجب أن تكون من نوع JPEG، PNG، GIF، أو WebP")]
    UnsupportedType { file_name: String },

    #[error("يجب إضافة صورة واحدة على الأقل")]
    Missing,

    #[error("تعذر قراءة الصورة \"{}\": {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An image file staged for a multipart book upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, inferring its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ImageError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = content_type_for(path).to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }

    /// Check size and type limits for this file.
    ///
    /// # Errors
    ///
    /// Returns the first limit the file breaks.
    pub fn check(&self) -> Result<(), ImageError> {
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                file_name: self.file_name.clone(),
                size: self.bytes.len(),
            });
        }
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(ImageError::UnsupportedType {
                file_name: self.file_name.clone(),
            });
        }
        Ok(())
    }
}

/// Validate a batch of uploads before submission.
///
/// # Errors
///
/// Returns an error for more than [`MAX_IMAGES`] files or for the first file
/// that breaks a size or type limit.
pub fn validate_uploads(uploads: &[ImageUpload]) -> Result<(), ImageError> {
    if uploads.len() > MAX_IMAGES {
        return Err(ImageError::TooMany { max: MAX_IMAGES });
    }
    uploads.iter().try_for_each(ImageUpload::check)
}

/// MIME type for a file extension; unknown extensions map to
/// `application/octet-stream` and are rejected by [`ImageUpload::check`].
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const API: &str = "http://localhost:5000/api";

    #[test]
    fn test_resolve_image_url() {
        assert_eq!(resolve_image_url(API, ""), FALLBACK_IMAGE);
        assert_eq!(
            resolve_image_url(API, "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            resolve_image_url(API, "/uploads/a.jpg"),
            "http://localhost:5000/uploads/a.jpg"
        );
        assert_eq!(
            resolve_image_url(API, "a.jpg"),
            "http://localhost:5000/uploads/a.jpg"
        );
        assert_eq!(
            resolve_image_url("http://localhost:5000/", "b.png"),
            "http://localhost:5000/uploads/b.png"
        );
    }

    #[test]
    fn test_primary_image_url() {
        assert_eq!(primary_image_url(API, &[]), FALLBACK_IMAGE);
        assert_eq!(
            primary_image_url(API, &["x.webp".to_string(), "y.webp".to_string()]),
            "http://localhost:5000/uploads/x.webp"
        );
    }

    #[test]
    fn test_upload_limits() {
        let ok = ImageUpload::new("cover.png", "image/png", vec![0; 16]);
        assert!(ok.check().is_ok());

        let big = ImageUpload::new("big.jpg", "image/jpeg", vec![0; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(big.check(), Err(ImageError::TooLarge { .. })));

        let pdf = ImageUpload::new("doc.pdf", "application/pdf", vec![0; 16]);
        let err = pdf.check().unwrap_err();
        assert!(err.to_string().contains("doc.pdf"));

        let six = vec![ok; 6];
        assert!(matches!(
            validate_uploads(&six),
            Err(ImageError::TooMany { max: 5 })
        ));
        assert!(validate_uploads(&six[..5]).is_ok());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let upload = ImageUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "cover.gif");
        assert_eq!(upload.content_type, "image/gif");
        assert_eq!(upload.bytes, b"GIF89a");
    }
}
