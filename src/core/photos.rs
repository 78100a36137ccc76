//! Photo staging and upload.
//!
//! Files are checked locally (type, size, batch count) before any request;
//! uploads only happen once the owning entry exists, one at a time, and a
//! failed file does not stop the others.

use crate::api::PhotoApi;
use crate::errors::{AppError, AppResult};
use crate::models::{PhotoFile, TimeEntryPhoto};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_PHOTOS_PER_BATCH: usize = 5;

/// Content type guessed from the extension. HEIC/HEIF are reported as
/// unknown, the way camera uploads usually arrive.
pub fn content_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let ct = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" | "heif" => return None,
        _ => "application/octet-stream",
    };
    Some(ct.to_string())
}

/// `image/*`, or a `.heic`/`.heif` name whatever type was reported.
pub fn is_accepted_image(file_name: &str, content_type: Option<&str>) -> bool {
    let lower = file_name.to_ascii_lowercase();
    content_type.is_some_and(|ct| ct.starts_with("image/"))
        || lower.ends_with(".heic")
        || lower.ends_with(".heif")
}

fn check(file_name: &str, content_type: Option<&str>, size: u64) -> AppResult<()> {
    if !is_accepted_image(file_name, content_type) {
        return Err(AppError::PhotoRejected {
            file: file_name.to_string(),
            reason: "Please select an image file".into(),
        });
    }
    if size > MAX_PHOTO_BYTES {
        return Err(AppError::PhotoRejected {
            file: file_name.to_string(),
            reason: "Image must be less than 10MB".into(),
        });
    }
    Ok(())
}

pub fn check_photo(photo: &PhotoFile) -> AppResult<()> {
    check(&photo.file_name, photo.content_type.as_deref(), photo.size())
}

/// Read a photo from disk. Type and size are checked from metadata before
/// the file is read.
pub fn load_photo(path: &Path) -> AppResult<PhotoFile> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let content_type = content_type_for(path);
    let size = fs::metadata(path)?.len();

    check(&file_name, content_type.as_deref(), size)?;

    Ok(PhotoFile {
        file_name,
        content_type,
        bytes: fs::read(path)?,
    })
}

/// Photos staged before a start action.
#[derive(Debug, Default, Clone)]
pub struct PhotoBatch {
    photos: Vec<PhotoFile>,
}

impl PhotoBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, photo: PhotoFile) -> AppResult<()> {
        if self.photos.len() >= MAX_PHOTOS_PER_BATCH {
            return Err(AppError::PhotoRejected {
                file: photo.file_name,
                reason: "Maximum 5 photos allowed".into(),
            });
        }
        check_photo(&photo)?;
        self.photos.push(photo);
        Ok(())
    }

    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> AppResult<Self> {
        let mut batch = Self::new();
        for p in paths {
            if batch.len() >= MAX_PHOTOS_PER_BATCH {
                return Err(AppError::PhotoRejected {
                    file: p.as_ref().display().to_string(),
                    reason: "Maximum 5 photos allowed".into(),
                });
            }
            batch.add(load_photo(p.as_ref())?)?;
        }
        Ok(batch)
    }

    pub fn remove(&mut self, index: usize) -> Option<PhotoFile> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[PhotoFile] {
        &self.photos
    }
}

/// Per-file result of a batch upload.
#[derive(Debug)]
pub struct PhotoOutcome {
    pub file_name: String,
    pub result: AppResult<TimeEntryPhoto>,
}

impl PhotoOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Upload every photo of `batch` to `entry_id` in order.
pub fn upload_all<A: PhotoApi + ?Sized>(
    api: &A,
    entry_id: i64,
    batch: &PhotoBatch,
    caption: Option<&str>,
) -> Vec<PhotoOutcome> {
    batch
        .photos()
        .iter()
        .map(|photo| {
            let result = api.upload_photo(entry_id, photo, caption);
            match &result {
                Ok(p) => info!(entry_id, photo_id = p.id, file = %photo.file_name, "photo uploaded"),
                Err(e) => warn!(entry_id, file = %photo.file_name, error = %e, "photo upload failed"),
            }
            PhotoOutcome {
                file_name: photo.file_name.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn photo(name: &str, ct: Option<&str>, size: usize) -> PhotoFile {
        PhotoFile {
            file_name: name.into(),
            content_type: ct.map(str::to_string),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn accepts_images_and_heic_by_name() {
        assert!(is_accepted_image("a.png", Some("image/png")));
        assert!(is_accepted_image("IMG_1.HEIC", None));
        assert!(is_accepted_image("x.heif", Some("")));
        assert!(!is_accepted_image("notes.txt", Some("text/plain")));
        assert!(is_accepted_image("x.heic", Some("application/octet-stream")));
        assert!(!is_accepted_image("x.heic.txt", Some("text/plain")));
        assert!(!is_accepted_image("raw", None));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_photo(&photo("a.jpg", Some("image/jpeg"), MAX_PHOTO_BYTES as usize)).is_ok());
        let err = check_photo(&photo("a.jpg", Some("image/jpeg"), MAX_PHOTO_BYTES as usize + 1))
            .unwrap_err();
        assert!(err.to_string().contains("Image must be less than 10MB"));
    }

    #[test]
    fn batch_caps_at_five() {
        let mut b = PhotoBatch::new();
        for i in 0..MAX_PHOTOS_PER_BATCH {
            b.add(photo(&format!("{i}.png"), Some("image/png"), 1)).unwrap();
        }
        let err = b.add(photo("6.png", Some("image/png"), 1)).unwrap_err();
        assert!(err.to_string().contains("Maximum 5 photos allowed"));
        assert_eq!(b.len(), 5);

        assert!(b.remove(9).is_none());
        assert_eq!(b.remove(0).map(|p| p.file_name), Some("0.png".to_string()));
    }

    #[test]
    fn load_photo_rejects_oversized_file_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        let f = fs::File::create(&path).unwrap();
        f.set_len(MAX_PHOTO_BYTES + 1).unwrap();

        assert!(matches!(load_photo(&path), Err(AppError::PhotoRejected { .. })));
    }

    #[test]
    fn load_photo_reads_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.heic");
        fs::File::create(&path).unwrap().write_all(b"abc").unwrap();

        let p = load_photo(&path).unwrap();
        assert_eq!(p.file_name, "shot.heic");
        assert_eq!(p.content_type, None);
        assert_eq!(p.bytes, b"abc");
    }
}
