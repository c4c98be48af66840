// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Materialization of embedded images

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Image formats a browser displays as is
pub const DISPLAYABLE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Identifies an embedded image by the document's own addressing: sheet
/// number and drawing relationship id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId {
    /// 1 based sheet number
    pub sheet: usize,
    /// Relationship id of the image in the sheet drawing
    pub rel_id: String,
    /// Lower case file extension of the image part
    pub extension: String,
}

impl ImageId {
    /// Checks whether the image can be displayed without conversion
    pub fn is_displayable(&self) -> bool {
        DISPLAYABLE_EXTENSIONS.contains(&self.extension.as_str())
    }

    /// File name of the image, `rId3-1.png`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.rel_id, self.sheet, self.extension)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet {} image {}", self.sheet, self.rel_id)
    }
}

/// Turns raw image bytes into a displayable reference
pub trait ImageStore {
    /// Stores the image and returns its `src` reference, or `None` when the
    /// image cannot be displayed
    fn store(&mut self, id: &ImageId, bytes: &[u8]) -> Option<String>;
}

/// Writes displayable images under a directory
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    dir: PathBuf,
}

impl DirectoryImageStore {
    /// Store writing under `dir`, created on first use
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirectoryImageStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ImageStore for DirectoryImageStore {
    fn store(&mut self, id: &ImageId, bytes: &[u8]) -> Option<String> {
        if !id.is_displayable() {
            warn!("{id}: unsupported image format {:?}", id.extension);
            return None;
        }
        let path = self.dir.join(id.file_name());
        let written = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, bytes));
        match written {
            Ok(()) => {
                debug!("{id} written to {}", path.display());
                Some(path.to_string_lossy().replace('\\', "/"))
            }
            Err(e) => {
                warn!("{id}: cannot write {}: {e}", path.display());
                None
            }
        }
    }
}

/// Discards images, they render as blank cells
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageStore for NoImages {
    fn store(&mut self, _id: &ImageId, _bytes: &[u8]) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(extension: &str) -> ImageId {
        ImageId {
            sheet: 2,
            rel_id: "rId1".to_string(),
            extension: extension.to_string(),
        }
    }

    #[test]
    fn test_directory_store() {
        let dir = std::env::temp_dir().join(format!("xlsx-html-images-{}", std::process::id()));
        let mut store = DirectoryImageStore::new(&dir);
        let src = store.store(&id("png"), b"\x89PNG").unwrap();
        assert!(src.ends_with("rId1-2.png"));
        assert_eq!(fs::read(dir.join("rId1-2.png")).unwrap(), b"\x89PNG");
        assert_eq!(store.store(&id("emf"), b"emf"), None);
        assert!(!dir.join("rId1-2.emf").exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_no_images() {
        assert_eq!(NoImages.store(&id("png"), b""), None);
    }
}
