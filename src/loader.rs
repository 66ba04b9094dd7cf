use image::GrayImage;
use log::warn;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LprErrorKind, LprResult};

/// A grayscale character image together with its label.
///
/// `category` is the name of the directory holding the file, which is the ground
/// truth for templates. For test images `filename` carries the `word<N>` position.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub image: GrayImage,
    pub category: String,
    pub filename: String,
}

impl LabeledImage {

    /// Same label, new pixels.
    pub fn with_image(&self, image: GrayImage) -> Self {
        Self { image, category: self.category.clone(), filename: self.filename.clone() }
    }
}

/// What to do with a file that is not a decodable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    Skip,
    Abort,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        DecodePolicy::Skip
    }
}

/// All regular files under `root`, top-down.
///
/// Entries of a directory are sorted by name and its files come before its
/// subdirectories, so the order only depends on the tree's content.
pub fn list_files(root: impl AsRef<Path>) -> LprResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root.as_ref(), &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> LprResult<()> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut sub_dirs = Vec::new();
    for entry in entries {
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            sub_dirs.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    for sub_dir in sub_dirs {
        walk(&sub_dir, files)?;
    }
    Ok(())
}

/// Decode one file as an 8 bit grayscale image, guessing the format from its bytes.
pub fn load_image(path: &Path) -> LprResult<LabeledImage> {
    let bytes = fs::read(path)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|source| LprErrorKind::DecodeError { path: path.to_path_buf(), source })?
        .to_luma8();
    if image.width() == 0 || image.height() == 0 {
        return Err(LprErrorKind::EmptyImage(path.to_path_buf()).into());
    }

    let category = match path.parent() {
        Some(parent) => match parent.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => parent.to_string_lossy().into_owned(),
        },
        None => String::new(),
    };
    let filename = path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(LabeledImage { image, category, filename })
}

/// Load `path`, turning decode failures into `None` under [`DecodePolicy::Skip`].
///
/// Read errors are never skipped.
pub fn load_with_policy(path: &Path, policy: DecodePolicy) -> LprResult<Option<LabeledImage>> {
    match load_image(path) {
        Ok(image) => Ok(Some(image)),
        Err(e) => {
            let undecodable = matches!(e.kind(), LprErrorKind::DecodeError { .. } | LprErrorKind::EmptyImage(_));
            if undecodable && policy == DecodePolicy::Skip {
                warn!("skip {:?}: {}", path, e);
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

/// Every image under `root`, in [`list_files`] order.
pub fn read_directory(root: impl AsRef<Path>, policy: DecodePolicy) -> LprResult<Vec<LabeledImage>> {
    let mut images = Vec::new();
    for path in list_files(root)? {
        if let Some(image) = load_with_policy(&path, policy)? {
            images.push(image);
        }
    }
    Ok(images)
}
