//! The VOC directory contract.
//!
//! ```text
//! <root>/Annotations/<id>.xml
//! <root>/JPEGImages/<id>.jpg
//! <root>/ImageSets/Main/<split>.txt
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::VocError;

pub const ANNOTATIONS_DIR: &str = "Annotations";
pub const IMAGES_DIR: &str = "JPEGImages";
pub const ANNOTATION_EXTENSION: &str = "xml";
pub const IMAGE_EXTENSION: &str = "jpg";
const SPLITS_DIR: [&str; 2] = ["ImageSets", "Main"];
const SUPPORTED_YEARS: [&str; 2] = ["2007", "2012"];

/// Resolved directories of one VOC corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusLayout {
    pub root: PathBuf,
    pub annotations_dir: PathBuf,
    pub images_dir: PathBuf,
    pub splits_dir: PathBuf,
}

impl CorpusLayout {
    /// Layout rooted at `root`. Directories are not checked.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            annotations_dir: root.join(ANNOTATIONS_DIR),
            images_dir: root.join(IMAGES_DIR),
            splits_dir: SPLITS_DIR.iter().fold(root.clone(), |dir, part| dir.join(part)),
            root,
        }
    }

    /// Resolves `path`, which may be the corpus root or its `Annotations/`
    /// directory. Fails with [`VocError::CorpusPathMissing`] when no
    /// annotations directory can be found.
    pub fn discover(path: &Path) -> Result<Self, VocError> {
        if !path.is_dir() {
            return Err(VocError::CorpusPathMissing {
                path: path.to_path_buf(),
            });
        }

        if path.join(ANNOTATIONS_DIR).is_dir() {
            return Ok(Self::new(path));
        }

        if is_dir_named(path, ANNOTATIONS_DIR) {
            if let Some(root) = path.parent() {
                return Ok(Self::new(root));
            }
        }

        Err(VocError::CorpusPathMissing {
            path: path.join(ANNOTATIONS_DIR),
        })
    }

    /// Layout of `<voc_root>/VOCdevkit/VOC<year>`.
    pub fn devkit(voc_root: &Path, year: &str) -> Result<Self, VocError> {
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(VocError::UnsupportedYear(year.to_string()));
        }
        Ok(Self::new(voc_root.join("VOCdevkit").join(format!("VOC{year}"))))
    }

    pub fn annotation_path(&self, id: &str) -> PathBuf {
        self.annotations_dir
            .join(format!("{id}.{ANNOTATION_EXTENSION}"))
    }

    pub fn image_path(&self, id: &str) -> PathBuf {
        derive_image_path(&self.annotation_path(id))
    }

    /// Split files are looked up in `ImageSets/Main/`; absolute paths are
    /// returned unchanged.
    pub fn split_path(&self, split: impl AsRef<Path>) -> PathBuf {
        self.splits_dir.join(split)
    }

    /// `Annotations/*.xml`, sorted by file name. Requires the directory to exist.
    pub fn annotation_files(&self) -> Result<Vec<PathBuf>, VocError> {
        if !self.annotations_dir.is_dir() {
            return Err(VocError::CorpusPathMissing {
                path: self.annotations_dir.clone(),
            });
        }
        collect_flat_files(&self.annotations_dir, ANNOTATION_EXTENSION)
    }
}

/// Maps `.../Annotations/<id>.xml` to `.../JPEGImages/<id>.jpg`.
///
/// The last `Annotations` component is swapped for `JPEGImages` and the
/// extension for `jpg`. A path without an `Annotations` component only has
/// its extension swapped.
pub fn derive_image_path(annotation_path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = annotation_path.components().collect();
    let swap_at = components
        .iter()
        .rposition(|component| component.as_os_str() == ANNOTATIONS_DIR);

    let mut image_path: PathBuf = components
        .iter()
        .enumerate()
        .map(|(idx, component)| {
            if Some(idx) == swap_at {
                OsString::from(IMAGES_DIR)
            } else {
                component.as_os_str().to_os_string()
            }
        })
        .collect();
    image_path.set_extension(IMAGE_EXTENSION);
    image_path
}

/// Item identifier of an annotation or image file: its file stem.
pub fn item_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
}

/// Files directly inside `dir` with `extension` (case-insensitive), sorted by
/// file name. Nested matches are skipped with a warning.
pub(crate) fn collect_flat_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, VocError> {
    let mut files = Vec::new();

    let read_error = |source| VocError::Read {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| rel_string(dir, path));

    let nested = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extension))
        .map(|entry| entry.into_path())
        .min_by_key(|path| rel_string(dir, path));

    if let Some(sample) = nested {
        tracing::warn!(
            dir = %dir.display(),
            "corpus directories are scanned flat; skipping nested .{} files, e.g. {}",
            extension,
            rel_string(dir, &sample)
        );
    }

    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn is_dir_named(path: &Path, dir_name: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.eq_ignore_ascii_case(dir_name))
        .unwrap_or(false)
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
