//! Split-driven, immutable index over a VOC corpus.
//!
//! [`CorpusIndex::build`] reads a split file from `ImageSets/Main/`, resolves
//! every listed identifier to its annotation and image path, and fails on the
//! first identifier whose files are missing. No partial index is returned.

mod layout;

pub use layout::{
    derive_image_path, item_id, CorpusLayout, ANNOTATIONS_DIR, ANNOTATION_EXTENSION,
    IMAGES_DIR, IMAGE_EXTENSION,
};
pub(crate) use layout::collect_flat_files;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::VocError;
use crate::vocab::ClassVocabulary;

/// One split member with absolute paths to its files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CorpusItem {
    pub id: String,
    pub annotation_path: PathBuf,
    pub image_path: PathBuf,
}

/// Ordered items of one split plus the vocabulary used to label them.
#[derive(Clone, Debug)]
pub struct CorpusIndex {
    layout: CorpusLayout,
    split_path: PathBuf,
    items: Vec<CorpusItem>,
    vocabulary: Arc<ClassVocabulary>,
}

impl CorpusIndex {
    /// Builds the index for `split` under `root`.
    ///
    /// `split` is resolved relative to `<root>/ImageSets/Main/`.
    pub fn build(
        root: &Path,
        split: impl AsRef<Path>,
        vocabulary: Arc<ClassVocabulary>,
    ) -> Result<Self, VocError> {
        if !root.is_dir() {
            return Err(VocError::CorpusPathMissing {
                path: root.to_path_buf(),
            });
        }
        let root = std::path::absolute(root).map_err(|source| VocError::Read {
            path: root.to_path_buf(),
            source,
        })?;
        Self::from_layout(CorpusLayout::new(root), split, vocabulary)
    }

    /// Builds the index over an already resolved layout.
    pub fn from_layout(
        layout: CorpusLayout,
        split: impl AsRef<Path>,
        vocabulary: Arc<ClassVocabulary>,
    ) -> Result<Self, VocError> {
        let split_path = layout.split_path(split);
        let ids = read_split(&split_path)?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let annotation_path = layout.annotation_path(&id);
            if !annotation_path.is_file() {
                return Err(VocError::SplitReferenceMissing {
                    id,
                    path: annotation_path,
                });
            }

            let image_path = derive_image_path(&annotation_path);
            if !image_path.is_file() {
                return Err(VocError::SplitReferenceMissing {
                    id,
                    path: image_path,
                });
            }

            items.push(CorpusItem {
                id,
                annotation_path,
                image_path,
            });
        }

        tracing::info!(
            split = %split_path.display(),
            items = items.len(),
            "built corpus index"
        );

        Ok(Self {
            layout,
            split_path,
            items,
            vocabulary,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&CorpusItem, VocError> {
        self.items.get(index).ok_or(VocError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &CorpusItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[CorpusItem] {
        &self.items
    }

    pub fn layout(&self) -> &CorpusLayout {
        &self.layout
    }

    pub fn split_path(&self) -> &Path {
        &self.split_path
    }

    pub fn vocabulary(&self) -> &Arc<ClassVocabulary> {
        &self.vocabulary
    }
}

/// Reads item identifiers from a split file, one per line.
///
/// Lines are trimmed and blank lines skipped; order and duplicates are kept.
pub fn read_split(path: &Path) -> Result<Vec<String>, VocError> {
    if !path.is_file() {
        return Err(VocError::CorpusPathMissing {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| VocError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}
