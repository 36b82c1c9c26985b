//! Class vocabulary: class name to dense 1-based id.
//!
//! A vocabulary is built once per corpus by scanning every annotation,
//! persisted as a JSON object (`{"name": id}`, four-space indentation) and
//! afterwards treated as ground truth. Ids follow the lexicographic order of
//! the class names, so rebuilding from an unchanged corpus always yields the
//! same mapping.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serializer as _;

use crate::corpus::{collect_flat_files, ANNOTATION_EXTENSION};
use crate::error::VocError;
use crate::ir::ClassId;
use crate::tree::{AnnotationNode, TreeDecoder, ANNOTATION_TAG, OBJECT_TAG};

/// An injective mapping from class name to [`ClassId`], dense over `[1, len]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassVocabulary {
    ids: BTreeMap<String, ClassId>,
    // names[id - 1]
    names: Vec<String>,
}

impl ClassVocabulary {
    /// Assigns ids to the distinct names in lexicographic order. Blank names
    /// are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.trim().is_empty())
            .collect();
        let names: Vec<String> = sorted.into_iter().collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), ClassId::new(idx as u32 + 1)))
            .collect();
        Self { ids, names }
    }

    /// Accepts an existing mapping after checking that names are non-empty and
    /// ids are unique and contiguous from 1. `path` only labels errors.
    pub fn from_map(map: BTreeMap<String, u32>, path: &Path) -> Result<Self, VocError> {
        let invalid = |message: String| VocError::VocabularyInvalid {
            path: path.to_path_buf(),
            message,
        };

        let mut names: Vec<Option<String>> = vec![None; map.len()];
        for (name, id) in &map {
            if name.trim().is_empty() {
                return Err(invalid("class names must be non-empty".to_string()));
            }
            let slot = (*id as usize)
                .checked_sub(1)
                .and_then(|idx| names.get_mut(idx))
                .ok_or_else(|| {
                    invalid(format!(
                        "id {id} for '{name}' is outside 1..={}",
                        map.len()
                    ))
                })?;
            if let Some(previous) = slot.replace(name.clone()) {
                return Err(invalid(format!(
                    "id {id} is assigned to both '{previous}' and '{name}'"
                )));
            }
        }

        // Every slot is filled: len(map) ids, all distinct, all within range.
        let names: Vec<String> = names.into_iter().flatten().collect();
        let ids = map
            .into_iter()
            .map(|(name, id)| (name, ClassId::new(id)))
            .collect();
        Ok(Self { ids, names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<ClassId> {
        self.ids.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Reverse lookup.
    pub fn name(&self, id: ClassId) -> Option<&str> {
        (id.as_u32() as usize)
            .checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }

    /// `(name, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassId)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), ClassId::new(idx as u32 + 1)))
    }
}

/// Scans every annotation in `annotations_dir` and assigns ids to the distinct
/// object names.
///
/// Annotations without `<object>` entries contribute no names.
pub fn build(annotations_dir: &Path) -> Result<ClassVocabulary, VocError> {
    let names = collect_class_names(annotations_dir)?;
    let vocabulary = ClassVocabulary::from_names(names);
    tracing::info!(
        dir = %annotations_dir.display(),
        classes = vocabulary.len(),
        "built class vocabulary"
    );
    Ok(vocabulary)
}

/// Rescans `annotations_dir` and fails on the first class name missing from
/// `vocabulary`. A loaded vocabulary is never extended.
pub fn verify_covers(annotations_dir: &Path, vocabulary: &ClassVocabulary) -> Result<(), VocError> {
    let decoder = TreeDecoder::default();
    for path in annotation_files(annotations_dir)? {
        let tree = decoder.decode_file(&path)?;
        let annotation = tree.expect_root(ANNOTATION_TAG, &path)?;
        for (object_index, name) in object_names(annotation, &path)?.into_iter().enumerate() {
            if !vocabulary.contains(&name) {
                return Err(VocError::UnknownClass {
                    name,
                    path,
                    object_index,
                });
            }
        }
    }
    Ok(())
}

/// Writes `vocabulary` as a JSON object in id order.
pub fn save(vocabulary: &ClassVocabulary, path: &Path) -> Result<(), VocError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| VocError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_error = |source| VocError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    (&mut serializer)
        .collect_map(vocabulary.iter().map(|(name, id)| (name, id.as_u32())))
        .map_err(|source| VocError::VocabularyWrite {
            path: path.to_path_buf(),
            source,
        })?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer.flush().map_err(write_error)
}

/// Loads a vocabulary written by [`save`] (or any JSON object of name → id).
pub fn load(path: &Path) -> Result<ClassVocabulary, VocError> {
    if !path.is_file() {
        return Err(VocError::VocabularyNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| VocError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let map: BTreeMap<String, u32> =
        serde_json::from_str(&content).map_err(|source| VocError::VocabularyParse {
            path: path.to_path_buf(),
            source,
        })?;
    ClassVocabulary::from_map(map, path)
}

fn annotation_files(annotations_dir: &Path) -> Result<Vec<PathBuf>, VocError> {
    if !annotations_dir.is_dir() {
        return Err(VocError::CorpusPathMissing {
            path: annotations_dir.to_path_buf(),
        });
    }
    collect_flat_files(annotations_dir, ANNOTATION_EXTENSION)
}

fn collect_class_names(annotations_dir: &Path) -> Result<BTreeSet<String>, VocError> {
    let decoder = TreeDecoder::default();
    let mut names = BTreeSet::new();
    for path in annotation_files(annotations_dir)? {
        let tree = decoder.decode_file(&path)?;
        names.extend(object_names(tree.expect_root(ANNOTATION_TAG, &path)?, &path)?);
    }
    Ok(names)
}

fn object_names(annotation: &AnnotationNode, path: &Path) -> Result<Vec<String>, VocError> {
    let Some(objects) = annotation.entries(OBJECT_TAG) else {
        tracing::debug!(path = %path.display(), "annotation has no objects");
        return Ok(Vec::new());
    };

    objects
        .iter()
        .enumerate()
        .map(|(idx, object)| {
            object
                .text_at("name")
                .map(ToOwned::to_owned)
                .ok_or_else(|| VocError::MalformedDocument {
                    path: path.to_path_buf(),
                    message: format!("missing <name> in <object> {idx}"),
                })
        })
        .collect()
}
