//! Per-item decoding of a VOC annotation into a [`DetectionRecord`].
//!
//! Boxes are divided by the declared image size, clamped into the unit
//! frame, and dropped with a warning when degenerate. Class names resolve
//! through the injected vocabulary; an unknown name is a hard error.

use std::path::Path;
use std::sync::Arc;

use crate::corpus::CorpusItem;
use crate::error::VocError;
use crate::ir::{BBoxXYXY, DetectedObject, DetectionRecord, Pixel};
use crate::tree::{AnnotationNode, TreeDecoder, ANNOTATION_TAG, OBJECT_TAG};
use crate::vocab::ClassVocabulary;

/// Turns indexed items into detection records. Stateless apart from the
/// shared vocabulary; every call is a pure function of the files it reads.
#[derive(Clone, Debug)]
pub struct RecordMaterializer {
    vocabulary: Arc<ClassVocabulary>,
    decoder: TreeDecoder,
}

impl RecordMaterializer {
    pub fn new(vocabulary: Arc<ClassVocabulary>) -> Self {
        Self {
            vocabulary,
            decoder: TreeDecoder::default(),
        }
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocabulary
    }

    /// Materializes `item`, requiring its image file to exist.
    ///
    /// The image is not opened; see [`open_image`](crate::image::open_image).
    pub fn materialize(&self, index: usize, item: &CorpusItem) -> Result<DetectionRecord, VocError> {
        if !item.image_path.is_file() {
            return Err(VocError::ImageMissing {
                path: item.image_path.clone(),
            });
        }
        self.materialize_metadata_only(index, item)
    }

    /// Materializes `item` from its annotation alone.
    pub fn materialize_metadata_only(
        &self,
        index: usize,
        item: &CorpusItem,
    ) -> Result<DetectionRecord, VocError> {
        let path = item.annotation_path.as_path();
        let tree = self.decoder.decode_file(path)?;
        let annotation = tree.expect_root(ANNOTATION_TAG, path)?;

        let (width, height) = read_size(annotation, path)?;
        let objects = annotation
            .entries(OBJECT_TAG)
            .ok_or_else(|| VocError::MissingObjectList {
                path: path.to_path_buf(),
            })?;

        let mut retained = Vec::with_capacity(objects.len());
        let mut dropped_objects = Vec::new();

        for (object_index, object) in objects.iter().enumerate() {
            let pixel = read_bndbox(object, path, object_index)?;
            let unit = pixel.to_normalized(f64::from(width), f64::from(height));
            let bbox = unit.clamp_unit();

            // Clamping maps infinities onto the frame edges, so test the raw box.
            if !unit.is_finite() || bbox.is_degenerate() {
                tracing::warn!(
                    path = %path.display(),
                    object = object_index,
                    "dropping degenerate box {:?} (non-finite, or width or height <= 0)",
                    pixel
                );
                dropped_objects.push(object_index);
                continue;
            }
            if !unit.is_within_unit() {
                tracing::debug!(
                    path = %path.display(),
                    object = object_index,
                    "clamped box {:?} into the image frame",
                    pixel
                );
            }

            let name = required_text(object, "name", path, object_index)?;
            let label = self
                .vocabulary
                .get(name)
                .ok_or_else(|| VocError::UnknownClass {
                    name: name.to_string(),
                    path: path.to_path_buf(),
                    object_index,
                })?;

            let difficult = read_difficult(object, path, object_index)?;
            retained.push(DetectedObject::new(bbox, label, difficult));
        }

        Ok(DetectionRecord {
            index,
            item_id: item.id.clone(),
            image_path: item.image_path.clone(),
            width,
            height,
            objects: retained,
            dropped_objects,
        })
    }

    /// Reads only the `<size>` block, returning `(height, width)`.
    pub fn height_width(&self, item: &CorpusItem) -> Result<(u32, u32), VocError> {
        let path = item.annotation_path.as_path();
        let tree = self.decoder.decode_file(path)?;
        let (width, height) = read_size(tree.expect_root(ANNOTATION_TAG, path)?, path)?;
        Ok((height, width))
    }
}

/// `(width, height)` from `size/width` and `size/height`; both must be
/// positive integers.
pub(crate) fn read_size(annotation: &AnnotationNode, path: &Path) -> Result<(u32, u32), VocError> {
    let dimension = |field: &str| -> Result<u32, VocError> {
        let raw = annotation
            .text_at(&format!("size/{field}"))
            .ok_or_else(|| VocError::MalformedDocument {
                path: path.to_path_buf(),
                message: format!("missing <{field}> in <size>"),
            })?;
        match raw.parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(VocError::MalformedDocument {
                path: path.to_path_buf(),
                message: format!("invalid <{field}> value '{raw}' in <size>; expected positive integer"),
            }),
        }
    };

    Ok((dimension("width")?, dimension("height")?))
}

fn read_bndbox(
    object: &AnnotationNode,
    path: &Path,
    object_index: usize,
) -> Result<BBoxXYXY<Pixel>, VocError> {
    let coord = |field: &str| -> Result<f64, VocError> {
        let raw = required_text(object, &format!("bndbox/{field}"), path, object_index)?;
        raw.parse::<f64>().map_err(|_| VocError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!(
                "invalid <{field}> value '{raw}' in <object> {object_index}; expected number"
            ),
        })
    };

    Ok(BBoxXYXY::from_xyxy(
        coord("xmin")?,
        coord("ymin")?,
        coord("xmax")?,
        coord("ymax")?,
    ))
}

fn read_difficult(object: &AnnotationNode, path: &Path, object_index: usize) -> Result<bool, VocError> {
    match object.text_at("difficult") {
        None => Ok(false),
        Some(raw) => parse_flag(raw).ok_or_else(|| VocError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!("invalid <difficult> value '{raw}' in <object> {object_index}"),
        }),
    }
}

fn required_text<'a>(
    object: &'a AnnotationNode,
    field: &str,
    path: &Path,
    object_index: usize,
) -> Result<&'a str, VocError> {
    object
        .text_at(field)
        .ok_or_else(|| VocError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!("missing <{field}> in <object> {object_index}"),
        })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
