//! Materialized detection records.
//!
//! A [`DetectionRecord`] is the typed, per-image result of decoding one VOC
//! annotation: image dimensions plus the retained objects with unit-frame
//! boxes. Its column accessors lay the data out the way detection training
//! code expects its targets (`boxes`, `labels`, `iscrowd`, `area`,
//! `height_width`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::bbox::BBoxXYXY;
use super::ids::ClassId;
use super::space::Normalized;

/// One retained object of an annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Box in unit coordinates, never degenerate.
    pub bbox: BBoxXYXY<Normalized>,

    /// Vocabulary id of the object's class.
    pub label: ClassId,

    /// The VOC `difficult` flag; false when the annotation omits it.
    pub difficult: bool,

    /// `(xmax - xmin) * (ymax - ymin)` in the unit frame.
    pub area: f64,
}

impl DetectedObject {
    pub fn new(bbox: BBoxXYXY<Normalized>, label: ClassId, difficult: bool) -> Self {
        Self {
            area: bbox.area(),
            bbox,
            label,
            difficult,
        }
    }
}

/// The materialized annotation of one corpus item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Position of the item in its index.
    pub index: usize,

    /// Item identifier from the split file.
    pub item_id: String,

    /// Location of the image; pixels are never read by the materializer.
    pub image_path: PathBuf,

    pub width: u32,
    pub height: u32,

    /// Retained objects in source order.
    pub objects: Vec<DetectedObject>,

    /// Source positions (within the `<object>` list) of dropped degenerate boxes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_objects: Vec<usize>,
}

impl DetectionRecord {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn boxes(&self) -> Vec<[f64; 4]> {
        self.objects.iter().map(|obj| obj.bbox.to_array()).collect()
    }

    pub fn labels(&self) -> Vec<ClassId> {
        self.objects.iter().map(|obj| obj.label).collect()
    }

    pub fn difficult_flags(&self) -> Vec<bool> {
        self.objects.iter().map(|obj| obj.difficult).collect()
    }

    pub fn areas(&self) -> Vec<f64> {
        self.objects.iter().map(|obj| obj.area).collect()
    }

    /// `[height, width]`, in that order.
    pub fn height_width(&self) -> [u32; 2] {
        [self.height, self.width]
    }
}
