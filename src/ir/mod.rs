//! Typed representation of materialized VOC annotations.
//!
//! Boxes carry their coordinate frame in the type: annotation files are read
//! as [`BBoxXYXY<Pixel>`] and only [`BBoxXYXY<Normalized>`] reaches a
//! [`DetectionRecord`].
//!
//! # Example
//!
//! ```
//! use vocset::ir::{BBoxXYXY, ClassId, DetectedObject, Pixel};
//!
//! let pixel = BBoxXYXY::<Pixel>::from_xyxy(10.0, 10.0, 50.0, 50.0);
//! let object = DetectedObject::new(pixel.to_normalized(100.0, 100.0), ClassId::new(1), false);
//! assert_eq!(object.bbox.to_array(), [0.1, 0.1, 0.5, 0.5]);
//! ```

mod bbox;
mod ids;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use ids::ClassId;
pub use model::{DetectedObject, DetectionRecord};
pub use space::{Normalized, Pixel};
