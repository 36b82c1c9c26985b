//! Coordinate frame markers.
//!
//! Zero-sized types used as the `TSpace` parameter of
//! [`BBoxXYXY`](super::BBoxXYXY) so pixel boxes read from an annotation can
//! never be handed to code expecting unit-frame boxes.

use std::fmt;

/// Absolute pixel coordinates, as written in VOC `<bndbox>` elements.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Unit coordinates: fractions of image width/height in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
