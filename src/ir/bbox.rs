//! Axis-aligned boxes in XYXY order.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::{Normalized, Pixel};

/// An axis-aligned bounding box `(xmin, ymin, xmax, ymax)`.
///
/// The `TSpace` parameter is either [`Pixel`] or [`Normalized`]. Construction
/// does not enforce `min < max`; use [`BBoxXYXY::is_degenerate`] to test.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Width; negative for an inverted box.
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height; negative for an inverted box.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true when the box has zero or negative extent on either axis,
    /// or when any coordinate is NaN/infinite.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.xmax <= self.xmin || self.ymax <= self.ymin
    }

    /// The four coordinates in `[xmin, ymin, xmax, ymax]` order.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl BBoxXYXY<Pixel> {
    /// Divides x by `image_width` and y by `image_height`.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Clamps every coordinate into `[0, 1]`. NaN coordinates are left as is
    /// so that [`is_degenerate`](Self::is_degenerate) still rejects them;
    /// infinities land on the edges, so check [`is_finite`](Self::is_finite)
    /// before clamping.
    pub fn clamp_unit(&self) -> Self {
        Self::from_xyxy(
            self.xmin.clamp(0.0, 1.0),
            self.ymin.clamp(0.0, 1.0),
            self.xmax.clamp(0.0, 1.0),
            self.ymax.clamp(0.0, 1.0),
        )
    }

    /// Returns true when all coordinates already lie in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        self.to_array()
            .iter()
            .all(|value| (0.0..=1.0).contains(value))
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

// Manual serde impls keep `TSpace` free of Serialize/Deserialize bounds.
impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BBoxXYXY", 4)?;
        state.serialize_field("xmin", &self.xmin)?;
        state.serialize_field("ymin", &self.ymin)?;
        state.serialize_field("xmax", &self.xmax)?;
        state.serialize_field("ymax", &self.ymax)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            xmin: f64,
            ymin: f64,
            xmax: f64,
            ymax: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(raw.xmin, raw.ymin, raw.xmax, raw.ymax))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_by_image_dimensions() {
        let pixel: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 50.0, 80.0);
        let unit = pixel.to_normalized(100.0, 200.0);
        assert_eq!(unit.to_array(), [0.1, 0.1, 0.5, 0.4]);
        assert!(unit.is_within_unit());
    }

    #[test]
    fn zero_width_and_inverted_boxes_are_degenerate() {
        let zero_width: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(20.0, 20.0, 20.0, 80.0);
        assert!(zero_width.is_degenerate());

        let inverted: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(50.0, 10.0, 10.0, 50.0);
        assert!(inverted.is_degenerate());

        let nan: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(f64::NAN, 0.0, 1.0, 1.0);
        assert!(nan.is_degenerate());

        let ok: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0);
        assert!(!ok.is_degenerate());
    }

    #[test]
    fn clamp_unit_pulls_overhanging_edges_back_inside() {
        let overhang: BBoxXYXY<Normalized> = BBoxXYXY::from_xyxy(-0.1, 0.2, 1.3, 0.9);
        let clamped = overhang.clamp_unit();
        assert_eq!(clamped.to_array(), [0.0, 0.2, 1.0, 0.9]);
        assert!(!overhang.is_within_unit());
    }

    #[test]
    fn area_is_width_times_height() {
        let bbox: BBoxXYXY<Normalized> = BBoxXYXY::from_xyxy(0.1, 0.2, 0.5, 0.7);
        assert!((bbox.area() - 0.2).abs() < 1e-12);
    }
}
