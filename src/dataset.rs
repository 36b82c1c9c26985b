//! Random-access dataset view over one split.
//!
//! [`VocDataset`] ties a [`CorpusIndex`] to a [`RecordMaterializer`] and an
//! optional caller-supplied [`Transform`]. Items are materialized lazily on
//! access; nothing is cached, so concurrent `get` calls never interfere.

use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::batch::{collate, BatchUnit};
use crate::corpus::CorpusIndex;
use crate::error::VocError;
use crate::image::{open_image, ImageHandle};
use crate::ir::DetectionRecord;
use crate::materialize::RecordMaterializer;
use crate::vocab::{self, ClassVocabulary};

/// Post-processing applied to every `(image, record)` pair returned by
/// [`VocDataset::get`]. Augmentation pipelines plug in here.
pub trait Transform {
    fn apply(
        &self,
        image: ImageHandle,
        record: DetectionRecord,
    ) -> Result<(ImageHandle, DetectionRecord), VocError>;
}

impl<F> Transform for F
where
    F: Fn(ImageHandle, DetectionRecord) -> Result<(ImageHandle, DetectionRecord), VocError>,
{
    fn apply(
        &self,
        image: ImageHandle,
        record: DetectionRecord,
    ) -> Result<(ImageHandle, DetectionRecord), VocError> {
        self(image, record)
    }
}

/// Returns pairs unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Transform for Identity {
    fn apply(
        &self,
        image: ImageHandle,
        record: DetectionRecord,
    ) -> Result<(ImageHandle, DetectionRecord), VocError> {
        Ok((image, record))
    }
}

#[derive(Clone, Debug)]
pub struct VocDataset<T = Identity> {
    index: CorpusIndex,
    materializer: RecordMaterializer,
    transform: T,
}

impl VocDataset<Identity> {
    /// Dataset over `index`, labelling with the index's vocabulary.
    pub fn new(index: CorpusIndex) -> Self {
        let materializer = RecordMaterializer::new(Arc::clone(index.vocabulary()));
        Self {
            index,
            materializer,
            transform: Identity,
        }
    }

    /// Loads the vocabulary at `vocabulary_path` and indexes `split` under `root`.
    pub fn open(
        root: &Path,
        split: impl AsRef<Path>,
        vocabulary_path: &Path,
    ) -> Result<Self, VocError> {
        let vocabulary = Arc::new(vocab::load(vocabulary_path)?);
        let index = CorpusIndex::build(root, split, vocabulary)?;
        Ok(Self::new(index))
    }
}

impl<T: Transform> VocDataset<T> {
    /// Replaces the transform applied by [`get`](Self::get).
    pub fn with_transform<U: Transform>(self, transform: U) -> VocDataset<U> {
        VocDataset {
            index: self.index,
            materializer: self.materializer,
            transform,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        self.materializer.vocabulary()
    }

    /// Materializes item `i`, opens its image header and applies the transform.
    pub fn get(&self, i: usize) -> Result<(ImageHandle, DetectionRecord), VocError> {
        let item = self.index.get(i)?;
        let record = self.materializer.materialize(i, item)?;
        let image = open_image(&record.image_path)?;
        self.transform.apply(image, record)
    }

    /// Record for item `i` without touching the image. Intended for corpus
    /// statistics and evaluation tooling.
    pub fn coco_index(&self, i: usize) -> Result<DetectionRecord, VocError> {
        let item = self.index.get(i)?;
        self.materializer.materialize_metadata_only(i, item)
    }

    /// `(height, width)` of item `i` as declared by its annotation.
    pub fn height_width(&self, i: usize) -> Result<(u32, u32), VocError> {
        self.materializer.height_width(self.index.get(i)?)
    }

    /// Fetches `indices` with [`get`](Self::get) and collates them.
    pub fn batch(&self, indices: &[usize]) -> Result<BatchUnit<ImageHandle>, VocError> {
        let samples = indices
            .iter()
            .map(|&i| self.get(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(collate(samples))
    }

    /// Up to `k` distinct item positions chosen uniformly at random, sorted.
    /// A seed makes the choice reproducible.
    pub fn sample_indices(&self, k: usize, seed: Option<u64>) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        if k >= indices.len() {
            return indices;
        }

        if let Some(seed) = seed {
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        } else {
            let mut rng = rand::rng();
            indices.shuffle(&mut rng);
        }

        indices.truncate(k);
        indices.sort_unstable();
        indices
    }
}
