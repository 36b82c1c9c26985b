//! Corpus consistency checks.
//!
//! These passes never fail: every problem found, including unreadable files
//! and missing directories, becomes a [`MismatchReport`] in the returned
//! [`ConsistencyReport`]. They only read the filesystem and may run while
//! other readers use the same corpus.

mod report;

pub use report::{ConsistencyReport, MismatchCode, MismatchReport, Severity};

use std::path::{Path, PathBuf};

use crate::corpus::{
    collect_flat_files, derive_image_path, item_id, CorpusLayout, ANNOTATION_EXTENSION,
    IMAGE_EXTENSION,
};
use crate::image::read_image_dimensions;
use crate::materialize::read_size;
use crate::tree::TreeDecoder;

/// Selects the optional passes run by [`check_corpus`].
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Also verify the `<filename>` declared inside each annotation.
    pub filename_field: bool,
    /// Also report images that have no annotation.
    pub orphan_images: bool,
    /// Also compare `<size>` with the image header.
    pub image_sizes: bool,
}

/// Runs [`check_correspondence`] plus the passes enabled in `opts`.
pub fn check_corpus(root: &Path, opts: &CheckOptions) -> ConsistencyReport {
    let mut report = check_correspondence(root);
    if opts.filename_field {
        report.merge(check_filename_field(root));
    }
    if opts.orphan_images {
        report.merge(check_orphan_images(root));
    }
    if opts.image_sizes {
        report.merge(check_image_sizes(root));
    }
    report
}

/// Reports every annotation whose derived image (`JPEGImages/<id>.jpg`)
/// does not exist. Images without annotations are not reported; see
/// [`check_orphan_images`].
pub fn check_correspondence(root: &Path) -> ConsistencyReport {
    let layout = CorpusLayout::new(root);
    let mut report = ConsistencyReport::new();

    let Some(annotations) = list_annotations(&layout, &mut report) else {
        return report;
    };
    if !require_dir(&layout.images_dir, &mut report) {
        return report;
    }

    for annotation_path in annotations {
        let image_path = derive_image_path(&annotation_path);
        if !image_path.is_file() {
            report.add(MismatchReport::error(
                MismatchCode::MissingImage,
                format!("expected image {} does not exist", image_path.display()),
                &annotation_path,
                item_id(&annotation_path),
            ));
        }
    }

    report
}

/// Trusts the `<filename>` field of each annotation instead of the derived
/// path: `JPEGImages/<filename>` must exist, and a `<filename>` naming a
/// different file than the derived image is reported as a warning.
pub fn check_filename_field(root: &Path) -> ConsistencyReport {
    let layout = CorpusLayout::new(root);
    let mut report = ConsistencyReport::new();
    let decoder = TreeDecoder::default();

    let Some(annotations) = list_annotations(&layout, &mut report) else {
        return report;
    };

    for annotation_path in annotations {
        let id = item_id(&annotation_path);
        let tree = match decoder.decode_file(&annotation_path) {
            Ok(tree) => tree,
            Err(err) => {
                report.add(MismatchReport::error(
                    MismatchCode::UnreadableAnnotation,
                    err.to_string(),
                    &annotation_path,
                    id,
                ));
                continue;
            }
        };

        let Some(filename) = tree.root.text_at("filename") else {
            report.add(MismatchReport::error(
                MismatchCode::MissingFilename,
                "annotation has no <filename>",
                &annotation_path,
                id,
            ));
            continue;
        };

        let declared = layout.images_dir.join(filename);
        if !declared.is_file() {
            report.add(MismatchReport::error(
                MismatchCode::DeclaredImageMissing,
                format!("declared image {} does not exist", declared.display()),
                &annotation_path,
                id.clone(),
            ));
        }

        let derived = derive_image_path(&annotation_path);
        if derived.file_name() != Some(std::ffi::OsStr::new(filename)) {
            report.add(MismatchReport::warning(
                MismatchCode::FilenameMismatch,
                format!(
                    "<filename> '{}' differs from derived image {}",
                    filename,
                    derived.display()
                ),
                &annotation_path,
                id,
            ));
        }
    }

    report
}

/// Reverse pass: reports `JPEGImages/*.jpg` files without an annotation.
pub fn check_orphan_images(root: &Path) -> ConsistencyReport {
    let layout = CorpusLayout::new(root);
    let mut report = ConsistencyReport::new();

    if !require_dir(&layout.images_dir, &mut report) {
        return report;
    }
    let images = match collect_flat_files(&layout.images_dir, IMAGE_EXTENSION) {
        Ok(images) => images,
        Err(err) => {
            report.add(unreadable_dir(&layout.images_dir, &err));
            return report;
        }
    };

    for image_path in images {
        let Some(id) = item_id(&image_path) else {
            continue;
        };
        let annotation_path = layout.annotation_path(&id);
        if !annotation_path.is_file() {
            report.add(MismatchReport::warning(
                MismatchCode::ImageWithoutAnnotation,
                format!("no annotation at {}", annotation_path.display()),
                &image_path,
                Some(id),
            ));
        }
    }

    report
}

/// Compares each annotation's `<size>` with its image header. Annotations
/// whose image is missing are skipped (reported by [`check_correspondence`]).
pub fn check_image_sizes(root: &Path) -> ConsistencyReport {
    let layout = CorpusLayout::new(root);
    let mut report = ConsistencyReport::new();
    let decoder = TreeDecoder::default();

    let Some(annotations) = list_annotations(&layout, &mut report) else {
        return report;
    };

    for annotation_path in annotations {
        let image_path = derive_image_path(&annotation_path);
        if !image_path.is_file() {
            continue;
        }
        let id = item_id(&annotation_path);

        let declared = decoder
            .decode_file(&annotation_path)
            .and_then(|tree| read_size(&tree.root, &annotation_path));
        let declared = match declared {
            Ok(size) => size,
            Err(err) => {
                report.add(MismatchReport::error(
                    MismatchCode::UnreadableAnnotation,
                    err.to_string(),
                    &annotation_path,
                    id,
                ));
                continue;
            }
        };

        match read_image_dimensions(&image_path) {
            Ok(actual) if actual == declared => {}
            Ok((width, height)) => report.add(MismatchReport::warning(
                MismatchCode::SizeMismatch,
                format!(
                    "<size> declares {}x{} but {} is {}x{}",
                    declared.0,
                    declared.1,
                    image_path.display(),
                    width,
                    height
                ),
                &annotation_path,
                id,
            )),
            Err(err) => report.add(MismatchReport::error(
                MismatchCode::UnreadableImage,
                err.to_string(),
                &image_path,
                id,
            )),
        }
    }

    report
}

fn list_annotations(layout: &CorpusLayout, report: &mut ConsistencyReport) -> Option<Vec<PathBuf>> {
    if !require_dir(&layout.annotations_dir, report) {
        return None;
    }
    match collect_flat_files(&layout.annotations_dir, ANNOTATION_EXTENSION) {
        Ok(files) => Some(files),
        Err(err) => {
            report.add(unreadable_dir(&layout.annotations_dir, &err));
            None
        }
    }
}

fn require_dir(dir: &Path, report: &mut ConsistencyReport) -> bool {
    if dir.is_dir() {
        return true;
    }
    report.add(MismatchReport::error(
        MismatchCode::MissingDirectory,
        "directory does not exist",
        dir,
        None,
    ));
    false
}

fn unreadable_dir(dir: &Path, err: &crate::error::VocError) -> MismatchReport {
    MismatchReport::error(
        MismatchCode::MissingDirectory,
        format!("directory could not be listed: {err}"),
        dir,
        None,
    )
}
