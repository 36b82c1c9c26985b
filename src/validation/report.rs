//! Consistency report types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// All mismatches found by one or more consistency passes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConsistencyReport {
    pub issues: Vec<MismatchReport>,
}

impl ConsistencyReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: MismatchReport) {
        self.issues.push(issue);
    }

    /// Appends the issues of another pass.
    pub fn merge(&mut self, other: ConsistencyReport) {
        self.issues.extend(other.issues);
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// True when there are no errors; warnings are allowed.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues whose item id equals `id`.
    pub fn for_item<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a MismatchReport> + 'a {
        self.issues
            .iter()
            .filter(move |issue| issue.item_id.as_deref() == Some(id))
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Consistency check passed: annotations and images all match");
        }

        writeln!(
            f,
            "Consistency check found {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// One missing or diverging counterpart.
#[derive(Clone, Debug, Serialize)]
pub struct MismatchReport {
    pub severity: Severity,
    pub code: MismatchCode,
    pub message: String,
    /// File the issue was found from (annotation, image, or directory).
    pub path: PathBuf,
    /// Item identifier, when the path names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl MismatchReport {
    pub fn new(
        severity: Severity,
        code: MismatchCode,
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        item_id: Option<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            path: path.into(),
            item_id,
        }
    }

    pub fn error(
        code: MismatchCode,
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        item_id: Option<String>,
    ) -> Self {
        Self::new(Severity::Error, code, message, path, item_id)
    }

    pub fn warning(
        code: MismatchCode,
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        item_id: Option<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, message, path, item_id)
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        match &self.item_id {
            Some(id) => write!(
                f,
                "[{}] {:?} for '{}': {}",
                severity, self.code, id, self.message
            ),
            None => write!(
                f,
                "[{}] {:?} at {}: {}",
                severity,
                self.code,
                self.path.display(),
                self.message
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Stable issue codes, usable for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MismatchCode {
    /// `Annotations/` or `JPEGImages/` does not exist.
    MissingDirectory,
    /// An annotation's derived image path does not exist.
    MissingImage,
    /// An image has no annotation (reverse pass only).
    ImageWithoutAnnotation,
    /// The annotation could not be read or decoded.
    UnreadableAnnotation,
    /// The annotation has no `<filename>`.
    MissingFilename,
    /// `JPEGImages/<filename>` does not exist.
    DeclaredImageMissing,
    /// `<filename>` names a different file than the derived image path.
    FilenameMismatch,
    /// The image header could not be read.
    UnreadableImage,
    /// `<size>` disagrees with the image header.
    SizeMismatch,
}
