//! Schema-light decoding of annotation XML into a nested record.
//!
//! Each element collapses to either a [`AnnotationNode::Leaf`] (no element
//! children, raw text) or a [`AnnotationNode::Group`] keyed by child tag.
//! Sibling tags collapse to a single value, except tags in the decoder's
//! repeatable set, which always collapse to a list. VOC uses exactly one
//! repeatable group, `object`, so [`TreeDecoder::default`] is configured
//! with that tag alone.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use crate::error::VocError;

/// Root element of a VOC annotation.
pub const ANNOTATION_TAG: &str = "annotation";

/// The repeatable group tag of the VOC schema.
pub const OBJECT_TAG: &str = "object";

/// A decoded document: root tag plus its collapsed content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationTree {
    pub root_tag: String,
    pub root: AnnotationNode,
}

impl AnnotationTree {
    /// Returns the root content, failing when the root element is not `tag`.
    pub fn expect_root(&self, tag: &str, path: &Path) -> Result<&AnnotationNode, VocError> {
        if self.root_tag != tag {
            return Err(VocError::MalformedDocument {
                path: path.to_path_buf(),
                message: format!("missing <{tag}> root element (found <{}>)", self.root_tag),
            });
        }
        Ok(&self.root)
    }
}

/// A decoded element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationNode {
    /// Element without element children. `None` when it has no text.
    Leaf(Option<String>),
    /// Element with element children, keyed by child tag.
    Group(BTreeMap<String, Entry>),
}

/// The value stored under one child tag of a [`AnnotationNode::Group`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    One(AnnotationNode),
    /// Always used for repeatable tags, even with a single occurrence.
    Many(Vec<AnnotationNode>),
}

impl AnnotationNode {
    /// Returns the single child stored under `tag`.
    ///
    /// Repeated entries are not returned; use [`entries`](Self::entries).
    pub fn get(&self, tag: &str) -> Option<&AnnotationNode> {
        match self {
            AnnotationNode::Group(children) => match children.get(tag)? {
                Entry::One(node) => Some(node),
                Entry::Many(_) => None,
            },
            AnnotationNode::Leaf(_) => None,
        }
    }

    /// Follows a `/`-separated path of single-valued tags, e.g. `size/width`.
    pub fn lookup(&self, path: &str) -> Option<&AnnotationNode> {
        path.split('/')
            .try_fold(self, |node, segment| node.get(segment))
    }

    /// Returns the repeated children stored under `tag`, or `None` when the
    /// tag never occurred. An empty slice is never returned.
    pub fn entries(&self, tag: &str) -> Option<&[AnnotationNode]> {
        match self {
            AnnotationNode::Group(children) => match children.get(tag)? {
                Entry::Many(nodes) => Some(nodes.as_slice()),
                Entry::One(_) => None,
            },
            AnnotationNode::Leaf(_) => None,
        }
    }

    /// True when `tag` is a key of this group, whatever its multiplicity.
    pub fn contains(&self, tag: &str) -> bool {
        matches!(self, AnnotationNode::Group(children) if children.contains_key(tag))
    }

    /// Leaf text, trimmed. Empty text reads as `None`.
    pub fn text(&self) -> Option<&str> {
        match self {
            AnnotationNode::Leaf(text) => text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty()),
            AnnotationNode::Group(_) => None,
        }
    }

    /// Shorthand for `lookup(path)` followed by [`text`](Self::text).
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(AnnotationNode::text)
    }
}

/// Decoder configured with the set of repeatable group tags.
#[derive(Clone, Debug)]
pub struct TreeDecoder {
    repeatable: BTreeSet<String>,
}

impl Default for TreeDecoder {
    fn default() -> Self {
        Self::new([OBJECT_TAG])
    }
}

impl TreeDecoder {
    pub fn new<I, S>(repeatable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repeatable: repeatable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_repeatable(&self, tag: &str) -> bool {
        self.repeatable.contains(tag)
    }

    /// Decodes an in-memory document. Errors are attributed to `<memory>`.
    pub fn decode(&self, bytes: &[u8]) -> Result<AnnotationTree, VocError> {
        self.decode_with_path(bytes, &memory_path())
    }

    /// Reads and decodes one annotation file.
    pub fn decode_file(&self, path: &Path) -> Result<AnnotationTree, VocError> {
        let bytes = fs::read(path).map_err(|source| VocError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_with_path(&bytes, path)
    }

    fn decode_with_path(&self, bytes: &[u8], path: &Path) -> Result<AnnotationTree, VocError> {
        let xml = std::str::from_utf8(bytes).map_err(|source| VocError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!("input is not valid UTF-8: {source}"),
        })?;

        let document =
            roxmltree::Document::parse(xml).map_err(|source| VocError::MalformedDocument {
                path: path.to_path_buf(),
                message: source.to_string(),
            })?;

        let root = document.root_element();
        Ok(AnnotationTree {
            root_tag: root.tag_name().name().to_string(),
            root: self.collapse(root, path),
        })
    }

    fn collapse(&self, node: Node<'_, '_>, path: &Path) -> AnnotationNode {
        let mut elements = node.children().filter(Node::is_element).peekable();
        if elements.peek().is_none() {
            return AnnotationNode::Leaf(node.text().map(ToOwned::to_owned));
        }

        let mut children: BTreeMap<String, Entry> = BTreeMap::new();
        for child in elements {
            let tag = child.tag_name().name();
            let value = self.collapse(child, path);

            if self.is_repeatable(tag) {
                let entry = children
                    .entry(tag.to_string())
                    .or_insert_with(|| Entry::Many(Vec::new()));
                if let Entry::Many(list) = entry {
                    list.push(value);
                }
            } else if children
                .insert(tag.to_string(), Entry::One(value))
                .is_some()
            {
                tracing::debug!(
                    path = %path.display(),
                    "duplicate <{}> under <{}>; keeping the last one",
                    tag,
                    node.tag_name().name()
                );
            }
        }

        AnnotationNode::Group(children)
    }
}

/// Decodes `bytes` with the default VOC decoder.
pub fn decode(bytes: &[u8]) -> Result<AnnotationTree, VocError> {
    TreeDecoder::default().decode(bytes)
}

/// Reads and decodes `path` with the default VOC decoder.
pub fn decode_file(path: &Path) -> Result<AnnotationTree, VocError> {
    TreeDecoder::default().decode_file(path)
}

/// Decodes `bytes`, discarding the tree. Used by the fuzz target.
#[cfg(feature = "fuzzing")]
pub fn fuzz_decode(bytes: &[u8]) -> Result<(), VocError> {
    decode(bytes).map(|_| ())
}

pub(crate) fn memory_path() -> PathBuf {
    PathBuf::from("<memory>")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <folder>VOC2007</folder>
  <filename>000001.jpg</filename>
  <size>
    <width>353</width>
    <height>500</height>
    <depth>3</depth>
  </size>
  <object>
    <name>dog</name>
    <difficult>0</difficult>
    <bndbox>
      <xmin>48</xmin>
      <ymin>240</ymin>
      <xmax>195</xmax>
      <ymax>371</ymax>
    </bndbox>
  </object>
  <object>
    <name>person</name>
    <bndbox>
      <xmin>8</xmin>
      <ymin>12</ymin>
      <xmax>352</xmax>
      <ymax>498</ymax>
    </bndbox>
  </object>
</annotation>"#;

    #[test]
    fn collapses_leaves_and_groups() {
        let tree = decode(SAMPLE.as_bytes()).expect("decode sample");
        assert_eq!(tree.root_tag, "annotation");
        assert_eq!(tree.root.text_at("filename"), Some("000001.jpg"));
        assert_eq!(tree.root.text_at("size/width"), Some("353"));
        assert_eq!(tree.root.text_at("size/height"), Some("500"));
        assert!(tree.root.get("size").expect("size group").text().is_none());
    }

    #[test]
    fn object_tags_always_collapse_to_a_list() {
        let tree = decode(SAMPLE.as_bytes()).expect("decode sample");
        let objects = tree.root.entries(OBJECT_TAG).expect("object list");
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].text_at("name"), Some("dog"));
        assert_eq!(objects[1].text_at("bndbox/xmax"), Some("352"));
        assert!(tree.root.get(OBJECT_TAG).is_none());

        let single = decode(b"<annotation><object><name>cat</name></object></annotation>")
            .expect("decode single object");
        assert_eq!(single.root.entries(OBJECT_TAG).map(<[_]>::len), Some(1));
    }

    #[test]
    fn absent_object_tag_leaves_no_key() {
        let tree = decode(b"<annotation><filename>a.jpg</filename></annotation>")
            .expect("decode without objects");
        assert!(!tree.root.contains(OBJECT_TAG));
        assert!(tree.root.entries(OBJECT_TAG).is_none());
    }

    #[test]
    fn empty_elements_decode_as_empty_leaves() {
        let tree = decode(b"<annotation><pose/><name>  </name></annotation>").expect("decode");
        assert_eq!(tree.root.get("pose"), Some(&AnnotationNode::Leaf(None)));
        assert_eq!(tree.root.text_at("name"), None);
    }

    #[test]
    fn duplicate_plain_tags_keep_the_last_value() {
        let tree = decode(b"<a><b>1</b><b>2</b></a>").expect("decode");
        assert_eq!(tree.root.text_at("b"), Some("2"));
    }

    #[test]
    fn repeatable_set_is_configurable() {
        let decoder = TreeDecoder::new(["object", "part"]);
        let xml = b"<annotation><object><part><name>hand</name></part><part><name>head</name></part></object></annotation>";
        let tree = decoder.decode(xml).expect("decode");
        let object = &tree.root.entries("object").expect("objects")[0];
        let parts = object.entries("part").expect("parts");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].text_at("name"), Some("head"));
    }

    #[test]
    fn decoding_is_deterministic() {
        let first = decode(SAMPLE.as_bytes()).expect("first decode");
        let second = decode(SAMPLE.as_bytes()).expect("second decode");
        assert_eq!(first, second);
    }

    #[test]
    fn expect_root_checks_the_root_tag() {
        let tree = decode(b"<annotations><filename>a</filename></annotations>").expect("decode");
        let err = tree.expect_root(ANNOTATION_TAG, Path::new("a.xml")).unwrap_err();
        assert!(matches!(err, VocError::MalformedDocument { .. }));

        let tree = decode(SAMPLE.as_bytes()).expect("decode sample");
        assert!(tree.expect_root(ANNOTATION_TAG, Path::new("a.xml")).is_ok());
    }

    #[test]
    fn malformed_input_is_reported() {
        let err = decode(b"<annotation><size></annotation>").unwrap_err();
        assert!(matches!(err, VocError::MalformedDocument { .. }));

        let err = decode(&[0xff, 0xfe, 0x00]).unwrap_err();
        match err {
            VocError::MalformedDocument { path, message } => {
                assert_eq!(path, memory_path());
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
