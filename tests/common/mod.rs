#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

/// One `<object>` of a test annotation.
pub struct Obj<'a> {
    pub name: &'a str,
    pub bbox: (f64, f64, f64, f64),
    pub difficult: Option<&'a str>,
}

impl<'a> Obj<'a> {
    pub fn new(name: &'a str, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            name,
            bbox: (xmin, ymin, xmax, ymax),
            difficult: None,
        }
    }

    pub fn difficult(mut self, flag: &'a str) -> Self {
        self.difficult = Some(flag);
        self
    }
}

pub fn annotation_xml(filename: &str, width: u32, height: u32, objects: &[Obj<'_>]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<annotation>\n  <folder>VOC2007</folder>\n  <filename>{filename}</filename>\n  <size>\n    <width>{width}</width>\n    <height>{height}</height>\n    <depth>3</depth>\n  </size>\n"
    );
    for obj in objects {
        xml.push_str("  <object>\n");
        xml.push_str(&format!("    <name>{}</name>\n", obj.name));
        xml.push_str("    <pose>Unspecified</pose>\n");
        if let Some(flag) = obj.difficult {
            xml.push_str(&format!("    <difficult>{flag}</difficult>\n"));
        }
        let (xmin, ymin, xmax, ymax) = obj.bbox;
        xml.push_str(&format!(
            "    <bndbox>\n      <xmin>{xmin}</xmin>\n      <ymin>{ymin}</ymin>\n      <xmax>{xmax}</xmax>\n      <ymax>{ymax}</ymax>\n    </bndbox>\n"
        ));
        xml.push_str("  </object>\n");
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Creates the VOC directory skeleton under `root`.
pub fn create_layout(root: &Path) {
    for dir in ["Annotations", "JPEGImages", "ImageSets/Main"] {
        fs::create_dir_all(root.join(dir)).expect("create corpus dir");
    }
}

/// Writes `Annotations/<id>.xml` and a matching `JPEGImages/<id>.jpg` header.
pub fn write_item(root: &Path, id: &str, width: u32, height: u32, objects: &[Obj<'_>]) {
    write_annotation(root, id, width, height, objects);
    fs::write(
        root.join("JPEGImages").join(format!("{id}.jpg")),
        bmp_bytes(width, height),
    )
    .expect("write image");
}

pub fn write_annotation(root: &Path, id: &str, width: u32, height: u32, objects: &[Obj<'_>]) {
    fs::write(
        root.join("Annotations").join(format!("{id}.xml")),
        annotation_xml(&format!("{id}.jpg"), width, height, objects),
    )
    .expect("write annotation");
}

pub fn write_split(root: &Path, name: &str, ids: &[&str]) {
    let mut content = ids.join("\n");
    content.push('\n');
    fs::write(root.join("ImageSets/Main").join(name), content).expect("write split");
}

/// A small helmet corpus: three items, three classes, one degenerate box.
pub fn create_sample_corpus(root: &Path) {
    create_layout(root);
    write_item(
        root,
        "000001",
        100,
        100,
        &[
            Obj::new("person", 10.0, 10.0, 50.0, 50.0),
            Obj::new("person", 20.0, 20.0, 20.0, 80.0),
        ],
    );
    write_item(
        root,
        "000002",
        200,
        100,
        &[
            Obj::new("helmet", 20.0, 10.0, 60.0, 30.0).difficult("1"),
            Obj::new("vest", 100.0, 50.0, 200.0, 100.0).difficult("0"),
        ],
    );
    write_item(root, "000003", 64, 48, &[Obj::new("person", 0.0, 0.0, 64.0, 48.0)]);
    write_split(root, "train.txt", &["000001", "000002"]);
    write_split(root, "val.txt", &["000003"]);
}
