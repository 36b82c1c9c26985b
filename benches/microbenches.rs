//! Criterion microbenches for annotation decoding and materialization.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use vocset::corpus::CorpusItem;
use vocset::materialize::RecordMaterializer;
use vocset::tree;
use vocset::vocab::ClassVocabulary;

fn sample_annotation(objects: usize) -> String {
    let mut xml = String::from(
        "<annotation><folder>VOC2007</folder><filename>000001.jpg</filename>\
         <size><width>500</width><height>375</height><depth>3</depth></size>",
    );
    for i in 0..objects {
        let x = (i * 7 % 400) as u32;
        let y = (i * 11 % 300) as u32;
        xml.push_str(&format!(
            "<object><name>{}</name><pose>Unspecified</pose><truncated>0</truncated>\
             <difficult>{}</difficult><bndbox><xmin>{}</xmin><ymin>{}</ymin>\
             <xmax>{}</xmax><ymax>{}</ymax></bndbox></object>",
            ["person", "helmet", "vest"][i % 3],
            i % 2,
            x,
            y,
            x + 40,
            y + 60
        ));
    }
    xml.push_str("</annotation>");
    xml
}

fn bench_decode(c: &mut Criterion) {
    let xml = sample_annotation(50);
    let mut group = c.benchmark_group("tree_decode");
    group.throughput(Throughput::Bytes(xml.len() as u64));

    group.bench_function("decode_50_objects", |b| {
        b.iter(|| {
            let tree = tree::decode(black_box(xml.as_bytes())).unwrap();
            black_box(tree)
        })
    });

    group.finish();
}

/// Includes the annotation file read, as in real dataset access.
fn bench_materialize(c: &mut Criterion) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let annotation_path = temp.path().join("000001.xml");
    std::fs::write(&annotation_path, sample_annotation(50)).expect("write annotation");
    let item = CorpusItem {
        id: "000001".to_string(),
        annotation_path,
        image_path: temp.path().join("000001.jpg"),
    };
    let materializer = RecordMaterializer::new(Arc::new(ClassVocabulary::from_names([
        "person", "helmet", "vest",
    ])));

    let mut group = c.benchmark_group("materialize");
    group.throughput(Throughput::Elements(50));

    group.bench_function("metadata_only_50_objects", |b| {
        b.iter(|| {
            let record = materializer
                .materialize_metadata_only(0, black_box(&item))
                .unwrap();
            black_box(record)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_materialize);
criterion_main!(benches);
