// Tests for marten-data: scanning, ImageDataset, LabelledDataset, DataLoader

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use marten_data::config::{from_yaml_str, ImageDatasetConfig, LabelledDatasetConfig};
use marten_data::transform::{from_fn, Grayscale, Normalize, Resize, ToSample};
use marten_data::{
    load_config, DataLoader, DataLoaderConfig, Dataset, DatasetConfig, Error, ImageDataset,
    ImageDecoder, LabelledDataset, RootSpec, TransformExt,
};
use tempfile::TempDir;

// Fixture helpers

fn write_image(path: &Path, w: u32, h: u32, shade: u8) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([shade, 0, 255 - shade])));
    let format = ImageFormat::from_path(path).unwrap();
    img.save_with_format(path, format).unwrap();
}

fn write_file(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// root/
///   a.png, b.JPG, notes.txt
///   nested/c.jpeg, nested/deeper/d.tiff, nested/e.gif
fn mixed_tree(root: &Path) -> usize {
    write_image(&root.join("a.png"), 4, 4, 10);
    write_image(&root.join("b.JPG"), 4, 4, 20);
    write_file(&root.join("notes.txt"), b"not an image");
    write_image(&root.join("nested/c.jpeg"), 4, 4, 30);
    write_image(&root.join("nested/deeper/d.tiff"), 4, 4, 40);
    write_file(&root.join("nested/e.gif"), b"GIF89a");
    4
}

fn flat_tree(root: &Path, n: usize) {
    for i in 0..n {
        write_image(&root.join(format!("img_{i:03}.png")), 3, 2, i as u8);
    }
}

// ImageDataset

#[test]
fn test_length_counts_recognized_extensions() {
    let tmp = TempDir::new().unwrap();
    let expected = mixed_tree(tmp.path());

    let ds = ImageDataset::new([tmp.path()]).build().unwrap();
    assert_eq!(ds.len(), expected);
    assert!(ds.preserved().is_empty());
    assert!(ds.paths().iter().all(|p| p.extension().unwrap() != "gif"));
}

#[test]
fn test_several_roots_and_missing_root() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("dataset1");
    let b = tmp.path().join("dataset2");
    flat_tree(&a, 3);
    flat_tree(&b, 5);

    let ds = ImageDataset::new([a.clone(), tmp.path().join("missing"), b.clone()])
        .build()
        .unwrap();
    assert_eq!(ds.len(), 8);
    // roots keep their order
    assert!(ds.path_of(0).unwrap().starts_with(&a));
    assert!(ds.path_of(7).unwrap().starts_with(&b));
}

#[test]
fn test_open_accepts_nested_root_lists() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    flat_tree(&a, 2);
    flat_tree(&b, 2);

    let spec = RootSpec::List(vec![RootSpec::from(a), RootSpec::from(vec![b])]);
    let ds = ImageDataset::open(spec).unwrap();
    assert_eq!(ds.len(), 4);
}

#[test]
fn test_preserved_root_holds_out_floor_fraction() {
    let tmp = TempDir::new().unwrap();
    let kept = tmp.path().join("kept");
    let preserved = tmp.path().join("preserved");
    flat_tree(&kept, 6);
    flat_tree(&preserved, 25);

    let build = || {
        ImageDataset::new([&kept, &preserved])
            .preserve(&preserved)
            .frac(0.1)
            .build()
            .unwrap()
    };
    let ds = build();
    assert_eq!(ds.preserved().len(), 2); // floor(0.1 * 25)
    assert_eq!(ds.len(), 6 + 23);
    assert!(ds.preserved().iter().all(|p| p.starts_with(&preserved)));
    assert!(ds.preserved().iter().all(|p| !ds.paths().contains(p)));

    // fixed seed: same split every time
    let again = build();
    assert_eq!(ds.preserved(), again.preserved());
    assert_eq!(ds.paths(), again.paths());

    let held = ds.held_out();
    assert_eq!(held.len(), 2);
    assert!(held.get(0).is_ok());
}

#[test]
fn test_preserved_split_depends_on_seed_only() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("p");
    flat_tree(&root, 40);

    let split = |seed| {
        ImageDataset::new([&root])
            .preserve(&root)
            .frac(0.5)
            .seed(seed)
            .validate(false)
            .build()
            .unwrap()
            .preserved()
            .to_vec()
    };
    assert_eq!(split(24).len(), 20);
    assert_eq!(split(24), split(24));
    assert_ne!(split(24), split(25));
}

#[test]
fn test_invalid_fraction_rejected() {
    let tmp = TempDir::new().unwrap();
    let err = ImageDataset::new([tmp.path()]).frac(1.5).build().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_validation_skips_corrupt_files() {
    let tmp = TempDir::new().unwrap();
    flat_tree(tmp.path(), 3);
    write_file(&tmp.path().join("broken.png"), b"\x89PNG truncated");

    let validated = ImageDataset::new([tmp.path()]).build().unwrap();
    assert_eq!(validated.len(), 3);

    let unvalidated = ImageDataset::new([tmp.path()])
        .validate(false)
        .build()
        .unwrap();
    assert_eq!(unvalidated.len(), 4);

    let broken = unvalidated
        .paths()
        .iter()
        .position(|p| p.ends_with("broken.png"))
        .unwrap();
    match unvalidated.get(broken) {
        Err(Error::Sample { index, source }) => {
            assert_eq!(index, broken);
            assert!(matches!(*source, Error::Decode { .. }));
        }
        other => panic!("expected a sample error, got {other:?}"),
    }
}

#[test]
fn test_every_sample_round_trips_through_transform() {
    let tmp = TempDir::new().unwrap();
    mixed_tree(tmp.path());

    let ds = ImageDataset::new([tmp.path()])
        .build()
        .unwrap()
        .with_transform(Resize::new(8, 6).then(ToSample));
    for i in 0..ds.len() {
        let s = ds.get(i).unwrap();
        assert_eq!(s.feature_shape, vec![3, 6, 8]);
        assert_eq!(s.features.len(), 3 * 6 * 8);
    }
}

#[test]
fn test_luma_and_rgb_files_share_the_rgb_pipeline() {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("a.png"), 5, 5, 60);
    DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 4, Luma([128])))
        .save(tmp.path().join("b.png"))
        .unwrap();

    let ds = ImageDataset::new([tmp.path()])
        .build()
        .unwrap()
        .with_transform(Resize::new(8, 8).then(ToSample).then(Normalize::imagenet()));
    assert_eq!(ds.len(), 2);
    for i in 0..ds.len() {
        let s = ds.get(i).unwrap();
        assert_eq!(s.feature_shape, vec![3, 8, 8]);
        assert!(s.features.iter().all(|v| v.is_finite()));
    }

    let gray = ImageDataset::new([tmp.path()])
        .build()
        .unwrap()
        .with_transform(Grayscale.then(ToSample).then(Normalize::imagenet()));
    for i in 0..gray.len() {
        assert_eq!(gray.get(i).unwrap().feature_shape[0], 1);
    }
}

#[test]
fn test_get_without_transform_returns_image() {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("only.png"), 5, 7, 0);

    let ds = ImageDataset::new([tmp.path()]).build().unwrap();
    let img = ds.get(0).unwrap();
    assert_eq!((img.width(), img.height()), (5, 7));
}

#[test]
fn test_index_out_of_bounds() {
    let tmp = TempDir::new().unwrap();
    flat_tree(tmp.path(), 2);
    let ds = ImageDataset::new([tmp.path()]).build().unwrap();
    assert!(matches!(
        ds.get(2),
        Err(Error::IndexOutOfBounds { index: 2, len: 2 })
    ));
}

#[test]
fn test_file_removed_after_build_is_sample_error() {
    let tmp = TempDir::new().unwrap();
    flat_tree(tmp.path(), 2);
    let ds = ImageDataset::new([tmp.path()]).build().unwrap();
    fs::remove_file(ds.path_of(1).unwrap()).unwrap();

    assert!(ds.get(0).is_ok());
    match ds.get(1) {
        Err(Error::Sample { index: 1, source }) => assert!(matches!(*source, Error::Io { .. })),
        other => panic!("expected a sample error, got {other:?}"),
    }
}

struct SizeOnlyDecoder;

impl ImageDecoder for SizeOnlyDecoder {
    fn decode(&self, _path: &Path, bytes: &[u8]) -> marten_data::Result<DynamicImage> {
        Ok(DynamicImage::new_luma8(bytes.len() as u32, 1))
    }
}

#[test]
fn test_custom_decoder_is_used() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("raw.png"), b"0123456789");

    let ds = ImageDataset::new([tmp.path()])
        .decoder(SizeOnlyDecoder)
        .build()
        .unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.get(0).unwrap().width(), 10);
}

#[test]
fn test_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    flat_tree(&a, 4);
    flat_tree(&b, 20);

    let yaml = format!(
        "kind: images\nroot: [{a}, {b}]\npath_preserved: [{b}]\nfrac: 0.25\n",
        a = a.display(),
        b = b.display()
    );
    let cfg_path = tmp.path().join("dataset.yaml");
    fs::write(&cfg_path, yaml).unwrap();

    let cfg: DatasetConfig = load_config(&cfg_path).unwrap();
    let DatasetConfig::Images(cfg) = cfg else {
        panic!("expected an images config");
    };
    let ds = ImageDataset::from_config(&cfg).unwrap();
    assert_eq!(ds.preserved().len(), 5);
    assert_eq!(ds.len(), 4 + 15);
}

#[test]
fn test_from_config_rejects_unrecognized_root() {
    let cfg: ImageDatasetConfig = from_yaml_str("root: {nested: map}\n").unwrap();
    assert!(matches!(
        ImageDataset::from_config(&cfg),
        Err(Error::Format(_))
    ));
}

// LabelledDataset

fn labelled_csv(dir: &Path) -> PathBuf {
    let images = dir.join("images");
    write_image(&images.join("0.png"), 4, 4, 0);
    write_image(&images.join("1.png"), 4, 4, 1);
    write_image(&images.join("2.jpg"), 4, 4, 2);
    let csv = dir.join("labels.csv");
    // paths as written on another machine
    write_file(
        &csv,
        b"names,pseudo_labels\n/old/host/0.png,dog\n/old/host/1.png,cat\n/old/host/2.jpg,dog\n",
    );
    csv
}

#[test]
fn test_csv_with_root_rebases_paths() {
    let tmp = TempDir::new().unwrap();
    let csv = labelled_csv(tmp.path());
    let images = tmp.path().join("images");

    let ds = LabelledDataset::new(&csv).root(&images).build().unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.num_classes(), 2);
    assert_eq!(ds.path_of(2).unwrap(), images.join("2.jpg"));
    assert_eq!(ds.raw_label(1), Some("cat"));

    let (img, label) = ds.get(0).unwrap();
    assert_eq!(img.width(), 4);
    assert_eq!(Some(label), ds.labels().index_of("dog"));
    assert_eq!(ds.get(2).unwrap().1, label);
    assert_ne!(ds.get(1).unwrap().1, label);
}

#[test]
fn test_csv_without_root_uses_entries_verbatim() {
    let tmp = TempDir::new().unwrap();
    let csv = labelled_csv(tmp.path());

    let ds = LabelledDataset::new(&csv).build().unwrap();
    assert_eq!(ds.path_of(0).unwrap(), Path::new("/old/host/0.png"));
    match ds.get(0) {
        Err(Error::Sample { index: 0, .. }) => {}
        other => panic!("expected a sample error, got {other:?}"),
    }
}

#[test]
fn test_csv_custom_columns_and_missing_column() {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("x.png"), 2, 2, 0);
    let csv = tmp.path().join("t.csv");
    write_file(&csv, b"file,cluster\nx.png,7\n");

    let err = LabelledDataset::new(&csv).build().unwrap_err();
    assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "names"));

    let mut cfg = LabelledDatasetConfig::new(&csv);
    cfg.root = Some(tmp.path().to_path_buf());
    cfg.path_column = "file".into();
    cfg.label_column = "cluster".into();
    let ds = LabelledDataset::from_config(&cfg).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.get(0).unwrap().1, 0);
}

#[test]
fn test_class_directories() {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("zebra/1.png"), 2, 2, 0);
    write_image(&tmp.path().join("zebra/2.png"), 2, 2, 0);
    write_image(&tmp.path().join("ant/1.jpeg"), 2, 2, 0);
    write_file(&tmp.path().join("ant/readme.md"), b"#");
    // not descended into
    write_image(&tmp.path().join("ant/nested/3.png"), 2, 2, 0);
    write_file(&tmp.path().join("loose.png"), b"");

    let ds = LabelledDataset::new(tmp.path()).build().unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.labels().names(), &["ant".to_string(), "zebra".to_string()]);
    assert_eq!(ds.label_of(0), Some(0));
    assert_eq!(ds.label_of(2), Some(1));

    let with_samples = ds.with_transform(ToSample);
    let (sample, label) = with_samples.get(1).unwrap();
    assert_eq!(label, 1);
    assert_eq!(sample.with_class(label).target, vec![1.0]);
}

#[test]
fn test_label_translation_is_dense_bijection() {
    let tmp = TempDir::new().unwrap();
    let mut rows = String::from("names,pseudo_labels\n");
    let labels = ["c3", "c1", "c7", "c1", "c3", "c9"];
    for (i, l) in labels.iter().enumerate() {
        write_image(&tmp.path().join(format!("{i}.png")), 1, 1, 0);
        rows.push_str(&format!("{i}.png,{l}\n"));
    }
    let csv = tmp.path().join("labels.csv");
    write_file(&csv, rows.as_bytes());

    let ds = LabelledDataset::new(&csv).root(tmp.path()).build().unwrap();
    let mut indices: Vec<usize> = (0..ds.len()).map(|i| ds.get(i).unwrap().1).collect();
    indices.sort();
    indices.dedup();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    for name in ds.labels().names() {
        let idx = ds.labels().index_of(name).unwrap();
        assert_eq!(ds.labels().name_of(idx), Some(name.as_str()));
    }
}

#[test]
fn test_integer_labels_map_to_their_value() {
    let tmp = TempDir::new().unwrap();
    let mut rows = String::from("names,pseudo_labels\n");
    for k in (0..12).rev() {
        write_image(&tmp.path().join(format!("{k}.png")), 1, 1, 0);
        rows.push_str(&format!("{k}.png,{k}\n"));
    }
    let csv = tmp.path().join("labels.csv");
    write_file(&csv, rows.as_bytes());

    let ds = LabelledDataset::new(&csv).root(tmp.path()).build().unwrap();
    assert_eq!(ds.num_classes(), 12);
    for i in 0..ds.len() {
        let raw: usize = ds.raw_label(i).unwrap().parse().unwrap();
        assert_eq!(ds.get(i).unwrap().1, raw);
    }
}

#[test]
fn test_unrecognized_data_path() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("labels.parquet");
    write_file(&file, b"");
    assert!(matches!(
        LabelledDataset::new(&file).build(),
        Err(Error::Format(_))
    ));
}

// DataLoader over the adapters

#[test]
fn test_loader_batches_image_dataset() {
    let tmp = TempDir::new().unwrap();
    flat_tree(tmp.path(), 70);

    let ds = ImageDataset::new([tmp.path()])
        .build()
        .unwrap()
        .with_transform(Resize::new(4, 4).then(ToSample));
    let config = DataLoaderConfig::default().batch_size(32).num_workers(2);
    let mut loader = DataLoader::new(&ds, config);
    assert_eq!(loader.num_batches(), 3);

    let sizes: Vec<usize> = loader.iter().map(|b| b.unwrap().len()).collect();
    assert_eq!(sizes, vec![32, 32, 6]);
}

#[test]
fn test_loader_with_closure_transform_and_labels() {
    let tmp = TempDir::new().unwrap();
    let csv = labelled_csv(tmp.path());
    let ds = LabelledDataset::new(&csv)
        .root(tmp.path().join("images"))
        .build()
        .unwrap()
        .with_transform(from_fn(|img: DynamicImage| img.width()));

    let mut loader = DataLoader::new(&ds, DataLoaderConfig::default().batch_size(2));
    let batches = loader.epoch_batches().unwrap();
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().flatten().all(|(w, _)| *w == 4));
}
