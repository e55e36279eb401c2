// Configuration — serde views of the dataset constructors
//
// Configs are usually written in YAML next to a training recipe:
//
//   kind: images
//   root: [data/set_a, data/set_b]
//   path_preserved: data/set_b
//   frac: 0.1
//
// or, for labelled data:
//
//   kind: labelled
//   data_path: data/pseudo_labels.csv
//   root: data/images

use std::fs;
use std::path::{Path, PathBuf};

use marten_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::image_dataset::{DEFAULT_FRAC, DEFAULT_SEED};

/// One path or a (possibly nested) list of paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootSpec {
    Path(PathBuf),
    List(Vec<RootSpec>),
    /// Anything else found in a config document. Rejected by [`RootSpec::flatten`].
    Unrecognized(serde_json::Value),
}

impl RootSpec {
    /// All paths in document order.
    ///
    /// Fails with [`Error::Format`] if any entry is neither a path nor a list.
    pub fn flatten(&self) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        self.flatten_into(&mut out)?;
        Ok(out)
    }

    fn flatten_into(&self, out: &mut Vec<PathBuf>) -> Result<()> {
        match self {
            RootSpec::Path(p) => out.push(p.clone()),
            RootSpec::List(items) => {
                for item in items {
                    item.flatten_into(out)?;
                }
            }
            RootSpec::Unrecognized(v) => {
                return Err(Error::Format(format!(
                    "the entry is neither a list nor a path: {v}"
                )));
            }
        }
        Ok(())
    }
}

impl From<&str> for RootSpec {
    fn from(p: &str) -> Self {
        RootSpec::Path(PathBuf::from(p))
    }
}

impl From<PathBuf> for RootSpec {
    fn from(p: PathBuf) -> Self {
        RootSpec::Path(p)
    }
}

impl From<&Path> for RootSpec {
    fn from(p: &Path) -> Self {
        RootSpec::Path(p.to_path_buf())
    }
}

impl<T: Into<RootSpec>> From<Vec<T>> for RootSpec {
    fn from(items: Vec<T>) -> Self {
        RootSpec::List(items.into_iter().map(Into::into).collect())
    }
}

fn default_frac() -> f64 {
    DEFAULT_FRAC
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_true() -> bool {
    true
}

fn default_path_column() -> String {
    "names".to_string()
}

fn default_label_column() -> String {
    "pseudo_labels".to_string()
}

/// Settings for [`ImageDataset`](crate::ImageDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDatasetConfig {
    /// Directory tree(s) to enumerate.
    pub root: RootSpec,
    /// Roots whose files are partly held out.
    #[serde(default)]
    pub path_preserved: Option<RootSpec>,
    /// Fraction of each preserved root that is held out.
    #[serde(default = "default_frac")]
    pub frac: f64,
    /// Decode every candidate at build time and drop unreadable ones.
    #[serde(default = "default_true")]
    pub is_valid: bool,
    /// Seed of the hold-out shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl ImageDatasetConfig {
    /// Config for `root` with no preserved roots and the default fraction,
    /// validation and seed.
    pub fn new(root: impl Into<RootSpec>) -> Self {
        Self {
            root: root.into(),
            path_preserved: None,
            frac: DEFAULT_FRAC,
            is_valid: true,
            seed: DEFAULT_SEED,
        }
    }
}

/// Settings for [`LabelledDataset`](crate::LabelledDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledDatasetConfig {
    /// A `.csv` label table or a directory of class sub-directories.
    pub data_path: PathBuf,
    /// Directory the table's image file names are resolved against.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Header of the image path column.
    #[serde(default = "default_path_column")]
    pub path_column: String,
    /// Header of the label column.
    #[serde(default = "default_label_column")]
    pub label_column: String,
}

impl LabelledDatasetConfig {
    /// Config for `data_path` with no image root and the default column headers.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            root: None,
            path_column: default_path_column(),
            label_column: default_label_column(),
        }
    }
}

/// Either kind of dataset, selected by a `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetConfig {
    Images(ImageDatasetConfig),
    Labelled(LabelledDatasetConfig),
}

/// Parse a YAML document.
pub fn from_yaml_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_yaml::from_str(s).map_err(|e| Error::Config(e.to_string()))
}

/// Parse a JSON document.
pub fn from_json_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
}

/// Load a config file, choosing the parser from the extension
/// (`.yaml`/`.yml` or `.json`).
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let text = || fs::read_to_string(path).map_err(|e| Error::io(path, e));
    match ext.as_deref() {
        Some("yaml") | Some("yml") => from_yaml_str(&text()?),
        Some("json") => from_json_str(&text()?),
        _ => Err(Error::Format(format!(
            "unsupported config file {}",
            path.display()
        ))),
    }
}
