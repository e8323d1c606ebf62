//! Migration program configuration format.

use crate::{common::*, dataset::IndexOptions};

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The partition attribute attached to every record.
    pub dataset_name: String,
    /// The image-level database labeled with species.
    pub image_db: PathBuf,
    /// The box-level database.
    pub bbox_db: PathBuf,
    #[serde(flatten)]
    pub index: IndexOptions,
    /// Substitutes for reserved id characters. Unlisted ones become `~`.
    #[serde(default)]
    pub reserved_chars: IndexMap<char, String>,
    pub output: OutputConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config: Self = json5::from_str(&text)?;

        // relative paths are resolved against the config file
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }

        let overrides: EnvOverrides = envy::prefixed("CCT_").from_env()?;
        config.apply_overrides(overrides);

        Ok(config)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        };
        resolve(&mut self.image_db);
        resolve(&mut self.bbox_db);
        resolve(&mut self.output.file);
        if let StoreConfig::JsonFile { path, .. } = &mut self.store {
            resolve(path);
        }
    }

    pub fn apply_overrides(&mut self, overrides: EnvOverrides) {
        let EnvOverrides {
            endpoint,
            master_key,
        } = overrides;

        if let StoreConfig::Cosmos(cosmos) = &mut self.store {
            if let Some(endpoint) = endpoint {
                cosmos.endpoint = endpoint;
            }
            if master_key.is_some() {
                cosmos.master_key = master_key;
            }
        }
    }
}

/// Local output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// The JSON file receiving the merged records.
    pub file: PathBuf,
    /// If set, only the first records are written.
    pub sample_size: Option<usize>,
}

/// Variants of document stores and options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Cosmos DB container options.
    Cosmos(CosmosConfig),
    /// Local JSON file options.
    JsonFile {
        path: PathBuf,
        #[serde(default = "default_page_size")]
        page_size: usize,
    },
}

/// Cosmos DB container options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosConfig {
    /// The account URL, e.g. `https://<account>.documents.azure.com:443/`.
    pub endpoint: String,
    /// The base64 account key. It can be supplied by `CCT_MASTER_KEY` instead.
    #[serde(default, skip_serializing)]
    pub master_key: Option<String>,
    pub database: String,
    pub container: String,
    /// Maximum number of documents per query page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Settings read from `CCT_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvOverrides {
    pub endpoint: Option<String>,
    pub master_key: Option<String>,
}

fn default_page_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    60
}
