//! Configuration du système
//!
//! Charge un fichier JSON ou le preset embarqué, expose les chemins de
//! données et les valeurs de filtre par défaut, plus un accès par clé
//! pointée (`fields.count`) sur l'arbre brut.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration principale
#[derive(Debug)]
pub struct Config {
    data: ConfigData,
    raw: Value,
}

#[derive(Debug, Deserialize, Serialize)]
struct ConfigData {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    fields: FieldsConfig,
    #[serde(default)]
    download: DownloadConfig,
}

/// Chemins des répertoires de données
#[derive(Debug, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_raw")]
    pub raw: PathBuf,
    #[serde(default = "default_processed")]
    pub processed: PathBuf,
}

/// Valeurs de filtre par défaut
#[derive(Debug, Deserialize, Serialize)]
pub struct FieldsConfig {
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    #[serde(default = "default_crops")]
    pub crops: Vec<String>,
}

/// Réglages du téléchargement
#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_oversample")]
    pub oversample: f64,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}
fn default_raw() -> PathBuf {
    PathBuf::from("data/raw")
}
fn default_processed() -> PathBuf {
    PathBuf::from("data/processed")
}
fn default_count() -> i64 {
    200
}
fn default_regions() -> Vec<String> {
    vec!["corn_belt".to_string()]
}
fn default_crops() -> Vec<String> {
    vec!["corn".to_string(), "soybeans".to_string()]
}
fn default_oversample() -> f64 {
    2.0
}
fn default_output_format() -> String {
    "geojson".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            raw: default_raw(),
            processed: default_processed(),
        }
    }
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            regions: default_regions(),
            crops: default_crops(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            oversample: default_oversample(),
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Configuration par défaut embarquée
    pub fn embedded() -> Result<Self> {
        Self::from_json(include_str!("presets/default.json"))
    }

    fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).context("Failed to parse config JSON")?;
        let data: ConfigData =
            serde_json::from_value(raw.clone()).context("Failed to interpret config")?;
        Ok(Self { data, raw })
    }

    /// Accès par clé pointée sur l'arbre brut (`paths.raw`, `fields.count`)
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut value = &self.raw;
        for part in key.split('.') {
            value = value.as_object()?.get(part)?;
        }
        Some(value)
    }

    /// Répertoire racine des données
    pub fn data_root(&self) -> &Path {
        &self.data.paths.data_root
    }

    /// Répertoire des données brutes
    pub fn raw_data_path(&self) -> &Path {
        &self.data.paths.raw
    }

    /// Répertoire des données traitées
    pub fn processed_data_path(&self) -> &Path {
        &self.data.paths.processed
    }

    pub fn fields(&self) -> &FieldsConfig {
        &self.data.fields
    }

    pub fn download(&self) -> &DownloadConfig {
        &self.data.download
    }

    /// Chemin de sortie sous le répertoire brut, répertoires créés au besoin
    pub fn output_path(&self, filename: &str, subdirectory: Option<&str>) -> Result<PathBuf> {
        let dir = match subdirectory {
            Some(sub) => self.data.paths.raw.join(sub),
            None => self.data.paths.raw.clone(),
        };
        std::fs::create_dir_all(&dir)
            .context(format!("Failed to create directory: {}", dir.display()))?;
        Ok(dir.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.fields().count, 200);
        assert_eq!(config.fields().regions, ["corn_belt"]);
        assert_eq!(config.fields().crops, ["corn", "soybeans"]);
        assert_eq!(config.download().output_format, "geojson");
        assert_eq!(config.raw_data_path(), Path::new("data/raw"));
    }

    #[test]
    fn test_dotted_get() {
        let config = Config::embedded().unwrap();
        assert_eq!(
            config.get("fields.count").and_then(Value::as_i64),
            Some(200)
        );
        assert_eq!(
            config.get("paths.raw").and_then(Value::as_str),
            Some("data/raw")
        );
        assert!(config.get("fields.nope").is_none());
        assert!(config.get("nope.nope").is_none());
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config = Config::from_json(r#"{"fields": {"count": 12}}"#).unwrap();
        assert_eq!(config.fields().count, 12);
        assert_eq!(config.fields().regions, ["corn_belt"]);
        assert_eq!(config.download().oversample, 2.0);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/config.json")).is_err());
    }

    #[test]
    fn test_output_path_creates_subdirectory() {
        let tmp = std::env::temp_dir().join("csb_config_test");
        let _ = std::fs::remove_dir_all(&tmp);

        let config = Config::from_json(&format!(
            r#"{{"paths": {{"raw": "{}"}}}}"#,
            tmp.join("raw").display()
        ))
        .unwrap();

        let path = config
            .output_path("fields.geojson", Some("field_boundaries"))
            .unwrap();
        assert!(path.parent().unwrap().exists());
        assert!(path.ends_with("field_boundaries/fields.geojson"));

        std::fs::remove_dir_all(tmp).ok();
    }
}
