//! Profils de schéma du jeu de données distant
//!
//! Le schéma distant a changé plusieurs fois de révision en révision (noms
//! de colonnes, sémantique des codes, convention d'URL). Le mapping est une
//! valeur explicite fournie à la construction du downloader: réconcilier une
//! nouvelle révision amont est un changement de configuration, pas une
//! réécriture. La révision fiboa est la référence; les brouillons antérieurs
//! sont obsolètes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Marqueur de partition dans les URLs modélisées par code FIPS
pub const PARTITION_PLACEHOLDER: &str = "{state_fips}";

/// Source du code administratif d'une ligne
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AdminCodeSource {
    /// Préfixe de longueur fixe de la colonne identifiant
    IdPrefix { len: usize },
    /// Colonne dédiée
    Column { name: String },
}

/// Sémantique de correspondance des codes de culture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropCodeMatch {
    /// Égalité sur la colonne code de l'année courante
    Exact,
    /// Appartenance à la colonne historique (liste délimitée par virgules)
    InList,
}

/// Unité de la colonne de surface précalculée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Acres,
    Hectares,
    SquareMeters,
}

impl AreaUnit {
    /// Facteur de conversion acres -> unité de la colonne
    pub fn per_acre(self) -> f64 {
        match self {
            AreaUnit::Acres => 1.0,
            AreaUnit::Hectares => 0.404686,
            AreaUnit::SquareMeters => 4046.86,
        }
    }
}

/// Colonne de surface précalculée côté serveur
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AreaColumn {
    pub name: String,
    pub unit: AreaUnit,
}

/// Mapping versionné du schéma distant
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchemaProfile {
    /// URL du GeoParquet (peut contenir `{state_fips}` pour un jeu partitionné)
    pub url: String,

    /// Colonne identifiant
    pub id_col: String,

    /// Colonne géométrie (WKB)
    pub geometry_col: String,

    /// Colonne code de culture de l'année courante
    pub crop_code_col: String,

    /// Colonne nom de culture
    pub crop_name_col: Option<String>,

    /// Colonne historique des codes (liste délimitée)
    pub crop_code_list_col: Option<String>,

    /// Dérivation du code administratif
    pub admin_code: AdminCodeSource,

    /// Sémantique de filtrage des cultures
    pub crop_match: CropCodeMatch,

    /// Colonne de surface précalculée, pour le pushdown des bornes
    pub area_col: Option<AreaColumn>,

    /// EPSG natif des géométries stockées
    pub native_epsg: u32,
}

impl SchemaProfile {
    /// Charge un profil depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self, ExtractError> {
        match preset {
            "fiboa" => Self::from_json(include_str!("presets/fiboa.json")),
            _ => Err(ExtractError::InvalidProfile(format!(
                "unknown preset: {}. Use: fiboa",
                preset
            ))),
        }
    }

    /// Charge un profil depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::InvalidProfile(format!(
                "failed to read profile {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    fn from_json(json: &str) -> Result<Self, ExtractError> {
        let profile: SchemaProfile = serde_json::from_str(json)
            .map_err(|e| ExtractError::InvalidProfile(format!("failed to parse profile: {}", e)))?;
        profile.check()?;
        Ok(profile)
    }

    /// Vérifie la cohérence interne du profil
    pub fn check(&self) -> Result<(), ExtractError> {
        if self.crop_match == CropCodeMatch::InList && self.crop_code_list_col.is_none() {
            return Err(ExtractError::InvalidProfile(
                "crop_match is in_list but crop_code_list_col is not set".to_string(),
            ));
        }
        if let AdminCodeSource::IdPrefix { len } = self.admin_code {
            if len == 0 {
                return Err(ExtractError::InvalidProfile(
                    "admin_code id_prefix len must be >= 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// URLs concrètes à interroger: une seule, ou une par code FIPS
    /// quand l'URL est modélisée par partition
    pub fn partition_urls(&self, state_fips: &[String]) -> Vec<String> {
        if self.url.contains(PARTITION_PLACEHOLDER) {
            state_fips
                .iter()
                .map(|fips| self.url.replace(PARTITION_PLACEHOLDER, fips))
                .collect()
        } else {
            vec![self.url.clone()]
        }
    }
}
