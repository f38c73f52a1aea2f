//! Contrôle de validité d'une collection avant persistance
//!
//! Garde-fou de frontière, pas une preuve de correction sémantique:
//! retourne false après log de la raison, ne lève jamais.

use geo::Validation;
use tracing::{error, info};

use crate::types::{FieldCollection, REQUIRED_COLUMNS};

/// Vérifie une collection: non vide, colonnes requises présentes,
/// géométries valides, CRS déclaré
pub fn validate(data: &FieldCollection) -> bool {
    if data.is_empty() {
        error!("No fields in dataset");
        return false;
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !data.has_column(col))
        .copied()
        .collect();
    if !missing.is_empty() {
        error!("Missing required columns: {:?}", missing);
        return false;
    }

    let invalid = data
        .records
        .iter()
        .filter(|r| !r.geometry.is_valid())
        .count();
    if invalid > 0 {
        error!("Found {} invalid geometries", invalid);
        return false;
    }

    if data.crs.is_none() {
        error!("Collection has no CRS defined");
        return false;
    }

    info!("Field boundaries validation passed");
    true
}
