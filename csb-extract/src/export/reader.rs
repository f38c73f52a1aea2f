//! Relecture d'un extrait GeoJSON en collection
//!
//! Utilisée par la commande `validate` pour repasser la passe de contrôle
//! sur un fichier déjà produit.

use std::path::Path;

use anyhow::{bail, Context, Result};
use csb::{FieldCollection, FieldRecord};
use geojson::GeoJson;
use serde_json::Value;

/// Recharge un fichier GeoJSON produit par l'export
pub fn read_geojson(path: &Path) -> Result<FieldCollection> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .context(format!("Failed to parse GeoJSON: {}", path.display()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("{} is not a GeoJSON FeatureCollection", path.display());
    };

    let mut records = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            bail!("feature without geometry in {}", path.display());
        };
        let geometry: geo::Geometry<f64> = geometry
            .try_into()
            .context("Failed to convert GeoJSON geometry")?;

        let properties = feature.properties.unwrap_or_default();
        records.push(FieldRecord {
            field_id: prop_string(&properties, "field_id"),
            region: prop_string(&properties, "region"),
            state_fips: prop_string(&properties, "state_fips"),
            area_acres: properties
                .get("area_acres")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            crop_code: prop_string(&properties, "crop_code"),
            crop_name: prop_opt_string(&properties, "crop_name"),
            crop_code_list: prop_opt_string(&properties, "crop_code_list"),
            geometry,
        });
    }

    // harmonized() déclare WGS84, le CRS du GeoJSON par définition
    Ok(FieldCollection::harmonized(records))
}

fn prop_string(properties: &serde_json::Map<String, Value>, key: &str) -> String {
    properties
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn prop_opt_string(properties: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}
