//! Calcul de surface en acres via la projection équivalente Albers
//!
//! Les géométries CSB sont stockées en EPSG:5070 (NAD83 / Conus Albers),
//! une projection équivalente: les surfaces mesurées en m² y sont
//! proportionnelles aux surfaces au sol. Le calcul est donc direct; un
//! stockage natif non équivalent passe d'abord par [`crate::reproject`].

use geo::{Area, Geometry};

/// EPSG de la projection équivalente des surfaces (NAD83 / Conus Albers)
pub const ALBERS_CONUS_EPSG: u32 = 5070;

/// EPSG du système géodésique de sortie (WGS84)
pub const WGS84_EPSG: u32 = 4326;

/// 1 acre = 4046.86 m²
pub const SQUARE_METERS_PER_ACRE: f64 = 4046.86;

/// Surface en acres d'une géométrie exprimée en coordonnées Albers (mètres)
pub fn area_acres(geometry: &Geometry) -> f64 {
    geometry.unsigned_area() / SQUARE_METERS_PER_ACRE
}
