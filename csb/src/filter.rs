//! Résolution des critères de filtrage en valeurs de prédicats
//!
//! Traduit les critères logiques (régions nommées, catégories de cultures,
//! bornes de surface, nombre de parcelles) en codes concrets (FIPS d'états,
//! codes CDL) via des tables de correspondance statiques. Pure validation +
//! lookup, aucun effet de bord.

use crate::error::FilterError;

/// Correspondance région -> codes FIPS d'états.
/// L'id fiboa commence par le FIPS de l'état (2 premiers caractères).
pub const REGION_STATE_FIPS: &[(&str, &[&str])] = &[
    ("corn_belt", &["17", "19", "18", "39", "27"]), // IL, IA, IN, OH, MN
    ("great_plains", &["20", "31", "46", "38", "48"]), // KS, NE, SD, ND, TX
    ("southeast", &["05", "28", "22", "13"]),       // AR, MS, LA, GA
];

/// Correspondance culture -> codes CDL (Cropland Data Layer)
pub const CROP_TYPES: &[(&str, &[&str])] = &[
    ("corn", &["1"]),
    ("soybeans", &["5"]),
    ("wheat", &["23", "24", "25", "26", "27"]), // variantes printemps/hiver/dur
    ("cotton", &["2"]),
];

/// Cultures par défaut quand l'appelant n'en fournit pas
pub const DEFAULT_CROPS: &[&str] = &["corn", "soybeans"];

/// Codes FIPS d'une région nommée
pub fn region_codes(name: &str) -> Option<&'static [&'static str]> {
    REGION_STATE_FIPS
        .iter()
        .find(|(region, _)| *region == name)
        .map(|(_, codes)| *codes)
}

/// Codes CDL d'une catégorie de culture
pub fn crop_codes(name: &str) -> Option<&'static [&'static str]> {
    CROP_TYPES
        .iter()
        .find(|(crop, _)| *crop == name)
        .map(|(_, codes)| *codes)
}

/// Noms de régions reconnus
pub fn valid_regions() -> Vec<&'static str> {
    REGION_STATE_FIPS.iter().map(|(name, _)| *name).collect()
}

/// Noms de cultures reconnus
pub fn valid_crops() -> Vec<&'static str> {
    CROP_TYPES.iter().map(|(name, _)| *name).collect()
}

/// Région correspondant à un code FIPS d'état (référence inverse)
pub fn region_for_fips(fips: &str) -> Option<&'static str> {
    REGION_STATE_FIPS
        .iter()
        .find(|(_, codes)| codes.contains(&fips))
        .map(|(name, _)| *name)
}

/// Critères fournis par l'appelant, construits par appel puis jetés
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// Nombre de parcelles en sortie (>= 1)
    pub count: i64,

    /// Régions à échantillonner (non vide)
    pub regions: Vec<String>,

    /// Cultures à inclure (None = cultures par défaut)
    pub crops: Option<Vec<String>>,

    /// Surface minimale en acres
    pub min_acres: Option<f64>,

    /// Surface maximale en acres
    pub max_acres: Option<f64>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            count: 200,
            regions: vec!["corn_belt".to_string()],
            crops: None,
            min_acres: None,
            max_acres: None,
        }
    }
}

impl FilterCriteria {
    /// Valide les critères et les résout en codes concrets.
    ///
    /// # Errors
    ///
    /// Retourne `FilterError` si le count est < 1, si une région ou une
    /// culture n'existe pas dans les tables, ou si les bornes de surface
    /// sont incohérentes. Le message énumère les noms fautifs et les
    /// options valides.
    pub fn resolve(&self) -> Result<ResolvedFilter, FilterError> {
        if self.count < 1 {
            return Err(FilterError::InvalidCount(self.count));
        }

        if self.regions.is_empty() {
            return Err(FilterError::EmptyRegions);
        }

        let invalid_regions: Vec<String> = self
            .regions
            .iter()
            .filter(|r| region_codes(r).is_none())
            .cloned()
            .collect();
        if !invalid_regions.is_empty() {
            return Err(FilterError::InvalidRegions {
                invalid: invalid_regions,
                valid: valid_regions(),
            });
        }

        let crops: Vec<String> = match &self.crops {
            Some(crops) => crops.clone(),
            None => DEFAULT_CROPS.iter().map(|c| (*c).to_string()).collect(),
        };

        let invalid_crops: Vec<String> = crops
            .iter()
            .filter(|c| crop_codes(c).is_none())
            .cloned()
            .collect();
        if !invalid_crops.is_empty() {
            return Err(FilterError::InvalidCrops {
                invalid: invalid_crops,
                valid: valid_crops(),
            });
        }

        let bounds_ok = match (self.min_acres, self.max_acres) {
            (Some(min), Some(max)) => min >= 0.0 && min <= max,
            (Some(min), None) => min >= 0.0,
            (None, Some(max)) => max >= 0.0,
            (None, None) => true,
        };
        if !bounds_ok {
            return Err(FilterError::InvalidBounds {
                min: self.min_acres,
                max: self.max_acres,
            });
        }

        // Union des codes, doublons écartés (l'ordre n'a pas d'importance)
        let mut state_fips: Vec<String> = Vec::new();
        for region in &self.regions {
            for code in region_codes(region).unwrap_or_default() {
                if !state_fips.iter().any(|c| c == code) {
                    state_fips.push((*code).to_string());
                }
            }
        }

        let mut cdl_codes: Vec<String> = Vec::new();
        for crop in &crops {
            for code in crop_codes(crop).unwrap_or_default() {
                if !cdl_codes.iter().any(|c| c == code) {
                    cdl_codes.push((*code).to_string());
                }
            }
        }

        Ok(ResolvedFilter {
            count: self.count as usize,
            regions: self.regions.clone(),
            state_fips,
            crop_codes: cdl_codes,
            min_acres: self.min_acres,
            max_acres: self.max_acres,
        })
    }
}

/// Filtre résolu, prêt pour la construction de requête
#[derive(Debug, Clone)]
pub struct ResolvedFilter {
    /// Nombre de parcelles en sortie
    pub count: usize,

    /// Régions demandées (nécessaires à l'harmonisation)
    pub regions: Vec<String>,

    /// Union des codes FIPS des régions demandées
    pub state_fips: Vec<String>,

    /// Union des codes CDL des cultures demandées
    pub crop_codes: Vec<String>,

    /// Surface minimale en acres
    pub min_acres: Option<f64>,

    /// Surface maximale en acres
    pub max_acres: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(count: i64, regions: &[&str]) -> FilterCriteria {
        FilterCriteria {
            count,
            regions: regions.iter().map(|r| (*r).to_string()).collect(),
            crops: None,
            min_acres: None,
            max_acres: None,
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = criteria(5, &["corn_belt"]).resolve().unwrap();
        assert_eq!(resolved.count, 5);
        assert_eq!(resolved.state_fips, ["17", "19", "18", "39", "27"]);
        // cultures par défaut: corn + soybeans
        assert_eq!(resolved.crop_codes, ["1", "5"]);
    }

    #[test]
    fn test_resolve_union_of_regions() {
        let resolved = criteria(5, &["corn_belt", "southeast"]).resolve().unwrap();
        assert_eq!(resolved.state_fips.len(), 9);
        assert!(resolved.state_fips.iter().any(|c| c == "17"));
        assert!(resolved.state_fips.iter().any(|c| c == "05"));
    }

    #[test]
    fn test_resolve_duplicate_regions_harmless() {
        let resolved = criteria(5, &["corn_belt", "corn_belt"]).resolve().unwrap();
        assert_eq!(resolved.state_fips.len(), 5);
    }

    #[test]
    fn test_resolve_wheat_variants() {
        let mut c = criteria(2, &["great_plains"]);
        c.crops = Some(vec!["wheat".to_string()]);
        let resolved = c.resolve().unwrap();
        assert_eq!(resolved.crop_codes, ["23", "24", "25", "26", "27"]);
    }

    #[test]
    fn test_resolve_rejects_zero_and_negative_count() {
        assert!(matches!(
            criteria(0, &["corn_belt"]).resolve(),
            Err(FilterError::InvalidCount(0))
        ));
        assert!(matches!(
            criteria(-1, &["corn_belt"]).resolve(),
            Err(FilterError::InvalidCount(-1))
        ));
    }

    #[test]
    fn test_resolve_rejects_empty_regions() {
        assert!(matches!(
            criteria(2, &[]).resolve(),
            Err(FilterError::EmptyRegions)
        ));
    }

    #[test]
    fn test_resolve_rejects_unknown_region() {
        let err = criteria(2, &["not_a_region"]).resolve().unwrap_err();
        match err {
            FilterError::InvalidRegions { invalid, valid } => {
                assert_eq!(invalid, ["not_a_region"]);
                assert_eq!(valid.len(), 3);
            }
            other => panic!("Expected InvalidRegions, got {:?}", other),
        }
        // le message énumère le nom fautif et les options valides
        let message = criteria(2, &["not_a_region"])
            .resolve()
            .unwrap_err()
            .to_string();
        assert!(message.contains("not_a_region"));
        assert!(message.contains("corn_belt"));
    }

    #[test]
    fn test_resolve_rejects_unknown_crop() {
        let mut c = criteria(2, &["corn_belt"]);
        c.crops = Some(vec!["bananas".to_string()]);
        let err = c.resolve().unwrap_err();
        match err {
            FilterError::InvalidCrops { invalid, valid } => {
                assert_eq!(invalid, ["bananas"]);
                assert!(valid.contains(&"corn"));
            }
            other => panic!("Expected InvalidCrops, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_bad_bounds() {
        let mut c = criteria(2, &["corn_belt"]);
        c.min_acres = Some(200.0);
        c.max_acres = Some(50.0);
        assert!(matches!(
            c.resolve(),
            Err(FilterError::InvalidBounds { .. })
        ));

        let mut c = criteria(2, &["corn_belt"]);
        c.min_acres = Some(-1.0);
        assert!(matches!(
            c.resolve(),
            Err(FilterError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_region_for_fips() {
        assert_eq!(region_for_fips("19"), Some("corn_belt"));
        assert_eq!(region_for_fips("48"), Some("great_plains"));
        assert_eq!(region_for_fips("13"), Some("southeast"));
        assert_eq!(region_for_fips("99"), None);
    }
}
