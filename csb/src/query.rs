//! Construction des requêtes SQL pushdown exécutées par DuckDB
//!
//! DuckDB pousse les prédicats vers le GeoParquet distant (requêtes HTTP
//! range): seuls les row groups et colonnes utiles traversent le réseau.
//! Les noms de colonnes fiboa contiennent des deux-points et doivent être
//! cités entre guillemets doubles.

use crate::error::ExtractError;
use crate::filter::ResolvedFilter;
use crate::schema::{AdminCodeSource, CropCodeMatch, SchemaProfile};

/// Nombre de lignes demandées au serveur: sur-échantillonnage pour
/// compenser les lignes écartées au post-filtrage (surfaces nulles)
pub fn request_count(count: usize, oversample: f64) -> usize {
    let scaled = (count as f64 * oversample).ceil() as usize;
    scaled.max(count + 10)
}

/// Cite un identifiant SQL (guillemets doubles)
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Cite une valeur littérale (guillemets simples)
fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Liste de littéraux pour une clause IN
fn in_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_str(v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expression SQL du code administratif d'une ligne
fn admin_expr(profile: &SchemaProfile) -> String {
    match &profile.admin_code {
        AdminCodeSource::IdPrefix { len } => {
            format!("substr({}, 1, {})", quote_ident(&profile.id_col), len)
        }
        AdminCodeSource::Column { name } => quote_ident(name),
    }
}

/// Liste SELECT à arité fixe: les colonnes absentes du profil sortent en
/// NULL pour que le décodage par index reste stable
fn select_list(profile: &SchemaProfile) -> String {
    let crop_name = match &profile.crop_name_col {
        Some(col) => format!("CAST({} AS VARCHAR)", quote_ident(col)),
        None => "CAST(NULL AS VARCHAR)".to_string(),
    };
    let crop_code_list = match &profile.crop_code_list_col {
        Some(col) => format!("CAST({} AS VARCHAR)", quote_ident(col)),
        None => "CAST(NULL AS VARCHAR)".to_string(),
    };

    format!(
        "{} AS field_id,\n    {} AS state_fips,\n    CAST({} AS VARCHAR) AS crop_code,\n    {} AS crop_name,\n    {} AS crop_code_list,\n    ST_AsWKB({}) AS geometry",
        quote_ident(&profile.id_col),
        admin_expr(profile),
        quote_ident(&profile.crop_code_col),
        crop_name,
        crop_code_list,
        quote_ident(&profile.geometry_col),
    )
}

/// Prédicat de filtrage des cultures selon la sémantique du profil
fn crop_clause(profile: &SchemaProfile, codes: &[String]) -> Result<String, ExtractError> {
    match profile.crop_match {
        CropCodeMatch::Exact => Ok(format!(
            "CAST({} AS VARCHAR) IN ({})",
            quote_ident(&profile.crop_code_col),
            in_list(codes)
        )),
        CropCodeMatch::InList => {
            let col = profile.crop_code_list_col.as_deref().ok_or_else(|| {
                ExtractError::InvalidProfile(
                    "crop_match is in_list but crop_code_list_col is not set".to_string(),
                )
            })?;
            let parts: Vec<String> = codes
                .iter()
                .map(|code| {
                    format!(
                        "list_contains(string_split(CAST({} AS VARCHAR), ','), {})",
                        quote_ident(col),
                        quote_str(code)
                    )
                })
                .collect();
            Ok(format!("({})", parts.join(" OR ")))
        }
    }
}

/// Clause de bornes de surface, poussée côté serveur quand le profil
/// expose une colonne de surface précalculée
fn area_clause(profile: &SchemaProfile, filter: &ResolvedFilter) -> Option<String> {
    let area = profile.area_col.as_ref()?;
    let factor = area.unit.per_acre();
    let col = quote_ident(&area.name);
    match (filter.min_acres, filter.max_acres) {
        (Some(min), Some(max)) => Some(format!(
            "{} BETWEEN {} AND {}",
            col,
            min * factor,
            max * factor
        )),
        (Some(min), None) => Some(format!("{} >= {}", col, min * factor)),
        (None, Some(max)) => Some(format!("{} <= {}", col, max * factor)),
        (None, None) => None,
    }
}

/// Sélection interne sur une URL concrète.
/// `with_admin` est faux pour les jeux partitionnés: la partition porte
/// déjà le filtre administratif.
fn partition_select(
    profile: &SchemaProfile,
    filter: &ResolvedFilter,
    url: &str,
    with_admin: bool,
) -> Result<String, ExtractError> {
    let mut clauses: Vec<String> = Vec::new();
    if with_admin {
        clauses.push(format!(
            "{} IN ({})",
            admin_expr(profile),
            in_list(&filter.state_fips)
        ));
    }
    clauses.push(crop_clause(profile, &filter.crop_codes)?);
    if let Some(clause) = area_clause(profile, filter) {
        clauses.push(clause);
    }

    Ok(format!(
        "SELECT\n    {}\nFROM read_parquet({})\nWHERE {}",
        select_list(profile),
        quote_str(url),
        clauses.join("\nAND ")
    ))
}

/// Construit la requête d'extraction: sélection poussée, ordre aléatoire,
/// limite sur-échantillonnée
pub fn build_select(
    profile: &SchemaProfile,
    filter: &ResolvedFilter,
    oversample: f64,
) -> Result<String, ExtractError> {
    profile.check()?;
    let limit = request_count(filter.count, oversample);
    let urls = profile.partition_urls(&filter.state_fips);

    if urls.len() == 1 {
        let inner = partition_select(profile, filter, &urls[0], true)?;
        Ok(format!("{}\nORDER BY random()\nLIMIT {}", inner, limit))
    } else {
        let selects: Result<Vec<String>, ExtractError> = urls
            .iter()
            .map(|url| partition_select(profile, filter, url, false))
            .collect();
        Ok(format!(
            "SELECT * FROM (\n{}\n) AS candidates\nORDER BY random()\nLIMIT {}",
            selects?.join("\nUNION ALL\n"),
            limit
        ))
    }
}

/// Construit la requête COPY produisant une fixture GeoParquet locale.
/// Les colonnes d'origine sont conservées telles quelles (SELECT *) pour
/// que la fixture reste interrogeable avec le même profil.
pub fn build_sample_copy(
    profile: &SchemaProfile,
    filter: &ResolvedFilter,
    output_path: &str,
) -> Result<String, ExtractError> {
    profile.check()?;
    let urls = profile.partition_urls(&filter.state_fips);

    let inner = if urls.len() == 1 {
        let admin = format!(
            "{} IN ({})",
            admin_expr(profile),
            in_list(&filter.state_fips)
        );
        format!(
            "SELECT * FROM read_parquet({}) WHERE {} AND {} ORDER BY random() LIMIT {}",
            quote_str(&urls[0]),
            admin,
            crop_clause(profile, &filter.crop_codes)?,
            filter.count
        )
    } else {
        let selects: Result<Vec<String>, ExtractError> = urls
            .iter()
            .map(|url| {
                Ok(format!(
                    "SELECT * FROM read_parquet({}) WHERE {}",
                    quote_str(url),
                    crop_clause(profile, &filter.crop_codes)?
                ))
            })
            .collect();
        format!(
            "SELECT * FROM ({}) AS candidates ORDER BY random() LIMIT {}",
            selects?.join(" UNION ALL "),
            filter.count
        )
    };

    Ok(format!(
        "COPY ({}) TO {} (FORMAT PARQUET)",
        inner,
        quote_str(output_path)
    ))
}
