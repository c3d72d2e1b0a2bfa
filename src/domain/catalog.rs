//! Region and variable tables.
//!
//! Both tables are immutable for the lifetime of a process. Lookup is
//! case-insensitive and word-bounded; when several entries match, the entry
//! declared first wins.

use crate::domain::model::{BoundingBox, VariableId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub bbox: BoundingBox,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub id: VariableId,
    pub display_name: String,
    pub unit: String,
    pub aliases: Vec<String>,
}

/// (name, [minLon, minLat, maxLon, maxLat], aliases)
const BUILTIN_REGIONS: [(&str, [f64; 4], &[&str]); 5] = [
    ("Pacific Ocean", [-180.0, -60.0, -70.0, 60.0], &["pacific"]),
    ("Atlantic Ocean", [-80.0, -60.0, 20.0, 70.0], &["atlantic"]),
    ("Indian Ocean", [20.0, -60.0, 120.0, 30.0], &["indian"]),
    ("Arctic Ocean", [-180.0, 60.0, 180.0, 90.0], &["arctic"]),
    (
        "Southern Ocean",
        [-180.0, -90.0, 180.0, -60.0],
        &["southern", "antarctic", "south"],
    ),
];

/// (id, display name, unit, aliases)
const BUILTIN_VARIABLES: [(VariableId, &str, &str, &[&str]); 7] = [
    (
        VariableId::Temperature,
        "Temperature",
        "°C",
        &["temperature", "temp", "thermal", "warm", "cold", "heat"],
    ),
    (
        VariableId::Salinity,
        "Salinity",
        "PSU",
        &["salinity", "salt", "saline"],
    ),
    (
        VariableId::Pressure,
        "Pressure",
        "dbar",
        &["pressure", "dbar", "depth", "deep"],
    ),
    (
        VariableId::DissolvedOxygen,
        "Dissolved Oxygen",
        "µmol/kg",
        &["dissolved oxygen", "oxygen", "o2", "doxy"],
    ),
    (
        VariableId::Ph,
        "pH",
        "pH units",
        &["ph", "acidity", "alkalinity"],
    ),
    (
        VariableId::Nitrate,
        "Nitrate",
        "µmol/kg",
        &["nitrate", "nitrogen", "no3"],
    ),
    (
        VariableId::Chlorophyll,
        "Chlorophyll",
        "mg/m³",
        &["chlorophyll", "chl", "chla", "phytoplankton"],
    ),
];

/// Region Table + Variable Table, in canonical declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    regions: Vec<Region>,
    variables: Vec<VariableInfo>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        let regions = BUILTIN_REGIONS
            .iter()
            .map(|(name, [min_lon, min_lat, max_lon, max_lat], aliases)| Region {
                name: name.to_string(),
                bbox: BoundingBox::new(*min_lon, *min_lat, *max_lon, *max_lat),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        let variables = BUILTIN_VARIABLES
            .iter()
            .map(|(id, display_name, unit, aliases)| VariableInfo {
                id: *id,
                display_name: display_name.to_string(),
                unit: unit.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        Self { regions, variables }
    }

    /// Builds a catalog from already validated tables.
    ///
    /// Variables missing from `variables` keep their built-in entry so the
    /// table always covers all seven canonical ids.
    pub fn with_tables(regions: Option<Vec<Region>>, variables: Option<Vec<VariableInfo>>) -> Self {
        let mut catalog = Self::builtin();

        if let Some(regions) = regions {
            catalog.regions = regions;
        }

        if let Some(overrides) = variables {
            for entry in catalog.variables.iter_mut() {
                if let Some(custom) = overrides.iter().find(|v| v.id == entry.id) {
                    *entry = custom.clone();
                }
            }
        }

        catalog
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn variable(&self, id: VariableId) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn region_position(&self, name: &str) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Next region after `name` in declaration order, wrapping around.
    pub fn next_region(&self, name: &str) -> Option<&Region> {
        let len = self.regions.len();
        let current = self.region_position(name)?;
        if len < 2 {
            return None;
        }
        self.regions.get((current + 1) % len)
    }

    /// First region whose alias (or name) appears in `normalized` text.
    pub fn match_region(&self, normalized: &str) -> Option<&Region> {
        self.regions
            .iter()
            .find(|region| region_position_in(region, normalized).is_some())
    }

    /// Every region mentioned, ordered by first occurrence, deduplicated.
    pub fn regions_in_order(&self, normalized: &str) -> Vec<&Region> {
        let mut found: Vec<(usize, usize, &Region)> = self
            .regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                region_position_in(region, normalized).map(|pos| (pos, index, region))
            })
            .collect();

        // 同一位置時以宣告順序決勝
        found.sort_by_key(|(pos, index, _)| (*pos, *index));
        found.into_iter().map(|(_, _, region)| region).collect()
    }

    /// Every variable mentioned, in canonical declaration order.
    pub fn match_variables(&self, normalized: &str) -> Vec<VariableId> {
        self.variables
            .iter()
            .filter(|info| {
                info.aliases
                    .iter()
                    .any(|alias| find_term(normalized, alias).is_some())
            })
            .map(|info| info.id)
            .collect()
    }

    /// True when any region or variable alias occurs in the text.
    pub fn mentions_any_alias(&self, normalized: &str) -> bool {
        self.match_region(normalized).is_some() || !self.match_variables(normalized).is_empty()
    }
}

fn region_position_in(region: &Region, normalized: &str) -> Option<usize> {
    region
        .aliases
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(region.name.as_str()))
        .filter_map(|alias| find_term(normalized, &normalize(alias)))
        .min()
}

/// Lowercases and collapses every non-alphanumeric run into one space.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = true;

    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    out.trim_end().to_string()
}

/// Byte offset of the first word-bounded occurrence of `term` in `normalized`.
///
/// A trailing plural `s` is accepted, so "floats" matches "float".
pub fn find_term(normalized: &str, term: &str) -> Option<usize> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    normalized.match_indices(term).find_map(|(start, _)| {
        let before_ok = normalized[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);

        let rest = &normalized[start + term.len()..];
        let rest = rest.strip_prefix('s').unwrap_or(rest);
        let after_ok = rest
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);

        (before_ok && after_ok).then_some(start)
    })
}
