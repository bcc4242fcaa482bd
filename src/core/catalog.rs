//! Catalog store: read-only reference data for a session.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::catalog::{Buggie, Location, Munchie, Prop, Tiggie, MAX_INTENSITY};

/// The catalog shipped with the crate.
pub const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.ron");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

/// The on-disk shape of a catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub munchies: Vec<Munchie>,
    #[serde(default)]
    pub tiggies: Vec<Tiggie>,
    #[serde(default)]
    pub buggies: Vec<Buggie>,
    #[serde(default)]
    pub props: Vec<Prop>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Indexed catalog. Entries keep their file order; lookups go through
/// per-kind id indexes.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    data: CatalogData,
    munchie_index: FxHashMap<String, usize>,
    tiggie_index: FxHashMap<String, usize>,
    buggie_index: FxHashMap<String, usize>,
    prop_index: FxHashMap<String, usize>,
    location_index: FxHashMap<String, usize>,
}

fn index_by_id<'a, I>(kind: &'static str, ids: I) -> Result<FxHashMap<String, usize>, CatalogError>
where
    I: Iterator<Item = &'a str>,
{
    let mut index = FxHashMap::default();
    for (position, id) in ids.enumerate() {
        if index.insert(id.to_string(), position).is_some() {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

fn repair_ranges(data: &mut CatalogData) {
    for buggie in &mut data.buggies {
        if buggie.intensity > MAX_INTENSITY {
            tracing::warn!(buggie = %buggie.id, intensity = buggie.intensity, "clamping buggie intensity");
            buggie.intensity = MAX_INTENSITY;
        }
    }
    for location in &mut data.locations {
        let capped = location.sensory.capped(MAX_INTENSITY as u32);
        if capped != location.sensory {
            tracing::warn!(location = %location.id, "clamping location sensory profile");
            location.sensory = capped;
        }
    }
}

impl CatalogStore {
    /// Index catalog data, rejecting duplicate ids within a kind.
    ///
    /// Out-of-range values are repaired, not rejected: buggie intensities
    /// and location axes are clamped into `0..=MAX_INTENSITY`.
    pub fn new(mut data: CatalogData) -> Result<Self, CatalogError> {
        repair_ranges(&mut data);
        Ok(Self {
            munchie_index: index_by_id("munchie", data.munchies.iter().map(|m| m.id.as_str()))?,
            tiggie_index: index_by_id("tiggie", data.tiggies.iter().map(|t| t.id.as_str()))?,
            buggie_index: index_by_id("buggie", data.buggies.iter().map(|b| b.id.as_str()))?,
            prop_index: index_by_id("prop", data.props.iter().map(|p| p.id.as_str()))?,
            location_index: index_by_id("location", data.locations.iter().map(|l| l.id.as_str()))?,
            data,
        })
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = ron::from_str(input)?;
        Self::new(data)
    }

    /// Load a catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// The catalog bundled with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::parse_ron(BUNDLED_CATALOG)
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    pub fn munchies(&self) -> &[Munchie] {
        &self.data.munchies
    }

    pub fn tiggies(&self) -> &[Tiggie] {
        &self.data.tiggies
    }

    /// Buggies as loaded, with their initial intensities.
    pub fn buggies(&self) -> &[Buggie] {
        &self.data.buggies
    }

    pub fn props(&self) -> &[Prop] {
        &self.data.props
    }

    pub fn locations(&self) -> &[Location] {
        &self.data.locations
    }

    pub fn munchie(&self, id: &str) -> Option<&Munchie> {
        self.munchie_index.get(id).map(|&i| &self.data.munchies[i])
    }

    pub fn tiggie(&self, id: &str) -> Option<&Tiggie> {
        self.tiggie_index.get(id).map(|&i| &self.data.tiggies[i])
    }

    pub fn buggie(&self, id: &str) -> Option<&Buggie> {
        self.buggie_index.get(id).map(|&i| &self.data.buggies[i])
    }

    pub fn prop(&self, id: &str) -> Option<&Prop> {
        self.prop_index.get(id).map(|&i| &self.data.props[i])
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.location_index.get(id).map(|&i| &self.data.locations[i])
    }
}
