//! User configuration document.
//!
//! Star labels `"1★".."5★"` carry whitespace-separated building names; a
//! label may be absent or empty. The three global-bonus blocks are
//! required — a missing block is a fatal configuration error, not an
//! implicit zero.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{BonusGroup, GlobalBonuses, ScopeCoeffs};

/// Per-scope coefficients of one global-bonus block. Omitted scopes
/// grant nothing.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeBlock {
    pub online: f64,
    pub offline: f64,
    pub residence: f64,
    pub commercial: f64,
    pub industry: f64,
}

impl ScopeBlock {
    fn coeffs(&self) -> ScopeCoeffs {
        ScopeCoeffs {
            online: self.online,
            offline: self.offline,
            residence: self.residence,
            commercial: self.commercial,
            industry: self.industry,
        }
    }
}

/// The whole user document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(rename = "1★", default)]
    pub star1: Option<String>,
    #[serde(rename = "2★", default)]
    pub star2: Option<String>,
    #[serde(rename = "3★", default)]
    pub star3: Option<String>,
    #[serde(rename = "4★", default)]
    pub star4: Option<String>,
    #[serde(rename = "5★", default)]
    pub star5: Option<String>,

    pub policy: ScopeBlock,
    pub photo_collection: ScopeBlock,
    pub city_quest: ScopeBlock,

    /// Per-building city-quest grants, folded into the city-quest group.
    #[serde(default)]
    pub city_quest_buildings: BTreeMap<String, f64>,
}

impl UserConfig {
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Star level → building names, in label order.
    pub fn star_assignment(&self) -> Vec<(u8, Vec<&str>)> {
        let labels: [(u8, &Option<String>); 5] = [
            (1, &self.star1),
            (2, &self.star2),
            (3, &self.star3),
            (4, &self.star4),
            (5, &self.star5),
        ];
        labels
            .iter()
            .map(|(star, names)| {
                let names = names.as_deref().unwrap_or("").split_whitespace().collect();
                (*star, names)
            })
            .collect()
    }

    /// The three bonus groups in the graph's vocabulary.
    pub fn global_bonuses(&self) -> GlobalBonuses {
        GlobalBonuses {
            policy: BonusGroup { scopes: self.policy.coeffs(), buildings: Vec::new() },
            photo_collection: BonusGroup {
                scopes: self.photo_collection.coeffs(),
                buildings: Vec::new(),
            },
            city_quest: BonusGroup {
                scopes: self.city_quest.coeffs(),
                buildings: self
                    .city_quest_buildings
                    .iter()
                    .map(|(name, coeff)| (name.clone(), *coeff))
                    .collect(),
            },
        }
    }
}

/// The sample document shipped with the repository.
pub const SAMPLE_CONFIG_YAML: &str = include_str!("../../../data/jiaguomeng.yml");
