//! Building catalog — the fixed thirty-building universe.
//!
//! The catalog ships as YAML embedded at compile time and is parsed once.
//! Coefficient tables and buff kinds are closed enums: once a document has
//! parsed, an invalid table shape or rule kind cannot exist.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Catalog YAML (컴파일 타임 임베딩).
pub const BUILDINGS_YAML: &str = include_str!("../../../data/buildings.yaml");

/// Income per star level, indexed by star (index 0 unused).
pub const STAR_INCOME: [f64; 6] = [0.0, 1.0, 2.0, 6.0, 24.0, 120.0];

/// Building category. Exactly one per building; buckets in a plan are
/// keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Residence,
    Commercial,
    Industry,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Residence, Category::Commercial, Category::Industry];

    /// Bucket index, stable across the crate.
    pub fn index(self) -> usize {
        match self {
            Category::Residence => 0,
            Category::Commercial => 1,
            Category::Industry => 2,
        }
    }

    /// In-game label for report rendering.
    pub fn display_text(self) -> &'static str {
        match self {
            Category::Residence => "住宅",
            Category::Commercial => "商业",
            Category::Industry => "工业",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Residence => "residence",
            Category::Commercial => "commercial",
            Category::Industry => "industry",
        };
        write!(f, "{}", name)
    }
}

/// The allowed coefficient-table shapes, indexed by star level 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoeffTable {
    E005,
    E010,
    E015,
    E234,
    E246,
    E258,
    B100,
    B050,
    SE010,
}

impl CoeffTable {
    pub fn values(self) -> [f64; 5] {
        match self {
            CoeffTable::E005 => [0.05, 0.10, 0.15, 0.20, 0.25],
            CoeffTable::E010 => [0.10, 0.20, 0.30, 0.40, 0.50],
            CoeffTable::E015 => [0.15, 0.30, 0.45, 0.60, 0.75],
            CoeffTable::E234 => [0.20, 0.30, 0.40, 0.50, 0.60],
            CoeffTable::E246 => [0.20, 0.40, 0.60, 0.80, 1.00],
            CoeffTable::E258 => [0.20, 0.50, 0.80, 1.10, 1.40],
            CoeffTable::B100 => [1.0, 2.0, 3.0, 4.0, 5.0],
            CoeffTable::B050 => [0.5, 1.0, 1.5, 2.0, 2.5],
            CoeffTable::SE010 => [0.10, 0.15, 0.20, 0.25, 0.30],
        }
    }

    /// Coefficient at a given star level (1-5).
    pub fn at_star(self, star: u8) -> f64 {
        self.values()[star as usize - 1]
    }
}

/// What a buff rule applies to.
///
/// `Single` requires a target name in the rule. `Train` rules are catalog
/// data only — train income is settled outside plan scoring, so they never
/// become graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffKind {
    All,
    Online,
    Offline,
    Residence,
    Commercial,
    Industry,
    Single,
    Train,
}

impl BuffKind {
    /// The category restriction, for category-scoped kinds.
    pub fn target_category(self) -> Option<Category> {
        match self {
            BuffKind::Residence => Some(Category::Residence),
            BuffKind::Commercial => Some(Category::Commercial),
            BuffKind::Industry => Some(Category::Industry),
            _ => None,
        }
    }
}

/// One buff-emission rule as declared in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuffRuleDef {
    pub kind: BuffKind,
    pub table: CoeffTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// One catalog record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    pub category: Category,
    #[serde(default = "default_fix")]
    pub fix: f64,
    #[serde(default)]
    pub buffs: Vec<BuffRuleDef>,
}

fn default_fix() -> f64 {
    1.0
}

/// Parse and validate a catalog document.
///
/// An unrecognized table shape, rule kind or category fails the serde
/// parse; a `single` rule without a target name fails validation. Either
/// way the run cannot proceed.
pub fn parse_catalog(yaml: &str) -> Result<Vec<BuildingDef>> {
    let defs: Vec<BuildingDef> =
        serde_yaml::from_str(yaml).map_err(|e| PlannerError::Catalog(e.to_string()))?;
    for def in &defs {
        for rule in &def.buffs {
            if rule.kind == BuffKind::Single && rule.target.is_none() {
                return Err(PlannerError::MissingBuffTarget { building: def.name.clone() });
            }
        }
    }
    Ok(defs)
}

static STANDARD_CATALOG: OnceLock<Vec<BuildingDef>> = OnceLock::new();

/// The standard thirty-building catalog.
///
/// # Panics
///
/// Panics if the embedded YAML fails to parse, which a normal build cannot
/// produce.
pub fn standard_catalog() -> &'static [BuildingDef] {
    STANDARD_CATALOG
        .get_or_init(|| parse_catalog(BUILDINGS_YAML).expect("failed to parse buildings.yaml"))
}
