//! Buff-propagation graph.
//!
//! Built once from the catalog and read-only from then on. Buff rules are
//! resolved into concrete (source, target) edges at build time and cached
//! on both endpoints — the source keeps what it emits, the target keeps
//! what it receives — so neither search direction ever re-filters the full
//! edge set. Mutual buffs (A buffs B, B buffs A) make the graph cyclic by
//! design; scoring is always plan-relative, never a graph traversal.

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::{BuffKind, BuildingDef, Category, CoeffTable, STAR_INCOME};
use crate::error::{PlannerError, Result};

pub type BuildingId = usize;
pub type BuffId = usize;

/// The three configuration-driven bonus groups. They have no graph node;
/// their buffs attach to receives lists like any other edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalSource {
    Policy,
    PhotoCollection,
    CityQuest,
}

/// Where a buff comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffSource {
    Building(BuildingId),
    Global(GlobalSource),
}

/// Coefficient source: star-indexed table for building rules, fixed value
/// for configuration-sourced bonuses.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Strength {
    Table(CoeffTable),
    Fixed(f64),
}

/// One resolved directed buff edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Buff {
    pub id: BuffId,
    pub source: BuffSource,
    pub target: BuildingId,
    pub kind: BuffKind,
    strength: Strength,
    active: Option<f64>,
}

impl Buff {
    /// Whether the buff counts under the given scoring mode. Category and
    /// single restrictions were satisfied at resolution time; only the
    /// online/offline dimension is re-checked here.
    pub fn applies(&self, online: bool) -> bool {
        match self.kind {
            BuffKind::Online => online,
            BuffKind::Offline => !online,
            BuffKind::Train => false,
            _ => true,
        }
    }

    /// The active coefficient, once fixed — by star assignment for
    /// table-sourced buffs, at creation for fixed-value ones.
    pub fn coefficient(&self) -> Option<f64> {
        self.active
    }

    pub fn table(&self) -> Option<CoeffTable> {
        match self.strength {
            Strength::Table(t) => Some(t),
            Strength::Fixed(_) => None,
        }
    }
}

/// A building instance with its resolved edge caches.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub category: Category,
    pub base_fix: f64,
    star: Option<u8>,
    self_income: Option<f64>,
    global_coeff: Option<f64>,
    emits: Vec<BuffId>,
    receives: Vec<BuffId>,
}

impl Building {
    pub fn star(&self) -> Option<u8> {
        self.star
    }

    /// Intrinsic income, `STAR_INCOME[star] × base_fix`. Querying it
    /// before the star is assigned is a usage error: a silent zero here
    /// would corrupt every downstream score without detection.
    pub fn self_income(&self) -> Result<f64> {
        self.self_income.ok_or_else(|| PlannerError::StarNotSet { name: self.name.clone() })
    }

    /// Combined global multiplier, valid once the bonus groups are folded.
    pub fn global_coeff(&self) -> Result<f64> {
        self.global_coeff.ok_or_else(|| PlannerError::GlobalsNotApplied { name: self.name.clone() })
    }

    pub fn emits(&self) -> &[BuffId] {
        &self.emits
    }

    pub fn receives(&self) -> &[BuffId] {
        &self.receives
    }
}

/// Per-scope coefficients of one bonus group. Zero means "not granted".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeCoeffs {
    pub online: f64,
    pub offline: f64,
    pub residence: f64,
    pub commercial: f64,
    pub industry: f64,
}

/// One configuration-driven bonus group: scope coefficients plus optional
/// per-building grants.
#[derive(Debug, Clone, Default)]
pub struct BonusGroup {
    pub scopes: ScopeCoeffs,
    pub buildings: Vec<(String, f64)>,
}

/// The three groups. They stack multiplicatively, not additively.
#[derive(Debug, Clone, Default)]
pub struct GlobalBonuses {
    pub policy: BonusGroup,
    pub photo_collection: BonusGroup,
    pub city_quest: BonusGroup,
}

/// The resolved graph. Mutated only during setup (star assignment, global
/// folding); both search engines take it by shared reference.
#[derive(Debug)]
pub struct BuffGraph {
    buildings: Vec<Building>,
    buffs: Vec<Buff>,
    by_name: HashMap<String, BuildingId>,
    by_category: [Vec<BuildingId>; 3],
    globals_applied: bool,
}

impl BuffGraph {
    /// Build the graph from catalog definitions, resolving every buff rule
    /// into concrete edges. Fails fast on an unresolvable single target —
    /// no partial graph survives.
    pub fn from_catalog(defs: &[BuildingDef]) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(defs.len());
        let mut by_category: [Vec<BuildingId>; 3] = Default::default();
        let mut buildings = Vec::with_capacity(defs.len());

        for (id, def) in defs.iter().enumerate() {
            if by_name.insert(def.name.clone(), id).is_some() {
                return Err(PlannerError::Catalog(format!("duplicate building name {}", def.name)));
            }
            by_category[def.category.index()].push(id);
            buildings.push(Building {
                id,
                name: def.name.clone(),
                category: def.category,
                base_fix: def.fix,
                star: None,
                self_income: None,
                global_coeff: None,
                emits: Vec::new(),
                receives: Vec::new(),
            });
        }

        let mut graph = BuffGraph {
            buildings,
            buffs: Vec::new(),
            by_name,
            by_category,
            globals_applied: false,
        };

        for (source, def) in defs.iter().enumerate() {
            for rule in &def.buffs {
                let strength = Strength::Table(rule.table);
                match rule.kind {
                    // Train income is settled apart; no edge.
                    BuffKind::Train => {}
                    BuffKind::Single => {
                        let target_name = rule.target.as_deref().ok_or_else(|| {
                            PlannerError::MissingBuffTarget { building: def.name.clone() }
                        })?;
                        let target = graph.by_name.get(target_name).copied().ok_or_else(|| {
                            PlannerError::UnknownBuffTarget {
                                building: def.name.clone(),
                                target: target_name.to_string(),
                            }
                        })?;
                        graph.add_buff(BuffSource::Building(source), target, rule.kind, strength);
                    }
                    // Broadcast kinds reach every building, the source
                    // included; self-loops are intended and count when the
                    // source is selected.
                    BuffKind::All | BuffKind::Online | BuffKind::Offline => {
                        for target in 0..graph.buildings.len() {
                            graph.add_buff(BuffSource::Building(source), target, rule.kind, strength);
                        }
                    }
                    BuffKind::Residence | BuffKind::Commercial | BuffKind::Industry => {
                        let cat = rule.kind.target_category().expect("category kind");
                        // Standing index keeps this O(category size).
                        let members = graph.by_category[cat.index()].clone();
                        for target in members {
                            graph.add_buff(BuffSource::Building(source), target, rule.kind, strength);
                        }
                    }
                }
            }
        }

        debug!(buildings = graph.buildings.len(), buffs = graph.buffs.len(), "buff graph built");
        Ok(graph)
    }

    fn add_buff(&mut self, source: BuffSource, target: BuildingId, kind: BuffKind, strength: Strength) {
        let id = self.buffs.len();
        let active = match strength {
            Strength::Fixed(c) => Some(c),
            Strength::Table(_) => None,
        };
        self.buffs.push(Buff { id, source, target, kind, strength, active });
        if let BuffSource::Building(s) = source {
            self.buildings[s].emits.push(id);
        }
        self.buildings[target].receives.push(id);
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, id: BuildingId) -> &Building {
        &self.buildings[id]
    }

    pub fn buffs(&self) -> &[Buff] {
        &self.buffs
    }

    pub fn buff(&self, id: BuffId) -> &Buff {
        &self.buffs[id]
    }

    pub fn lookup(&self, name: &str) -> Option<BuildingId> {
        self.by_name.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<BuildingId> {
        self.lookup(name).ok_or_else(|| PlannerError::UnknownBuilding { name: name.to_string() })
    }

    pub fn category_members(&self, category: Category) -> &[BuildingId] {
        &self.by_category[category.index()]
    }

    /// The active coefficient of a buff, or the precondition error naming
    /// the unleveled source building.
    pub fn coefficient_of(&self, buff: &Buff) -> Result<f64> {
        match buff.coefficient() {
            Some(c) => Ok(c),
            None => {
                let name = match buff.source {
                    BuffSource::Building(id) => self.buildings[id].name.clone(),
                    BuffSource::Global(_) => "global bonus".to_string(),
                };
                Err(PlannerError::StarNotSet { name })
            }
        }
    }

    /// Assign a star level (1-5), fixing the building's intrinsic income
    /// and the active coefficient of every table-sourced buff it emits.
    /// Each building's level is written exactly once.
    pub fn assign_star(&mut self, name: &str, star: u8) -> Result<()> {
        if !(1..=5).contains(&star) {
            return Err(PlannerError::InvalidStar { star });
        }
        let id = self.require(name)?;
        if self.buildings[id].star.is_some() {
            return Err(PlannerError::DuplicateStar { name: name.to_string() });
        }
        let base_fix = self.buildings[id].base_fix;
        self.buildings[id].star = Some(star);
        self.buildings[id].self_income = Some(STAR_INCOME[star as usize] * base_fix);

        let emitted = self.buildings[id].emits.clone();
        for buff_id in emitted {
            let buff = &mut self.buffs[buff_id];
            if let Strength::Table(table) = buff.strength {
                buff.active = Some(table.at_star(star));
            }
        }
        Ok(())
    }

    /// Fold the three bonus groups into the receives caches and compute
    /// every building's combined multiplier under the given mode.
    ///
    /// Each group contributes `1 + Σ matching coefficients`; a group that
    /// matches nothing contributes exactly 1. The groups multiply — they
    /// are distinct stacking mechanisms, not alternatives.
    pub fn apply_global_bonuses(&mut self, bonuses: &GlobalBonuses, online: bool) -> Result<()> {
        if self.globals_applied {
            return Err(PlannerError::Catalog("global bonuses applied twice".to_string()));
        }

        let groups = [
            (GlobalSource::Policy, &bonuses.policy),
            (GlobalSource::PhotoCollection, &bonuses.photo_collection),
            (GlobalSource::CityQuest, &bonuses.city_quest),
        ];

        for (source, group) in groups {
            self.fold_group(source, group)?;
        }

        for id in 0..self.buildings.len() {
            let mut multiplier = 1.0;
            for (source, _) in groups {
                let mut sum = 0.0;
                for &buff_id in &self.buildings[id].receives {
                    let buff = &self.buffs[buff_id];
                    if buff.source == BuffSource::Global(source) && buff.applies(online) {
                        sum += buff.active.unwrap_or(0.0);
                    }
                }
                multiplier *= 1.0 + sum;
            }
            self.buildings[id].global_coeff = Some(multiplier);
        }

        self.globals_applied = true;
        Ok(())
    }

    fn fold_group(&mut self, source: GlobalSource, group: &BonusGroup) -> Result<()> {
        let scope_grants = [
            (BuffKind::Online, group.scopes.online),
            (BuffKind::Offline, group.scopes.offline),
            (BuffKind::Residence, group.scopes.residence),
            (BuffKind::Commercial, group.scopes.commercial),
            (BuffKind::Industry, group.scopes.industry),
        ];
        for (kind, coeff) in scope_grants {
            if coeff == 0.0 {
                continue;
            }
            let targets: Vec<BuildingId> = match kind.target_category() {
                Some(cat) => self.by_category[cat.index()].clone(),
                None => (0..self.buildings.len()).collect(),
            };
            for target in targets {
                self.add_buff(BuffSource::Global(source), target, kind, Strength::Fixed(coeff));
            }
        }
        for (name, coeff) in &group.buildings {
            if *coeff == 0.0 {
                continue;
            }
            let target = self.require(name)?;
            self.add_buff(BuffSource::Global(source), target, BuffKind::Single, Strength::Fixed(*coeff));
        }
        Ok(())
    }
}
