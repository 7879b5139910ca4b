use thiserror::Error;

use crate::catalog::Category;

/// Fatal errors. Any of these aborts the run before a result is produced.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("no building named {name}")]
    UnknownBuilding { name: String },

    #[error("buff rule on {building} names unknown target {target}")]
    UnknownBuffTarget { building: String, target: String },

    #[error("single-target buff rule on {building} has no target name")]
    MissingBuffTarget { building: String },

    #[error("star level {star} is out of range 1-5")]
    InvalidStar { star: u8 },

    #[error("star level of {name} assigned more than once")]
    DuplicateStar { name: String },

    #[error("{name} has no star level; assign one in the configuration")]
    StarNotSet { name: String },

    #[error("global bonuses have not been applied to {name}")]
    GlobalsNotApplied { name: String },

    #[error("cannot score an empty plan")]
    EmptyPlan,

    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Capacity conditions raised by [`crate::plan::Plan::insert`].
///
/// These are expected branch outcomes of the greedy engine, not faults:
/// a full category means "try a different slot", a full plan means "stop
/// adding". They only become fatal when an engine that guarantees room by
/// construction hits one anyway.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    #[error("the {0} bucket already holds its 3 buildings")]
    CategoryFull(Category),

    #[error("the plan already holds 9 buildings")]
    PlanFull,
}

pub type Result<T> = std::result::Result<T, PlannerError>;
