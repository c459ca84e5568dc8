//! Surface model classification passes
//!
//! - **ground**: iterative bare-earth extraction (DSM to DTM plus labels)
//! - **nonground**: cleanup of the non-ground mask (AGL, gradient, width and
//!   area culls)
//! - **buildings**: reclassification of vegetation fully enclosed by
//!   building pixels

mod buildings;
mod ground;
mod nonground;

pub use buildings::{
    fill_inside_buildings, LAS_BUILDING, LAS_GROUND, LAS_HIGH_VEGETATION, LAS_UNCLASSIFIED,
};
pub use ground::{classify_ground, ClassifyGround, GroundParams, GroundResult};
pub use nonground::{classify_non_ground, ClassifyNonGround, NonGroundParams};
