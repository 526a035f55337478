//! Population data structures and observed-data loading

mod data;
pub mod loader;

pub use data::{
    age_group_index, is_reproductive, AgeVector, PopulationSnapshot, Sex, AGE_GROUP_LABELS,
    AGE_GROUP_WIDTH, FIRST_REPRODUCTIVE_AGE_GROUP, LAST_REPRODUCTIVE_AGE_GROUP, NUM_AGE_GROUPS,
    TERMINAL_AGE_GROUP,
};
pub use loader::ObservedPopulation;
