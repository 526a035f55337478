//! Cohort aging across five-year age groups
//!
//! Each simulated year, one fifth of a group's survivors move up to the next
//! group and four fifths stay. The 100+ group receives inflow but has no
//! outflow. Group 0 is left empty; births fill it.

use crate::population::{
    AgeVector, PopulationSnapshot, Sex, AGE_GROUP_WIDTH, NUM_AGE_GROUPS, TERMINAL_AGE_GROUP,
};

/// Fraction of a five-year group that ages into the next group each year
pub const ADVANCING_FRACTION: f64 = 1.0 / AGE_GROUP_WIDTH as f64;

/// Fraction of a five-year group that stays in the group each year
pub const REMAINING_FRACTION: f64 = 1.0 - ADVANCING_FRACTION;

/// Age one sex's survivors by one year
///
/// Index 0 of the result is 0.0 and must be filled with surviving infants.
pub fn age_survivors(survivors: &AgeVector) -> AgeVector {
    let mut aged = [0.0; NUM_AGE_GROUPS];

    for age_group in 1..TERMINAL_AGE_GROUP {
        aged[age_group] = survivors[age_group - 1] * ADVANCING_FRACTION
            + survivors[age_group] * REMAINING_FRACTION;
    }

    // Terminal group is absorbing
    aged[TERMINAL_AGE_GROUP] = survivors[TERMINAL_AGE_GROUP - 1] * ADVANCING_FRACTION
        + survivors[TERMINAL_AGE_GROUP];

    aged
}

/// Age both sexes by one year; group 0 is left at zero
pub fn age_population(survivors: &PopulationSnapshot) -> PopulationSnapshot {
    let mut aged = PopulationSnapshot::zeros();
    for sex in Sex::ALL {
        *aged.by_sex_mut(sex) = age_survivors(survivors.by_sex(sex));
    }
    aged
}
