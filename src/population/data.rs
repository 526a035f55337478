//! Population data structures for age/sex cohort accounting
//!
//! Population is tracked in 21 five-year age groups per sex. Group 20 is the
//! open-ended "100 years and over" band.

use serde::{Deserialize, Serialize};

/// Number of five-year age groups (0-4 ... 95-99, 100+)
pub const NUM_AGE_GROUPS: usize = 21;

/// Index of the open-ended terminal age group (100 years and over)
pub const TERMINAL_AGE_GROUP: usize = NUM_AGE_GROUPS - 1;

/// First reproductive age group (15 to 19 years)
pub const FIRST_REPRODUCTIVE_AGE_GROUP: usize = 3;

/// Last reproductive age group (45 to 49 years)
pub const LAST_REPRODUCTIVE_AGE_GROUP: usize = 9;

/// Width of each age group in years
pub const AGE_GROUP_WIDTH: usize = 5;

/// One value per age group
pub type AgeVector = [f64; NUM_AGE_GROUPS];

/// Canonical age group labels, as published in census tables
pub const AGE_GROUP_LABELS: [&str; NUM_AGE_GROUPS] = [
    "0 to 4 years",
    "5 to 9 years",
    "10 to 14 years",
    "15 to 19 years",
    "20 to 24 years",
    "25 to 29 years",
    "30 to 34 years",
    "35 to 39 years",
    "40 to 44 years",
    "45 to 49 years",
    "50 to 54 years",
    "55 to 59 years",
    "60 to 64 years",
    "65 to 69 years",
    "70 to 74 years",
    "75 to 79 years",
    "80 to 84 years",
    "85 to 89 years",
    "90 to 94 years",
    "95 to 99 years",
    "100 years and over",
];

/// Whether an age group contributes to births
pub fn is_reproductive(age_group: usize) -> bool {
    (FIRST_REPRODUCTIVE_AGE_GROUP..=LAST_REPRODUCTIVE_AGE_GROUP).contains(&age_group)
}

/// Parse an age group label into its index
///
/// Accepts "15 to 19 years", "15-19", "100 years and over" and "100+".
/// Returns None for anything that is not an exact five-year band.
pub fn age_group_index(label: &str) -> Option<usize> {
    let label = label.trim().to_ascii_lowercase();

    if matches!(label.as_str(), "100 years and over" | "100 and over" | "100+") {
        return Some(TERMINAL_AGE_GROUP);
    }

    let body = label.strip_suffix(" years").unwrap_or(&label);
    let (low, high) = body.split_once(" to ").or_else(|| body.split_once('-'))?;
    let low: usize = low.trim().parse().ok()?;
    let high: usize = high.trim().parse().ok()?;

    if low % AGE_GROUP_WIDTH != 0 || high != low + AGE_GROUP_WIDTH - 1 || low >= 100 {
        return None;
    }

    Some(low / AGE_GROUP_WIDTH)
}

/// Sex of a cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Both sexes, in output order
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Parse a sex label ("Males", "Female", "M", ...)
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "males" | "m" => Some(Sex::Male),
            "female" | "females" | "f" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Population for a single year by age group and sex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Male population by age group
    pub male: AgeVector,

    /// Female population by age group
    pub female: AgeVector,
}

impl Default for PopulationSnapshot {
    fn default() -> Self {
        Self::zeros()
    }
}

impl PopulationSnapshot {
    pub fn new(male: AgeVector, female: AgeVector) -> Self {
        Self { male, female }
    }

    /// Empty population
    pub fn zeros() -> Self {
        Self {
            male: [0.0; NUM_AGE_GROUPS],
            female: [0.0; NUM_AGE_GROUPS],
        }
    }

    /// Age vector for one sex
    pub fn by_sex(&self, sex: Sex) -> &AgeVector {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }

    pub fn by_sex_mut(&mut self, sex: Sex) -> &mut AgeVector {
        match sex {
            Sex::Male => &mut self.male,
            Sex::Female => &mut self.female,
        }
    }

    /// Population of one cohort (0.0 for an out-of-range age group)
    pub fn get(&self, age_group: usize, sex: Sex) -> f64 {
        self.by_sex(sex).get(age_group).copied().unwrap_or(0.0)
    }

    /// Set the population of one cohort
    pub fn set(&mut self, age_group: usize, sex: Sex, value: f64) {
        if let Some(cell) = self.by_sex_mut(sex).get_mut(age_group) {
            *cell = value;
        }
    }

    pub fn total_male(&self) -> f64 {
        self.male.iter().sum()
    }

    pub fn total_female(&self) -> f64 {
        self.female.iter().sum()
    }

    /// Total population across both sexes
    pub fn total(&self) -> f64 {
        self.total_male() + self.total_female()
    }

    /// Share of the total population in `age_group` and above
    ///
    /// e.g. `share_at_or_above(13)` is the 65+ share. Returns 0.0 for an
    /// empty population.
    pub fn share_at_or_above(&self, age_group: usize) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let start = age_group.min(NUM_AGE_GROUPS);
        let older: f64 = self.male[start..].iter().sum::<f64>()
            + self.female[start..].iter().sum::<f64>();
        older / total
    }

    /// All cohort counts are finite and non-negative
    pub fn is_valid(&self) -> bool {
        self.male
            .iter()
            .chain(self.female.iter())
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}
