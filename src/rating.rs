use serde::{Deserialize, Serialize};
use std::fmt;

/// How the user rated a day, from 1 (terrible) to 5 (amazing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DailyRating(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingError(pub i64);

impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rating must be between 1 and 5 (got {})", self.0)
    }
}

impl std::error::Error for RatingError {}

impl DailyRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Label and colour shown for a day nobody rated.
    pub const UNRATED_LABEL: &'static str = "N/A";
    pub const UNRATED_COLOR: &'static str = "#646464";

    pub fn new(value: i64) -> Result<Self, RatingError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingError(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Terrible",
            2 => "Bad",
            3 => "Okay",
            4 => "Good",
            _ => "Amazing",
        }
    }

    pub fn color(self) -> &'static str {
        match self.0 {
            1 => "#8e0501",
            2 => "#d94008",
            3 => "#d0952f",
            4 => "#8f9325",
            _ => "#52711e",
        }
    }

    pub fn all() -> impl Iterator<Item = DailyRating> {
        (Self::MIN..=Self::MAX).map(DailyRating)
    }
}

impl TryFrom<u8> for DailyRating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64)
    }
}

impl From<DailyRating> for u8 {
    fn from(value: DailyRating) -> Self {
        value.0
    }
}

impl fmt::Display for DailyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        let labels: Vec<&str> = DailyRating::all().map(DailyRating::label).collect();
        assert_eq!(labels, vec!["Terrible", "Bad", "Okay", "Good", "Amazing"]);
        assert_eq!(DailyRating::new(3).unwrap().value(), 3);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(DailyRating::new(0), Err(RatingError(0)));
        assert_eq!(DailyRating::new(6), Err(RatingError(6)));
        assert!(serde_json::from_str::<DailyRating>("9").is_err());
        assert_eq!(serde_json::from_str::<DailyRating>("4").unwrap().value(), 4);
    }

    #[test]
    fn each_rating_has_its_own_colour() {
        let colours: Vec<&str> = DailyRating::all().map(DailyRating::color).collect();
        assert_eq!(colours, vec!["#8e0501", "#d94008", "#d0952f", "#8f9325", "#52711e"]);
        assert!(!colours.contains(&DailyRating::UNRATED_COLOR));
    }
}
