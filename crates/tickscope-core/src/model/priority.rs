use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Tracker priority, declared from most to least urgent.
///
/// The derived `Ord` follows declaration order, so sorting ascending puts
/// `Highest` first. Chart stacking uses [`Priority::STACK_ORDER`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Display order, most urgent first.
    pub const ALL: [Self; 4] = [Self::Highest, Self::High, Self::Medium, Self::Low];

    /// Bottom-to-top stacking order for the daily chart.
    pub const STACK_ORDER: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Highest];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "Highest",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Bar color used by the daily priority chart.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Highest => "#ff0000",
            Self::High => "#ffa500",
            Self::Medium => "#ffff00",
            Self::Low => "#008000",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a priority label is not one of the four known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePriorityError {
    pub got: String,
}

impl fmt::Display for ParsePriorityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid priority: '{}'", self.got)
    }
}

impl std::error::Error for ParsePriorityError {}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highest" => Ok(Self::Highest),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParsePriorityError { got: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Priority;
    use std::str::FromStr;

    #[test]
    fn parse_is_case_and_whitespace_insensitive() {
        assert_eq!(Priority::from_str(" HIGH ").unwrap(), Priority::High);
        assert_eq!(Priority::from_str("highest").unwrap(), Priority::Highest);
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        let err = Priority::from_str("Lowest").unwrap_err();
        assert_eq!(err.got, "Lowest");
        assert_eq!(err.to_string(), "invalid priority: 'Lowest'");
    }

    #[test]
    fn ordering_is_most_urgent_first() {
        let mut shuffled = vec![Priority::Low, Priority::Highest, Priority::Medium, Priority::High];
        shuffled.sort();
        assert_eq!(shuffled, Priority::ALL.to_vec());
    }

    #[test]
    fn stack_order_is_reverse_of_display_order() {
        let mut reversed = Priority::ALL;
        reversed.reverse();
        assert_eq!(reversed, Priority::STACK_ORDER);
    }
}
