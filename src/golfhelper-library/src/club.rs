//! Golf clubs a swing video can be filed under

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

/// Club family, used for grouping in status output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubCategory {
    Wedge,
    Iron,
    Wood,
    Hybrid,
    Driver,
}

impl ClubCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubCategory::Wedge => "wedge",
            ClubCategory::Iron => "iron",
            ClubCategory::Wood => "wood",
            ClubCategory::Hybrid => "hybrid",
            ClubCategory::Driver => "driver",
        }
    }
}

/// Every supported club code, in bag order
pub const SUPPORTED_CLUBS: [&str; 22] = [
    // wedges
    "L", "S", "G", "A", "P",
    // irons
    "9", "8", "7", "6", "5", "4", "3", "2", "1",
    // woods
    "7W", "5W", "4W", "3W",
    // hybrids
    "5H", "4H", "3H",
    // driver
    "D",
];

/// A validated club, stored by its canonical code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Club(&'static str);

impl Club {
    /// Canonical upper-case code, also the output filename prefix
    pub fn code(&self) -> &'static str {
        self.0
    }

    pub fn category(&self) -> ClubCategory {
        match self.0 {
            "L" | "S" | "G" | "A" | "P" => ClubCategory::Wedge,
            "D" => ClubCategory::Driver,
            code if code.ends_with('W') => ClubCategory::Wood,
            code if code.ends_with('H') => ClubCategory::Hybrid,
            _ => ClubCategory::Iron,
        }
    }

    pub fn all() -> impl Iterator<Item = Club> {
        SUPPORTED_CLUBS.iter().map(|code| Club(*code))
    }
}

impl FromStr for Club {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SUPPORTED_CLUBS
            .iter()
            .find(|code| code.eq_ignore_ascii_case(wanted))
            .map(|code| Club(*code))
            .ok_or_else(|| LibraryError::UnknownClub(s.to_string(), SUPPORTED_CLUBS.join(", ")))
    }
}

impl fmt::Display for Club {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Club {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}
