use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Document id of one physical court, e.g. "Court 1".
name_newtype!(CourtId);
// Collection name a set of courts is stored under, e.g. "Nic" or "Bakke".
name_newtype!(ScopeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CourtStatus {
    #[serde(rename = "busy+")]
    BusyPlus,
    #[serde(rename = "busy")]
    Busy,
    #[serde(rename = "half-busy")]
    HalfBusy,
    #[serde(rename = "light")]
    Light,
    #[default]
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "not-open")]
    NotOpen,
}

impl CourtStatus {
    /// Every selectable status, in the order the side panel lists them.
    pub const ALL: [CourtStatus; 6] = [
        CourtStatus::BusyPlus,
        CourtStatus::Busy,
        CourtStatus::HalfBusy,
        CourtStatus::Light,
        CourtStatus::Empty,
        CourtStatus::NotOpen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CourtStatus::BusyPlus => "busy+",
            CourtStatus::Busy => "busy",
            CourtStatus::HalfBusy => "half-busy",
            CourtStatus::Light => "light",
            CourtStatus::Empty => "empty",
            CourtStatus::NotOpen => "not-open",
        }
    }

    /// Parses a stored status, treating anything unrecognized as `Empty`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn colors(self) -> StatusColors {
        match self {
            CourtStatus::BusyPlus => StatusColors::solid(CourtColor::DarkRed),
            CourtStatus::Busy => StatusColors::solid(CourtColor::Red),
            CourtStatus::HalfBusy => StatusColors {
                top: CourtColor::Red,
                bottom: CourtColor::White,
            },
            CourtStatus::Light => StatusColors::solid(CourtColor::Pink),
            CourtStatus::Empty => StatusColors::solid(CourtColor::White),
            CourtStatus::NotOpen => StatusColors::solid(CourtColor::Grey),
        }
    }
}

impl fmt::Display for CourtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown court status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CourtStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        CourtStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtColor {
    DarkRed,
    Red,
    Pink,
    White,
    Grey,
}

impl CourtColor {
    /// Value handed to the renderer as a fill color.
    pub fn css(self) -> &'static str {
        match self {
            CourtColor::DarkRed => "#800000",
            CourtColor::Red => "#FF0000",
            CourtColor::Pink => "#FF999C",
            CourtColor::White => "#FFFFFF",
            CourtColor::Grey => "grey",
        }
    }
}

/// Fill colors for the two halves of a drawn court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusColors {
    pub top: CourtColor,
    pub bottom: CourtColor,
}

impl StatusColors {
    pub const fn solid(color: CourtColor) -> Self {
        Self {
            top: color,
            bottom: color,
        }
    }
}

/// Maps a raw status string to its court colors. Unrecognized input, including
/// the empty string, gets the colors of `empty`.
pub fn status_to_colors(status: &str) -> StatusColors {
    CourtStatus::parse_lenient(status).colors()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub name: String,
    pub courts: Vec<CourtId>,
}

/// Static grouping of courts on one screen. The court set never changes while
/// the screen is alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtLayout {
    pub floors: Vec<Floor>,
}

impl CourtLayout {
    pub fn court_ids(&self) -> impl Iterator<Item = &CourtId> {
        self.floors.iter().flat_map(|floor| floor.courts.iter())
    }

    pub fn contains(&self, court_id: &CourtId) -> bool {
        self.court_ids().any(|id| id == court_id)
    }
}

impl Default for CourtLayout {
    fn default() -> Self {
        let floor = |name: &str, courts: &[&str]| Floor {
            name: name.to_string(),
            courts: courts.iter().copied().map(CourtId::from).collect(),
        };
        Self {
            floors: vec![
                floor("Floor 3", &["Court 1", "Court 2", "Court 3"]),
                floor("Floor 1", &["Court 4", "Court 5"]),
            ],
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
