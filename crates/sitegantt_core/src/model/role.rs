//! Staff roles and their badge presentation.
//!
//! Role strings come from the `profiles.role` column. Known roles map totally
//! onto a badge; unknown strings are either rejected (`Role::parse`) or shown
//! with the neutral badge (`RoleBadge::for_raw`), never silently dropped.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Staff role on a construction project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Responsable,
    Operario,
}

/// Badge color family used by presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Purple,
    Blue,
    Green,
    /// Fallback for roles the core does not know.
    Neutral,
}

/// Error for role strings outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl Display for UnknownRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown role `{}`; expected supervisor|responsable|operario",
            self.0
        )
    }
}

impl Error for UnknownRole {}

impl Role {
    pub const ALL: [Role; 3] = [Role::Supervisor, Role::Responsable, Role::Operario];

    /// Parses a stored role string. Unknown values are an error.
    pub fn parse(value: &str) -> Result<Self, UnknownRole> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supervisor" => Ok(Self::Supervisor),
            "responsable" => Ok(Self::Responsable),
            "operario" => Ok(Self::Operario),
            _ => Err(UnknownRole(value.to_string())),
        }
    }

    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::Responsable => "responsable",
            Self::Operario => "operario",
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Supervisor => "Supervisor",
            Self::Responsable => "Responsable",
            Self::Operario => "Operario",
        }
    }

    pub fn tone(self) -> BadgeTone {
        match self {
            Self::Supervisor => BadgeTone::Purple,
            Self::Responsable => BadgeTone::Blue,
            Self::Operario => BadgeTone::Green,
        }
    }

    pub fn badge(self) -> RoleBadge {
        RoleBadge {
            role: Some(self),
            label: self.label().to_string(),
            tone: self.tone(),
        }
    }

    /// Roles allowed to own tasks on the Gantt chart.
    pub fn can_own_tasks(self) -> bool {
        matches!(self, Self::Supervisor | Self::Responsable)
    }
}

/// Resolved badge for one raw role string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleBadge {
    pub role: Option<Role>,
    pub label: String,
    pub tone: BadgeTone,
}

impl RoleBadge {
    /// Maps any stored role string onto a badge.
    ///
    /// Unknown roles keep their raw text as label with the neutral tone.
    pub fn for_raw(raw: &str) -> Self {
        match Role::parse(raw) {
            Ok(role) => role.badge(),
            Err(_) => Self {
                role: None,
                label: raw.to_string(),
                tone: BadgeTone::Neutral,
            },
        }
    }
}
