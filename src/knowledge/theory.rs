// Analytical frameworks that concepts belong to and templates are written for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A strategic theory (analytical framework).
///
/// The serialized form is the short code used in the knowledge base file and
/// as the template directory name (lowercased).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Theory {
    #[serde(rename = "TCE")]
    Tce,
    #[serde(rename = "RBV")]
    Rbv,
    PlatformStrategy,
    CompetitiveDynamics,
    DemandSideDisruption,
    ArchitecturalDisruption,
    DynamicCapabilities,
    PropertyRights,
    ValueBasedStrategy,
    Coopetition,
}

impl Theory {
    pub const ALL: [Theory; 10] = [
        Theory::Tce,
        Theory::Rbv,
        Theory::PlatformStrategy,
        Theory::CompetitiveDynamics,
        Theory::DemandSideDisruption,
        Theory::ArchitecturalDisruption,
        Theory::DynamicCapabilities,
        Theory::PropertyRights,
        Theory::ValueBasedStrategy,
        Theory::Coopetition,
    ];

    /// Short code, e.g. "TCE" or "PlatformStrategy".
    pub fn code(self) -> &'static str {
        match self {
            Theory::Tce => "TCE",
            Theory::Rbv => "RBV",
            Theory::PlatformStrategy => "PlatformStrategy",
            Theory::CompetitiveDynamics => "CompetitiveDynamics",
            Theory::DemandSideDisruption => "DemandSideDisruption",
            Theory::ArchitecturalDisruption => "ArchitecturalDisruption",
            Theory::DynamicCapabilities => "DynamicCapabilities",
            Theory::PropertyRights => "PropertyRights",
            Theory::ValueBasedStrategy => "ValueBasedStrategy",
            Theory::Coopetition => "Coopetition",
        }
    }

    /// Human-readable framework name used in answer prose.
    pub fn display_name(self) -> &'static str {
        match self {
            Theory::Tce => "Transaction Cost Economics",
            Theory::Rbv => "Resource-Based View",
            Theory::PlatformStrategy => "Platform Strategy",
            Theory::CompetitiveDynamics => "Competitive Dynamics",
            Theory::DemandSideDisruption => "Demand-Side Disruption",
            Theory::ArchitecturalDisruption => "Architectural Disruption",
            Theory::DynamicCapabilities => "Dynamic Capabilities",
            Theory::PropertyRights => "Property Rights Theory",
            Theory::ValueBasedStrategy => "Value-Based Strategy",
            Theory::Coopetition => "Co-opetition",
        }
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Theory {
    type Err = anyhow::Error;

    /// Parse a theory code case-insensitively ("tce", "PlatformStrategy", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Theory::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Theory::ALL.iter().map(|t| t.code()).collect();
                anyhow::anyhow!("Unknown theory '{}'. Known theories: {}", s, known.join(", "))
            })
    }
}
