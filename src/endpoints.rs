//! Databases, programs and the REST endpoints served under each database.

use std::fmt;
use std::str::FromStr;

use crate::error::WqpError;

/// Deployment environment of the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Database {
    /// Staging deployment.
    Test,
    /// Live deployment.
    Production,
}

impl Database {
    /// All accepted databases, in whitelist order.
    pub const ALL: [Self; 2] = [Self::Test, Self::Production];

    /// Lower-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Default base URL; override with `ConnectionBuilder::base_url` or `WQP_URL`.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Test => "https://wqp-test.water.ca.gov",
            Self::Production => "https://wqp.water.ca.gov",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Database {
    type Err = WqpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| {
                WqpError::Config(format!(
                    "Database not found: {:?} (expected one of: {})",
                    s,
                    Self::ALL.map(Self::name).join(", ")
                ))
            })
    }
}

/// Monitoring program; selects the `program` code sent with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Marsh monitoring.
    Marsh,
    /// Environmental Monitoring Program.
    Emp,
}

impl Program {
    /// All accepted programs, in whitelist order.
    pub const ALL: [Self; 2] = [Self::Marsh, Self::Emp];

    /// Lower-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Marsh => "marsh",
            Self::Emp => "emp",
        }
    }

    /// Code sent as the `program` query parameter.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Marsh => "MARSH",
            Self::Emp => "EMP",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Program {
    type Err = WqpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                WqpError::Config(format!(
                    "Program not found: {:?} (expected one of: {})",
                    s,
                    Self::ALL.map(Self::name).join(", ")
                ))
            })
    }
}

/// REST endpoints known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Contact directory.
    MetaContacts,
    /// Monitoring stations.
    MetaStations,
    /// Station locations.
    MetaLocations,
    /// Deployed sondes.
    AssetSondes,
    /// Maintenance action types.
    AssetActionTypes,
    /// Verification instrument types.
    AssetVerificationInstrumentTypes,
    /// Standard solution types.
    AssetStandardSolutionTypes,
    /// Readings of one result set within a time window.
    ResultData,
    /// Catalogue of result sets.
    ResultDetails,
    /// First and last reading dates of a result set.
    ResultDates,
    /// Field event types.
    EventTypes,
    /// Field event reasons.
    EventReasons,
    /// Field event summaries.
    EventSummaries,
    /// Field event details.
    EventDetails,
    /// Actions taken during field events.
    EventActionDetails,
    /// Verification instruments used during field events.
    EventVerificationInstrumentDetails,
    /// Standard solutions used during field events.
    EventStandardSolutionDetails,
    /// PDM report.
    ReportPdm,
}

impl Service {
    /// Path relative to the database base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::MetaContacts => "TelemetryDirect/api/Meta/Contacts",
            Self::MetaStations => "TelemetryDirect/api/Meta/Stations",
            Self::MetaLocations => "TelemetryDirect/api/Meta/Locations",
            Self::AssetSondes => "TelemetryDirect/api/Assets/Sondes",
            Self::AssetActionTypes => "TelemetryDirect/api/Assets/ActionTypes",
            Self::AssetVerificationInstrumentTypes => {
                "TelemetryDirect/api/Assets/VerificationInstrumentTypes"
            }
            Self::AssetStandardSolutionTypes => "TelemetryDirect/api/Assets/StandardSolutionTypes",
            Self::ResultData => "TelemetryDirect/api/Results/ResultData",
            Self::ResultDetails => "TelemetryDirect/api/Results/ResultDetails",
            Self::ResultDates => "TelemetryDirect/api/Results/ReadingDates",
            Self::EventTypes => "TelemetryDirect/api/Events/Types",
            Self::EventReasons => "TelemetryDirect/api/Events/Reasons",
            Self::EventSummaries => "TelemetryDirect/api/Events/Summaries",
            Self::EventDetails => "TelemetryDirect/api/Events/EventDetails",
            Self::EventActionDetails => "TelemetryDirect/api/Events/ActionDetails",
            Self::EventVerificationInstrumentDetails => {
                "TelemetryDirect/api/Events/VerificationInstrumentDetails"
            }
            Self::EventStandardSolutionDetails => {
                "TelemetryDirect/api/Events/StandardSolutionDetails"
            }
            Self::ReportPdm => "Reports/api/pdm",
        }
    }

    /// Full URL of this endpoint under `base`.
    #[must_use]
    pub fn url(self, base: &str) -> String {
        urljoin(base, self.path())
    }
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
