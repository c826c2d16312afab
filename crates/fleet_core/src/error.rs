//! Fatal pipeline errors.
//!
//! Anything here aborts the scenario's run. Recoverable defects (broken chains,
//! energy anomalies) are handled by deletion and reported as `PruneWarning`s.

use crate::{RotationId, TripId};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Station,
    Route,
    Trip,
    VehicleType,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Station => "station",
            Self::Route => "route",
            Self::Trip => "trip",
            Self::VehicleType => "vehicle type",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The scenario already carries a depot anchor, i.e. it was processed before.
    #[error("scenario {scenario}: depot anchor '{name_short}' already exists")]
    DuplicateAnchor { scenario: u64, name_short: String },

    #[error("{kind} '{name}' not found")]
    ReferenceNotFound { kind: ReferenceKind, name: String },

    #[error("scenario {scenario}: no driving distance to estimate a fleet energy rate from")]
    InsufficientData { scenario: u64 },

    /// Upstream data does not have the shape this stage requires.
    #[error("input shape error at {entity}: {detail}")]
    InputShape { entity: String, detail: String },

    #[error("{rotation}: state of charge leaves [0, 1] at {trip} (soc_end = {soc_end:.4})")]
    SocOutOfRange {
        rotation: RotationId,
        trip: TripId,
        soc_end: f64,
    },
}

impl PipelineError {
    pub(crate) fn not_found(kind: ReferenceKind, name: impl ToString) -> Self {
        Self::ReferenceNotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn shape(entity: impl ToString, detail: impl Into<String>) -> Self {
        Self::InputShape {
            entity: entity.to_string(),
            detail: detail.into(),
        }
    }
}
