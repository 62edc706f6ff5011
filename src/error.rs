use thiserror::Error;

/// Coarse classification of [`SimError`] variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The catalog could not resolve a species or move id.
    LookupFailure,
    /// A moveset references moves the species cannot use, or lacks a fast move.
    InvalidMoveset,
    /// A strategy, policy or league name was not recognised, or a request is
    /// out of range.
    PolicyConfiguration,
    /// A catalog record was malformed when it was loaded.
    CatalogData,
    /// The engine ran past its turn ceiling.
    Anomaly,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("species not found: {0}")]
    SpeciesNotFound(String),
    #[error("move not found: {0}")]
    MoveNotFound(String),
    #[error("invalid moveset for {species}: {reason}")]
    InvalidMoveset { species: String, reason: String },
    #[error("unknown shield strategy '{name}' (valid: {valid})")]
    UnknownShieldStrategy { name: String, valid: String },
    #[error("unknown charge policy '{name}' (valid: {valid})")]
    UnknownChargePolicy { name: String, valid: String },
    #[error("unsupported cp cap {0} (valid: 500, 1500, 2500, 0)")]
    UnsupportedCpCap(u32),
    #[error("team must have 1 to {max} members, got {size}")]
    InvalidTeamSize { size: usize, max: usize },
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("invalid species record {id}: {reason}")]
    InvalidSpecies { id: String, reason: String },
    #[error("battle did not conclude within {0} turns")]
    TurnLimitExceeded(u32),
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::SpeciesNotFound(_) | SimError::MoveNotFound(_) => ErrorKind::LookupFailure,
            SimError::InvalidMoveset { .. } => ErrorKind::InvalidMoveset,
            SimError::UnknownShieldStrategy { .. }
            | SimError::UnknownChargePolicy { .. }
            | SimError::UnsupportedCpCap(_)
            | SimError::InvalidTeamSize { .. } => ErrorKind::PolicyConfiguration,
            SimError::UnknownType(_) | SimError::InvalidSpecies { .. } => ErrorKind::CatalogData,
            SimError::TurnLimitExceeded(_) => ErrorKind::Anomaly,
        }
    }

    pub(crate) fn invalid_moveset(species: &str, reason: impl Into<String>) -> Self {
        SimError::InvalidMoveset {
            species: species.to_string(),
            reason: reason.into(),
        }
    }
}
