use thiserror::Error;

/// Failures surfaced to the caller of a navigation operation.
///
/// Geometry and graph degeneracies are resolved locally with fallbacks and never
/// show up here; only missing external state and bad configuration do.
#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("No flight map has been built")]
    NoFlightMap,
    #[error("No graph/landmark model has been set")]
    NoModel,
    #[error("Off-screen proxy geometry is empty")]
    NoProxies,
    #[error("Viewport has zero size")]
    ZeroSizeViewport,
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl NavigationError {
    /// True for the configuration class of errors: the operation was skipped but
    /// interaction can continue.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NavigationError::NoFlightMap
                | NavigationError::NoModel
                | NavigationError::NoProxies
                | NavigationError::ZeroSizeViewport
                | NavigationError::InvalidParameter { .. }
        )
    }
}
