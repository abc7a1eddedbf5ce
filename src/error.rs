use thiserror::Error;

/// Result type for switch operations
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Errors that can occur when querying or activating switches
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Activation requested for an option that is not in the switch
    #[error("Option {option} is not part of switch {switch}")]
    InvalidOption {
        /// Switch name
        switch: String,
        /// Option name
        option: String,
    },

    /// The device owning the switch no longer exists
    #[error("Device of switch {0} is no longer available")]
    DeviceUnavailable(String),

    /// No option with the given name exists in the switch
    #[error("Unknown option name {name} in switch {switch}")]
    UnknownOptionName {
        /// Switch name
        switch: String,
        /// Requested option name
        name: String,
    },

    /// The backend could not send the activation command
    #[error("Failed to send option {option} for device {device}")]
    TransportFailure {
        /// Device name
        device: String,
        /// Option name
        option: String,
    },

    /// Server event referred to an unknown device
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Server event referred to an unknown switch
    #[error("Switch not found: {0}")]
    SwitchNotFound(String),

    /// Event channel was closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
