//! Error types for orbitext.
//!
//! This module provides error types for scene-host access, per-frame motion
//! updates, settings persistence and the remote text store client.

use std::fmt;

use crate::host::NodeId;

/// Errors raised while talking to a [`SceneHost`](crate::host::SceneHost).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The host has no node with this id (already removed or never added).
    MissingNode(NodeId),
    /// The node exists but holds a different kind of geometry.
    WrongNodeKind {
        id: NodeId,
        expected: &'static str,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::MissingNode(id) => write!(f, "Scene node {} does not exist", id),
            SceneError::WrongNodeKind { id, expected } => {
                write!(f, "Scene node {} is not a {} node", id, expected)
            }
        }
    }
}

impl std::error::Error for SceneError {}

/// Errors that can occur while advancing a label by one frame.
///
/// These never stop the frame loop: the scene logs them and releases the
/// label's transient effects.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The computed position or orientation contained NaN or infinity.
    NonFinite {
        /// Text of the affected label.
        label: String,
    },
    /// Pushing the new state to the host failed.
    Scene(SceneError),
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::NonFinite { label } => {
                write!(f, "Label '{}' produced a non-finite position", label)
            }
            MotionError::Scene(e) => write!(f, "Scene error: {}", e),
        }
    }
}

impl std::error::Error for MotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MotionError::Scene(e) => Some(e),
            MotionError::NonFinite { .. } => None,
        }
    }
}

impl From<SceneError> for MotionError {
    fn from(e: SceneError) -> Self {
        MotionError::Scene(e)
    }
}

/// Errors that can occur while loading or saving viewer settings.
#[derive(Debug)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    Io(std::io::Error),
    /// The settings file is not valid JSON for [`Settings`](crate::settings::Settings).
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Failed to access settings file: {}", e),
            SettingsError::Json(e) => write!(f, "Invalid settings file: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Json(e)
    }
}

/// Errors returned by the text store client.
#[cfg(feature = "viewer")]
#[derive(Debug)]
pub enum RemoteError {
    /// The request could not be sent or the response could not be decoded.
    Http(reqwest::Error),
    /// The store answered with an error payload.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response body.
        message: String,
    },
}

#[cfg(feature = "viewer")]
impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Http(e) => write!(f, "Text store request failed: {}", e),
            RemoteError::Rejected { status, message } => {
                write!(f, "Text store rejected the request ({}): {}", status, message)
            }
        }
    }
}

#[cfg(feature = "viewer")]
impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteError::Http(e) => Some(e),
            RemoteError::Rejected { .. } => None,
        }
    }
}

#[cfg(feature = "viewer")]
impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e)
    }
}
