//! Client to server commands.

use serde::Deserialize;

use crate::ProtocolError;

/// A parsed client command.
///
/// The set is closed: anything that does not decode into one of these
/// variants is discarded by the server without a reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Enter the lobby under a display name.
    Join {
        #[serde(default)]
        name: String,
    },
    /// Flip the readiness flag. May start (or restart) the session.
    ToggleReady,
    /// Return to the lobby; the avatar leaves the simulation quietly.
    Leave,
    /// Latest-wins steering sample.
    Steer {
        angle: f32,
        #[serde(default)]
        boosting: bool,
    },
    /// Place a net hazard in front of the avatar (cooldown-gated).
    CastNet,
}

impl Command {
    /// Decode a command from a JSON text frame.
    ///
    /// Steering angles must be finite. JSON has no NaN literal, but
    /// out-of-range float literals decode to infinity, so that is rejected
    /// here and the simulation never sees a non-finite heading.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let command: Command = serde_json::from_str(raw)?;
        if let Command::Steer { angle, .. } = &command {
            if !angle.is_finite() {
                return Err(ProtocolError::NonFiniteAngle);
            }
        }
        Ok(command)
    }
}
