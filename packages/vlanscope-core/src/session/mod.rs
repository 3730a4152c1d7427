//! Remote command sessions to switches.
//!
//! The scanner and resolver only talk to devices through [`SessionConnector`]
//! and [`DeviceSession`], so the SSH transport in [`ssh`] can be swapped for a
//! scripted one in tests.

pub mod ssh;

#[cfg(test)]
pub(crate) mod mock;

pub use ssh::{SshConnector, SshSession, SshSettings};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Username/password pair shared read-only by every session of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Coarse classification of a device fault, used in one-line diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Connection,
    Authentication,
    Session,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::Connection => write!(f, "connection failure"),
            FaultKind::Authentication => write!(f, "authentication failure"),
            FaultKind::Session => write!(f, "session error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Device unreachable, refused, or timed out before a shell was available
    #[error("timeout or connection failure to {address}: {message}")]
    Connection { address: String, message: String },

    /// Credentials rejected by the device
    #[error("authentication failure for {address}: {message}")]
    Authentication { address: String, message: String },

    /// Anything that went wrong once the session was up (command, disconnect, worker)
    #[error("session error on {address}: {message}")]
    Session { address: String, message: String },
}

impl SessionError {
    pub fn connection(address: &str, message: impl std::fmt::Display) -> Self {
        SessionError::Connection {
            address: address.to_string(),
            message: message.to_string(),
        }
    }

    pub fn authentication(address: &str, message: impl std::fmt::Display) -> Self {
        SessionError::Authentication {
            address: address.to_string(),
            message: message.to_string(),
        }
    }

    pub fn session(address: &str, message: impl std::fmt::Display) -> Self {
        SessionError::Session {
            address: address.to_string(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            SessionError::Connection { .. } => FaultKind::Connection,
            SessionError::Authentication { .. } => FaultKind::Authentication,
            SessionError::Session { .. } => FaultKind::Session,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            SessionError::Connection { address, .. }
            | SessionError::Authentication { address, .. }
            | SessionError::Session { address, .. } => address,
        }
    }

    /// Fault detail without the address prefix.
    pub fn detail(&self) -> &str {
        match self {
            SessionError::Connection { message, .. }
            | SessionError::Authentication { message, .. }
            | SessionError::Session { message, .. } => message,
        }
    }
}

/// An open shell on one device.
pub trait DeviceSession: Send {
    /// Execute one command and return its raw text output.
    fn run(&mut self, command: &str) -> Result<String, SessionError>;

    /// Tear the session down.
    fn close(self) -> Result<(), SessionError>;
}

/// Opens sessions. Shared across worker threads for the whole batch.
pub trait SessionConnector: Send + Sync + 'static {
    type Session: DeviceSession;

    fn open(&self, address: &str, credentials: &Credentials)
    -> Result<Self::Session, SessionError>;
}

/// Open a session, hand it to `work`, and close it whatever `work` returned.
///
/// A close failure is logged and dropped; it never replaces the work result.
pub fn with_session<C, T, F>(
    connector: &C,
    address: &str,
    credentials: &Credentials,
    work: F,
) -> Result<T, SessionError>
where
    C: SessionConnector + ?Sized,
    F: FnOnce(&mut C::Session) -> Result<T, SessionError>,
{
    tracing::debug!("Connecting to {}", address);
    let mut session = connector.open(address, credentials)?;

    let result = work(&mut session);

    match session.close() {
        Ok(()) => tracing::debug!("Disconnected from {}", address),
        Err(e) => tracing::warn!("Error disconnecting from {}: {}", address, e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::mock::{MockConnector, MockDevice};
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", creds());
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_with_session_closes_after_command_failure() {
        let connector = MockConnector::new().device("10.0.0.1", MockDevice::new());

        let result = with_session(&connector, "10.0.0.1", &creds(), |session| {
            session.run("show version")
        });

        assert_eq!(result.unwrap_err().kind(), FaultKind::Session);
        assert_eq!(connector.closed(), vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn test_with_session_ignores_close_failure() {
        let connector = MockConnector::new().device(
            "10.0.0.1",
            MockDevice::new()
                .respond("show clock", "*10:00:00.000 UTC Mon Oct 19 2026")
                .fail_close(),
        );

        let output = with_session(&connector, "10.0.0.1", &creds(), |session| {
            session.run("show clock")
        })
        .unwrap();

        assert!(output.contains("UTC"));
    }

    #[test]
    fn test_open_failure_does_not_close() {
        let connector = MockConnector::new()
            .device("10.0.0.9", MockDevice::unreachable(FaultKind::Authentication));

        let err = with_session(&connector, "10.0.0.9", &creds(), |session| {
            session.run("show clock")
        })
        .unwrap_err();

        assert_eq!(err.kind(), FaultKind::Authentication);
        assert_eq!(err.address(), "10.0.0.9");
        assert!(connector.closed().is_empty());
    }
}
