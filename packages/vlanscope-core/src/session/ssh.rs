//! SSH transport built on libssh2.
//!
//! IOS-style SSH servers accept a single exec channel per connection and drop
//! the connection once it closes, so every command runs on its own connection.
//! The first one is dialed when the session opens.
//!
//! Every call here blocks; the scanner drives it from `spawn_blocking` workers.

use super::{Credentials, DeviceSession, SessionConnector, SessionError};
use serde::Deserialize;
use ssh2::Session;
use std::io::Read;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// Transport timeouts and port, as read from the `[ssh]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub session_timeout_secs: u64,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    settings: SshSettings,
}

impl SshConnector {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }
}

impl SessionConnector for SshConnector {
    type Session = SshSession;

    fn open(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Self::Session, SessionError> {
        let dialer = SshDialer {
            address: address.to_string(),
            credentials: credentials.clone(),
            settings: self.settings.clone(),
        };
        Ok(SshSession(OneShotSession::open(dialer)?))
    }
}

/// An authenticated device shell; each command gets its own connection.
pub struct SshSession(OneShotSession<SshDialer>);

impl DeviceSession for SshSession {
    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        self.0.run(command)
    }

    fn close(self) -> Result<(), SessionError> {
        self.0.close()
    }
}

/// Makes new authenticated connections to one device.
trait Dial: Send {
    type Link: Link;

    fn dial(&self) -> Result<Self::Link, SessionError>;
}

/// A connection good for exactly one command.
trait Link: Send {
    fn exec(self, command: &str) -> Result<String, SessionError>;

    fn hang_up(self) -> Result<(), SessionError>;
}

/// Holds at most one unused connection; `run` spends it or dials another.
struct OneShotSession<D: Dial> {
    dialer: D,
    idle: Option<D::Link>,
}

impl<D: Dial> OneShotSession<D> {
    fn open(dialer: D) -> Result<Self, SessionError> {
        let link = dialer.dial()?;
        Ok(Self {
            dialer,
            idle: Some(link),
        })
    }

    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        let link = match self.idle.take() {
            Some(link) => link,
            None => self.dialer.dial()?,
        };
        link.exec(command)
    }

    fn close(mut self) -> Result<(), SessionError> {
        match self.idle.take() {
            Some(link) => link.hang_up(),
            None => Ok(()),
        }
    }
}

struct SshDialer {
    address: String,
    credentials: Credentials,
    settings: SshSettings,
}

impl SshDialer {
    fn resolve(&self) -> Result<SocketAddr, SessionError> {
        let address = &self.address;
        (address.as_str(), self.settings.port)
            .to_socket_addrs()
            .map_err(|e| SessionError::connection(address, e))?
            .next()
            .ok_or_else(|| SessionError::connection(address, "address did not resolve"))
    }
}

impl Dial for SshDialer {
    type Link = SshLink;

    fn dial(&self) -> Result<SshLink, SessionError> {
        let address = self.address.as_str();
        let socket_addr = self.resolve()?;
        let connect_timeout = Duration::from_secs(self.settings.connect_timeout_secs);
        let io_timeout = Duration::from_secs(self.settings.session_timeout_secs);

        let tcp = TcpStream::connect_timeout(&socket_addr, connect_timeout)
            .map_err(|e| SessionError::connection(address, e))?;
        tcp.set_read_timeout(Some(io_timeout))
            .and_then(|_| tcp.set_write_timeout(Some(io_timeout)))
            .map_err(|e| SessionError::connection(address, e))?;

        let mut session = Session::new().map_err(|e| SessionError::connection(address, e))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| SessionError::connection(address, e))?;
        session.set_timeout(io_timeout.as_millis().min(u32::MAX as u128) as u32);

        session
            .userauth_password(&self.credentials.username, &self.credentials.password)
            .map_err(|e| SessionError::authentication(address, e))?;
        if !session.authenticated() {
            return Err(SessionError::authentication(
                address,
                "server did not accept the credentials",
            ));
        }

        tracing::debug!(
            "SSH connection established with {} (timeout {}s)",
            socket_addr,
            self.settings.session_timeout_secs
        );

        Ok(SshLink {
            address: self.address.clone(),
            session,
        })
    }
}

struct SshLink {
    address: String,
    session: Session,
}

impl Link for SshLink {
    fn exec(self, command: &str) -> Result<String, SessionError> {
        let address = self.address.as_str();
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| SessionError::session(address, e))?;
        channel
            .exec(command)
            .map_err(|e| SessionError::session(address, e))?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(|e| SessionError::session(address, e))?;

        // The output is complete; the device may already be tearing down.
        if let Err(e) = channel
            .send_eof()
            .and_then(|_| channel.wait_eof())
            .and_then(|_| channel.wait_close())
        {
            tracing::debug!("{}: channel teardown after `{}`: {}", address, command, e);
        }
        if let Err(e) = self.session.disconnect(None, "vlanscope done", None) {
            tracing::debug!("{}: disconnect after `{}`: {}", address, command, e);
        }

        tracing::trace!("{} `{}` returned {} bytes", address, command, output.len());
        Ok(output)
    }

    fn hang_up(self) -> Result<(), SessionError> {
        self.session
            .disconnect(None, "vlanscope done", None)
            .map_err(|e| SessionError::session(&self.address, e))
    }
}
