//! Scripted in-memory devices for scanner and resolver tests.

use super::{Credentials, DeviceSession, FaultKind, SessionConnector, SessionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockDevice {
    open_fault: Option<FaultKind>,
    responses: HashMap<String, String>,
    fail_close: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable(kind: FaultKind) -> Self {
        Self {
            open_fault: Some(kind),
            ..Self::default()
        }
    }

    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_string(), output.to_string());
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

#[derive(Default)]
struct Journal {
    opened: Vec<String>,
    closed: Vec<String>,
    commands: Vec<(String, String)>,
}

#[derive(Default)]
pub struct MockConnector {
    devices: HashMap<String, MockDevice>,
    journal: Arc<Mutex<Journal>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, address: &str, device: MockDevice) -> Self {
        self.devices.insert(address.to_string(), device);
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.journal.lock().unwrap().opened.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.journal.lock().unwrap().closed.clone()
    }

    /// Commands issued, as (address, command) pairs.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.journal.lock().unwrap().commands.clone()
    }
}

pub struct MockSession {
    address: String,
    device: MockDevice,
    journal: Arc<Mutex<Journal>>,
}

impl SessionConnector for MockConnector {
    type Session = MockSession;

    fn open(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Self::Session, SessionError> {
        let device = self
            .devices
            .get(address)
            .cloned()
            .ok_or_else(|| SessionError::connection(address, "no route to host"))?;

        match device.open_fault {
            Some(FaultKind::Connection) => {
                return Err(SessionError::connection(address, "connection timed out"));
            }
            Some(FaultKind::Authentication) => {
                return Err(SessionError::authentication(
                    address,
                    format!("password rejected for {}", credentials.username),
                ));
            }
            Some(FaultKind::Session) => {
                return Err(SessionError::session(address, "channel closed"));
            }
            None => {}
        }

        self.journal.lock().unwrap().opened.push(address.to_string());
        Ok(MockSession {
            address: address.to_string(),
            device,
            journal: self.journal.clone(),
        })
    }
}

impl DeviceSession for MockSession {
    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        self.journal
            .lock()
            .unwrap()
            .commands
            .push((self.address.clone(), command.to_string()));

        self.device
            .responses
            .get(command)
            .cloned()
            .ok_or_else(|| SessionError::session(&self.address, format!("% Invalid input: {command}")))
    }

    fn close(self) -> Result<(), SessionError> {
        self.journal.lock().unwrap().closed.push(self.address.clone());
        if self.device.fail_close {
            return Err(SessionError::session(&self.address, "socket already closed"));
        }
        Ok(())
    }
}
