//! This module provides a mocked contact source, whose behaviour can be tweaked so that it returns errors on some tests
#![cfg(any(test, feature = "local_source_mocks"))]

use async_trait::async_trait;

use crate::contact::SourceContact;
use crate::error::{SyncError, SyncResult};
use crate::traits::{AuthStatus, ContactSource};

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    pub authenticate_behaviour: (u32, u32),
    pub second_factor_behaviour: (u32, u32),
    pub fetch_contacts_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All actions will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            authenticate_behaviour: (0, n_fails),
            second_factor_behaviour: (0, n_fails),
            fetch_contacts_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_authenticate(&mut self) -> SyncResult<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.authenticate_behaviour, "authenticate")
    }
    pub fn can_submit_second_factor(&mut self) -> SyncResult<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.second_factor_behaviour, "submit_second_factor")
    }
    pub fn can_fetch_contacts(&mut self) -> SyncResult<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.fetch_contacts_behaviour, "fetch_contacts")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> SyncResult<()> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(SyncError::transport(descr, format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value)))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}


/// A contact source that serves a fixed list of contacts
pub struct MockSource {
    contacts: Vec<SourceContact>,
    behaviour: MockBehaviour,
    /// When set, authentication asks for this second factor code
    expected_code: Option<String>,
    authenticated: bool,
}

impl MockSource {
    pub fn new(contacts: Vec<SourceContact>) -> Self {
        Self { contacts, behaviour: MockBehaviour::new(), expected_code: None, authenticated: false }
    }

    pub fn with_behaviour(mut self, behaviour: MockBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn with_second_factor(mut self, code: &str) -> Self {
        self.expected_code = Some(code.to_string());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

#[async_trait]
impl ContactSource for MockSource {
    async fn authenticate(&mut self) -> SyncResult<AuthStatus> {
        self.behaviour.can_authenticate()?;
        if self.expected_code.is_some() {
            return Ok(AuthStatus::SecondFactorRequired);
        }
        self.authenticated = true;
        Ok(AuthStatus::Authenticated)
    }

    async fn submit_second_factor(&mut self, code: &str) -> SyncResult<()> {
        self.behaviour.can_submit_second_factor()?;
        match &self.expected_code {
            Some(expected) if expected == code => {
                self.authenticated = true;
                Ok(())
            },
            _ => Err(SyncError::setup("invalid second factor code")),
        }
    }

    async fn fetch_contacts(&mut self) -> SyncResult<Vec<SourceContact>> {
        self.behaviour.can_fetch_contacts()?;
        if self.authenticated == false {
            return Err(SyncError::setup("not authenticated"));
        }
        Ok(self.contacts.clone())
    }
}
