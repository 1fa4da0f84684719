//! [`OathViewModel`] backed by the software [`Authenticator`].

use std::collections::BTreeMap;
use std::convert::TryFrom;

use log::{debug, info};

use crate::api::OathViewModel;
use crate::authenticator::Authenticator;
use crate::convert;
use crate::error::Error;
use crate::model::{Code, Credential};
use crate::uri::CredentialData;

/// Source of the current time in milliseconds since the UNIX epoch
pub trait Clock {
    fn now(&self) -> u64;
}

/// The system clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|since_epoch| u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// A fixed point in time
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// View-model for one authenticator, known under `device_id`.
pub struct SessionViewModel<C = SystemClock> {
    authenticator: Authenticator,
    device_id: String,
    clock: C,
}

impl<C: Clock> SessionViewModel<C> {
    pub fn new(authenticator: Authenticator, device_id: impl Into<String>, clock: C) -> Self {
        Self { authenticator, device_id: device_id.into(), clock }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn authenticator_mut(&mut self) -> &mut Authenticator {
        &mut self.authenticator
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// A locked authenticator is unlocked with the remembered password, if any.
    fn authenticator_unlocked(&mut self) -> &mut Authenticator {
        if self.authenticator.is_locked() && self.authenticator.unlock_remembered() {
            debug!("unlocked with remembered password");
        }
        &mut self.authenticator
    }
}

fn decode_id(id: &str) -> Result<Vec<u8>, Error> {
    data_encoding::HEXLOWER_PERMISSIVE
        .decode(id.as_bytes())
        .map_err(|_| Error::NoSuchCredential(id.to_string()))
}

impl<C: Clock> OathViewModel for SessionViewModel<C> {
    fn reset_oath_session(&mut self) -> Result<(), Error> {
        self.authenticator.reset();
        Ok(())
    }

    fn unlock_oath_session(&mut self, password: &str, remember: bool) -> Result<bool, Error> {
        Ok(self.authenticator.unlock(password, remember))
    }

    fn set_oath_password(&mut self, current: Option<&str>, new: &str) -> Result<(), Error> {
        self.authenticator.set_password(current, new)
    }

    fn unset_oath_password(&mut self, current: &str) -> Result<(), Error> {
        self.authenticator.unset_password(current)
    }

    fn forget_password(&mut self) -> Result<(), Error> {
        self.authenticator.forget_password();
        Ok(())
    }

    fn add_account(&mut self, uri: &str, require_touch: bool) -> Result<Credential, Error> {
        let data = CredentialData::parse(uri)?;
        let credential = self.authenticator_unlocked().put_credential(data, require_touch)?;
        info!("added account {}", credential.account_name);
        Ok(convert::credential(&credential, &self.device_id))
    }

    fn rename_credential(&mut self, id: &str, name: &str, issuer: Option<&str>) -> Result<Credential, Error> {
        let credential = self.authenticator_unlocked().rename_credential(&decode_id(id)?, name, issuer)?;
        Ok(convert::credential(&credential, &self.device_id))
    }

    fn delete_account(&mut self, id: &str) -> Result<(), Error> {
        self.authenticator_unlocked().delete_credential(&decode_id(id)?)
    }

    fn refresh_oath_codes(&mut self) -> Result<BTreeMap<Credential, Option<Code>>, Error> {
        let now = self.clock.now();
        let codes = self.authenticator_unlocked().calculate_codes(now)?;
        Ok(convert::table(&codes, &self.device_id))
    }

    fn calculate(&mut self, id: &str) -> Result<Code, Error> {
        let id = decode_id(id)?;
        let now = self.clock.now();
        let code = self.authenticator_unlocked().calculate_code(&id, now)?;
        Ok(convert::code(&code))
    }
}
