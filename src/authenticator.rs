//! A software OATH authenticator.
//!
//! It behaves like the OATH application of a security key: credentials are
//! addressed by their raw id bytes, codes come back with millisecond validity
//! windows, and an optional access password locks the whole thing. Secrets
//! stay in memory; [`Authenticator::save`] writes the credential store (never
//! the password) to a postcard-encoded state file.

use std::collections::HashMap;
use std::path::Path;

use hmac::{Hmac, Mac};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::convert::encode_id;
use crate::error::Error;
use crate::oath::{Code, Credential, OathType};
use crate::uri::{Algorithm, CredentialData};

#[derive(Clone, Deserialize, PartialEq, Serialize)]
/// A credential together with what is needed to calculate its codes.
struct Entry {
    credential: Credential,
    algorithm: Algorithm,
    digits: u8,
    counter: u64,
    secret: Vec<u8>,
}

#[derive(Default)]
/// The core "app": credential store, code calculation and access password
pub struct Authenticator {
    entries: Vec<Entry>,
    password: Option<String>,
    remembered: Option<String>,
    unlocked: bool,
}

impl Authenticator {
    /// An empty authenticator without access password.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the credential store from `path`; a missing file yields an
    /// empty authenticator.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no state file at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let entries: Vec<Entry> = postcard::from_bytes(&bytes)?;
        debug!("loaded {} credentials from {}", entries.len(), path.display());
        Ok(Self { entries, ..Self::default() })
    }

    /// Writes the credential store to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let bytes = postcard::to_stdvec(&self.entries)?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!("saved {} credentials to {}", self.entries.len(), path.as_ref().display());
        Ok(())
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.password.is_some() && !self.unlocked
    }

    /// Locks the authenticator again, if it has a password.
    pub fn lock(&mut self) {
        self.unlocked = false;
    }

    /// Unlocks with `password`. With `remember`, the password is kept so that
    /// [`Self::unlock_remembered`] works until [`Self::forget_password`].
    pub fn unlock(&mut self, password: &str, remember: bool) -> bool {
        match &self.password {
            None => true,
            Some(expected) if expected == password => {
                self.unlocked = true;
                if remember {
                    self.remembered = Some(password.to_string());
                }
                info!("unlocked");
                true
            }
            Some(_) => {
                warn!("unlock with wrong password");
                false
            }
        }
    }

    /// Unlocks with a remembered password, if there is one.
    pub fn unlock_remembered(&mut self) -> bool {
        match self.remembered.clone() {
            Some(password) => self.unlock(&password, false),
            None => !self.is_locked(),
        }
    }

    /// Sets a new access password. If one is set already, `current` must match it.
    pub fn set_password(&mut self, current: Option<&str>, new: &str) -> Result<(), Error> {
        if let Some(expected) = &self.password {
            if current != Some(expected.as_str()) {
                return Err(Error::WrongPassword);
            }
        }
        self.password = Some(new.to_string());
        if self.remembered.is_some() {
            self.remembered = Some(new.to_string());
        }
        self.unlocked = true;
        info!("access password set");
        Ok(())
    }

    /// Removes the access password.
    pub fn unset_password(&mut self, current: &str) -> Result<(), Error> {
        match &self.password {
            None => Err(Error::PasswordNotSet),
            Some(expected) if expected != current => Err(Error::WrongPassword),
            Some(_) => {
                self.password = None;
                self.remembered = None;
                self.unlocked = true;
                info!("access password removed");
                Ok(())
            }
        }
    }

    pub fn forget_password(&mut self) {
        self.remembered = None;
    }

    /// Removes all credentials and the access password.
    pub fn reset(&mut self) {
        *self = Self::default();
        info!("authenticator reset");
    }

    pub fn credentials(&self) -> Result<Vec<Credential>, Error> {
        self.ensure_unlocked()?;
        Ok(self.entries.iter().map(|entry| entry.credential.clone()).collect())
    }

    /// Stores a new credential.
    pub fn put_credential(&mut self, data: CredentialData, touch_required: bool) -> Result<Credential, Error> {
        self.ensure_unlocked()?;
        let CredentialData { name, issuer, oath_type, algorithm, digits, period, counter, secret } = data;
        let credential = Credential::new(oath_type, period, issuer, name, touch_required);
        if self.position(&credential.id).is_some() {
            return Err(Error::CredentialExists(encode_id(&credential.id)));
        }
        debug!("put credential {}", encode_id(&credential.id));
        self.entries.push(Entry { credential: credential.clone(), algorithm, digits, counter, secret });
        Ok(credential)
    }

    /// Changes name and issuer of a credential, which changes its id.
    pub fn rename_credential(&mut self, id: &[u8], name: &str, issuer: Option<&str>) -> Result<Credential, Error> {
        self.ensure_unlocked()?;
        let index = self.find(id)?;
        let old = &self.entries[index].credential;
        let renamed = Credential::new(
            old.oath_type,
            old.period,
            issuer.map(str::to_string),
            name.to_string(),
            old.touch_required,
        );
        if renamed.id != old.id && self.position(&renamed.id).is_some() {
            return Err(Error::CredentialExists(encode_id(&renamed.id)));
        }
        debug!("rename credential {} to {}", encode_id(id), encode_id(&renamed.id));
        self.entries[index].credential = renamed.clone();
        Ok(renamed)
    }

    pub fn delete_credential(&mut self, id: &[u8]) -> Result<(), Error> {
        self.ensure_unlocked()?;
        let index = self.find(id)?;
        self.entries.remove(index);
        debug!("deleted credential {}", encode_id(id));
        Ok(())
    }

    /// Codes of all credentials at `now` (milliseconds). HOTP and touch
    /// credentials are listed without a code; they need [`Self::calculate_code`].
    pub fn calculate_codes(&self, now: u64) -> Result<HashMap<Credential, Option<Code>>, Error> {
        self.ensure_unlocked()?;
        self.entries
            .iter()
            .map(|entry| {
                let code = if entry.credential.oath_type == OathType::Hotp || entry.credential.touch_required {
                    None
                } else {
                    Some(totp_code(entry, now)?)
                };
                Ok::<_, Error>((entry.credential.clone(), code))
            })
            .collect()
    }

    /// Calculates a code for one credential. HOTP counters advance.
    pub fn calculate_code(&mut self, id: &[u8], now: u64) -> Result<Code, Error> {
        self.ensure_unlocked()?;
        let index = self.find(id)?;
        let entry = &mut self.entries[index];
        debug!("calculate {}", encode_id(id));
        match entry.credential.oath_type {
            OathType::Hotp => {
                let next = entry
                    .counter
                    .checked_add(1)
                    .ok_or_else(|| Error::CounterExhausted(encode_id(id)))?;
                let value = hotp(&entry.secret, entry.counter, entry.digits, entry.algorithm)?;
                entry.counter = next;
                Ok(Code { value, valid_from: now, valid_until: u64::MAX })
            }
            _ => totp_code(entry, now),
        }
    }

    fn ensure_unlocked(&self) -> Result<(), Error> {
        if self.is_locked() {
            return Err(Error::Locked);
        }
        Ok(())
    }

    fn position(&self, id: &[u8]) -> Option<usize> {
        self.entries.iter().position(|entry| entry.credential.id == id)
    }

    fn find(&self, id: &[u8]) -> Result<usize, Error> {
        self.position(id).ok_or_else(|| Error::NoSuchCredential(encode_id(id)))
    }
}

fn totp_code(entry: &Entry, now: u64) -> Result<Code, Error> {
    let period = u64::from(entry.credential.period.max(1));
    let counter = now / 1000 / period;
    let value = hotp(&entry.secret, counter, entry.digits, entry.algorithm)?;
    // valid_from <= now, only the window end can run past u64::MAX
    let valid_from = counter * period * 1000;
    Ok(Code { value, valid_from, valid_until: valid_from.saturating_add(period * 1000) })
}

/// RFC 4226 HOTP value with dynamic truncation, left-zero-padded to `digits`.
pub fn hotp(secret: &[u8], counter: u64, digits: u8, algorithm: Algorithm) -> Result<String, Error> {
    let message = counter.to_be_bytes();
    let hash = match algorithm {
        Algorithm::Sha1 => mac::<Hmac<Sha1>>(secret, &message)?,
        Algorithm::Sha256 => mac::<Hmac<Sha256>>(secret, &message)?,
        Algorithm::Sha512 => mac::<Hmac<Sha512>>(secret, &message)?,
    };

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let truncated = u32::from_be_bytes([hash[offset], hash[offset + 1], hash[offset + 2], hash[offset + 3]]) & 0x7fff_ffff;
    let code = u64::from(truncated) % 10u64.pow(u32::from(digits));
    Ok(format!("{:0width$}", code, width = digits as usize))
}

fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| Error::InvalidSecret)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
