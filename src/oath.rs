//! Records as handed out by an OATH application on a security key.
//!
//! These mirror what the key reports over the wire: raw credential id bytes,
//! the raw OATH type tag and validity windows in milliseconds. They are the
//! input side of [`crate::convert`].

use serde::{Deserialize, Serialize};

/// Tag value of a counter-based credential
pub const HOTP_TAG: u8 = 0x10;
/// Tag value of a time-based credential
pub const TOTP_TAG: u8 = 0x20;

/// Default TOTP period in seconds; credential ids omit the period prefix for it
pub const DEFAULT_PERIOD: u32 = 30;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
/// OATH type tag of a credential, as read off the key.
pub enum OathType {
    /// Counter based, RFC 4226
    Hotp,
    /// Time based, RFC 6238
    Totp,
    /// Any tag this crate does not know about
    Unknown(u8),
}

impl From<u8> for OathType {
    fn from(tag: u8) -> Self {
        match tag {
            HOTP_TAG => Self::Hotp,
            TOTP_TAG => Self::Totp,
            other => Self::Unknown(other),
        }
    }
}

impl From<OathType> for u8 {
    fn from(oath_type: OathType) -> u8 {
        match oath_type {
            OathType::Hotp => HOTP_TAG,
            OathType::Totp => TOTP_TAG,
            OathType::Unknown(tag) => tag,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
/// A credential stored on a key.
pub struct Credential {
    /// Raw credential id, `[period/][issuer:]name` in UTF-8
    pub id: Vec<u8>,
    pub oath_type: OathType,
    /// Period in seconds (ignored for HOTP)
    pub period: u32,
    pub issuer: Option<String>,
    pub account_name: String,
    pub touch_required: bool,
}

impl Credential {
    /// Builds a credential, deriving its id bytes from the other fields.
    pub fn new(
        oath_type: OathType,
        period: u32,
        issuer: Option<String>,
        account_name: String,
        touch_required: bool,
    ) -> Self {
        let id = format_id(oath_type, period, issuer.as_deref(), &account_name);
        Self {
            id,
            oath_type,
            period,
            issuer,
            account_name,
            touch_required,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
/// A calculated one-time password and its validity window.
pub struct Code {
    pub value: String,
    /// Start of validity, milliseconds since the UNIX epoch
    pub valid_from: u64,
    /// End of validity, milliseconds since the UNIX epoch
    pub valid_until: u64,
}

/// Credential ids are `[period/][issuer:]name`; the period prefix is only
/// present for TOTP credentials with a non-default period.
pub fn format_id(oath_type: OathType, period: u32, issuer: Option<&str>, name: &str) -> Vec<u8> {
    let mut id = String::new();
    if oath_type == OathType::Totp && period != DEFAULT_PERIOD {
        id.push_str(&format!("{}/", period));
    }
    if let Some(issuer) = issuer {
        id.push_str(issuer);
        id.push(':');
    }
    id.push_str(name);
    id.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(OathType::from(0x10u8), OathType::Hotp);
        assert_eq!(OathType::from(0x20u8), OathType::Totp);
        assert_eq!(OathType::from(0x30u8), OathType::Unknown(0x30));
        assert_eq!(u8::from(OathType::Unknown(0x42)), 0x42);
    }

    #[test]
    fn id_format() {
        assert_eq!(format_id(OathType::Totp, 30, Some("ACME"), "alice"), b"ACME:alice");
        assert_eq!(format_id(OathType::Totp, 60, Some("ACME"), "alice"), b"60/ACME:alice");
        assert_eq!(format_id(OathType::Hotp, 60, None, "bob"), b"bob");
    }

    #[test]
    fn new_derives_id() {
        let credential = Credential::new(OathType::Totp, 15, None, "carol".into(), false);
        assert_eq!(credential.id, b"15/carol");
    }
}
