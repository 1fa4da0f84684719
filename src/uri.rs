//! `otpauth://` key URIs, as scanned from QR codes when adding an account.
//!
//! cf. https://github.com/google/google-authenticator/wiki/Key-Uri-Format
//! eg. otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP&issuer=Example

use crate::error::Error;
use crate::oath::{OathType, DEFAULT_PERIOD};

/// HMAC hash function of a credential
#[derive(Clone, Copy, Debug, serde::Deserialize, Eq, PartialEq, serde::Serialize)]
#[allow(missing_docs)]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Everything needed to put a new credential on a key
pub struct CredentialData {
    pub name: String,
    pub issuer: Option<String>,
    pub oath_type: OathType,
    pub algorithm: Algorithm,
    pub digits: u8,
    pub period: u32,
    pub counter: u64,
    pub secret: Vec<u8>,
}

/// Decodes a base32 secret the way users paste them: any case, with or
/// without padding and grouping spaces.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, Error> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    data_encoding::BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| Error::InvalidSecret)
}

impl CredentialData {
    /// Parses an `otpauth://` URI.
    pub fn parse(uri: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidUri(reason.to_string());

        let url = url::Url::parse(uri).map_err(|e| Error::InvalidUri(e.to_string()))?;
        if url.scheme() != "otpauth" {
            return Err(Error::InvalidUri(format!("unexpected scheme {}", url.scheme())));
        }

        let oath_type = match url.host_str().map(|host| host.to_ascii_lowercase()).as_deref() {
            Some("totp") => OathType::Totp,
            Some("hotp") => OathType::Hotp,
            _ => return Err(invalid("type must be totp or hotp")),
        };

        let path = url.path().trim_start_matches('/');
        let label = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
        let (label_issuer, name) = match label.find(':') {
            Some(colon) => (Some(label[..colon].trim().to_string()), label[colon + 1..].trim().to_string()),
            None => (None, label.trim().to_string()),
        };
        if name.is_empty() {
            return Err(invalid("missing account name"));
        }

        let mut secret = None;
        let mut issuer = None;
        let mut algorithm = Algorithm::default();
        let mut digits = 6u8;
        let mut period = DEFAULT_PERIOD;
        let mut counter = 0u64;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "secret" => secret = Some(decode_secret(&value)?),
                "issuer" => issuer = Some(value.to_string()),
                "algorithm" => {
                    algorithm = match value.to_ascii_uppercase().as_str() {
                        "SHA1" => Algorithm::Sha1,
                        "SHA256" => Algorithm::Sha256,
                        "SHA512" => Algorithm::Sha512,
                        _ => return Err(invalid("unsupported algorithm")),
                    }
                }
                "digits" => digits = value.parse().map_err(|_| invalid("digits is not a number"))?,
                "period" => period = value.parse().map_err(|_| invalid("period is not a number"))?,
                "counter" => counter = value.parse().map_err(|_| invalid("counter is not a number"))?,
                _ => {}
            }
        }

        if !(6..=8).contains(&digits) {
            return Err(invalid("digits must be between 6 and 8"));
        }
        if period == 0 {
            return Err(invalid("period must be positive"));
        }
        let secret = secret.ok_or_else(|| invalid("missing secret"))?;

        Ok(Self {
            name,
            issuer: issuer.or(label_issuer).filter(|issuer| !issuer.is_empty()),
            oath_type,
            algorithm,
            digits,
            period,
            counter,
            secret,
        })
    }
}
