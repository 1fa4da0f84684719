//! Conversion of key records into the presentation model.
//!
//! All functions here are total: they never fail and keep no state.

use std::collections::BTreeMap;

use crate::{model, oath};

/// Lowercase hex rendering of a raw credential id, two digits per byte, no
/// separators. Used as the credential's identity across the API, so the
/// format must not change.
pub fn encode_id(bytes: &[u8]) -> String {
    data_encoding::HEXLOWER.encode(bytes)
}

/// Only HOTP is kept as such; every other tag is presented as TOTP.
pub fn oath_type(oath_type: oath::OathType) -> model::OathType {
    match oath_type {
        oath::OathType::Hotp => model::OathType::Hotp,
        _ => model::OathType::Totp,
    }
}

/// Projects a key credential, tagging it with `device_id`.
pub fn credential(credential: &oath::Credential, device_id: &str) -> model::Credential {
    model::Credential {
        device_id: device_id.to_string(),
        id: encode_id(&credential.id),
        oath_type: oath_type(credential.oath_type),
        period: credential.period,
        issuer: credential.issuer.clone(),
        account_name: credential.account_name.clone(),
        touch_required: credential.touch_required,
    }
}

/// Projects a code, truncating its millisecond window to whole seconds.
pub fn code(code: &oath::Code) -> model::Code {
    model::Code {
        value: code.value.clone(),
        valid_from: code.valid_from / 1000,
        valid_until: code.valid_until / 1000,
    }
}

/// Projects a whole credential/code table. Absent codes stay absent.
pub fn table<'a, I>(
    codes: I,
    device_id: &str,
) -> BTreeMap<model::Credential, Option<model::Code>>
where
    I: IntoIterator<Item = (&'a oath::Credential, &'a Option<oath::Code>)>,
{
    codes
        .into_iter()
        .map(|(cred, maybe_code)| (credential(cred, device_id), maybe_code.as_ref().map(code)))
        .collect()
}
