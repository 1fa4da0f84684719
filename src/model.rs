//! Presentation model handed to the view-model layer.
//!
//! Values here are plain data: structural equality, hashing and ordering are
//! derived so a [`Credential`] can key either a `HashMap` or a `BTreeMap`.
//! Field names serialize in camelCase for the platform side.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum OathType {
    Hotp,
    Totp,
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
/// A credential as shown to the user, tagged with the device it lives on.
pub struct Credential {
    pub device_id: String,
    /// Lowercase hex of the raw credential id
    pub id: String,
    pub oath_type: OathType,
    /// Seconds
    pub period: u32,
    pub issuer: Option<String>,
    pub account_name: String,
    pub touch_required: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
/// A code with its validity window in whole seconds since the UNIX epoch.
pub struct Code {
    pub value: String,
    pub valid_from: u64,
    pub valid_until: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_json_uses_camel_case() {
        let credential = Credential {
            device_id: "dev-1".into(),
            id: "01".into(),
            oath_type: OathType::Hotp,
            period: 30,
            issuer: None,
            account_name: "user@acme".into(),
            touch_required: true,
        };
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["deviceId"], "dev-1");
        assert_eq!(json["oathType"], "HOTP");
        assert_eq!(json["accountName"], "user@acme");
        assert_eq!(json["touchRequired"], true);
        assert!(json["issuer"].is_null());
    }

    #[test]
    fn code_json_uses_camel_case() {
        let code = Code { value: "123456".into(), valid_from: 60, valid_until: 90 };
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#"{"value":"123456","validFrom":60,"validUntil":90}"#);
    }
}
