//! The OATH API as called from the platform side.
//!
//! [`OathApi`] does no work of its own: each call is forwarded to an
//! [`OathViewModel`], which owns the session with the key. Results that cross
//! the platform boundary as data are handed back as JSON strings.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::error::Error;
use crate::model::{Code, Credential};
use crate::Result;

/// What the API needs from the application layer. Credential ids are the
/// hex identities produced by [`crate::convert::encode_id`].
pub trait OathViewModel {
    fn reset_oath_session(&mut self) -> std::result::Result<(), Error>;

    /// `Ok(false)` when the password is wrong
    fn unlock_oath_session(&mut self, password: &str, remember: bool) -> std::result::Result<bool, Error>;

    fn set_oath_password(&mut self, current: Option<&str>, new: &str) -> std::result::Result<(), Error>;

    fn unset_oath_password(&mut self, current: &str) -> std::result::Result<(), Error>;

    fn forget_password(&mut self) -> std::result::Result<(), Error>;

    fn add_account(&mut self, uri: &str, require_touch: bool) -> std::result::Result<Credential, Error>;

    fn rename_credential(
        &mut self,
        id: &str,
        name: &str,
        issuer: Option<&str>,
    ) -> std::result::Result<Credential, Error>;

    fn delete_account(&mut self, id: &str) -> std::result::Result<(), Error>;

    fn refresh_oath_codes(&mut self) -> std::result::Result<BTreeMap<Credential, Option<Code>>, Error>;

    fn calculate(&mut self, id: &str) -> std::result::Result<Code, Error>;
}

#[derive(Debug, PartialEq, Serialize)]
/// One row of the `refresh_codes` answer
pub struct CodeEntry<'a> {
    pub credential: &'a Credential,
    pub code: Option<&'a Code>,
}

/// Platform-facing OATH API, forwarding to a view-model
pub struct OathApi<V> {
    view_model: V,
}

impl<V: OathViewModel> OathApi<V> {
    pub fn new(view_model: V) -> Self {
        Self { view_model }
    }

    pub fn view_model(&self) -> &V {
        &self.view_model
    }

    pub fn into_view_model(self) -> V {
        self.view_model
    }

    pub fn reset(&mut self) -> Result<()> {
        debug!("reset");
        Ok(self.view_model.reset_oath_session()?)
    }

    pub fn unlock(&mut self, password: &str, remember: bool) -> Result<bool> {
        debug!("unlock, remember: {}", remember);
        Ok(self.view_model.unlock_oath_session(password, remember)?)
    }

    pub fn set_password(&mut self, new_password: &str) -> Result<()> {
        Ok(self.view_model.set_oath_password(None, new_password)?)
    }

    pub fn change_password(&mut self, current_password: &str, new_password: &str) -> Result<()> {
        Ok(self.view_model.set_oath_password(Some(current_password), new_password)?)
    }

    pub fn unset_password(&mut self, current_password: &str) -> Result<()> {
        Ok(self.view_model.unset_oath_password(current_password)?)
    }

    pub fn forget_password(&mut self) -> Result<()> {
        Ok(self.view_model.forget_password()?)
    }

    /// Returns the new credential as JSON.
    pub fn add_account(&mut self, uri: &str, require_touch: bool) -> Result<String> {
        let credential = self.view_model.add_account(uri, require_touch)?;
        Ok(serde_json::to_string(&credential)?)
    }

    /// Returns the renamed credential as JSON.
    pub fn rename_account(&mut self, id: &str, name: &str) -> Result<String> {
        let credential = self.view_model.rename_credential(id, name, None)?;
        Ok(serde_json::to_string(&credential)?)
    }

    /// Returns the renamed credential as JSON.
    pub fn rename_account_with_issuer(&mut self, id: &str, name: &str, issuer: &str) -> Result<String> {
        let credential = self.view_model.rename_credential(id, name, Some(issuer))?;
        Ok(serde_json::to_string(&credential)?)
    }

    pub fn delete_account(&mut self, id: &str) -> Result<()> {
        Ok(self.view_model.delete_account(id)?)
    }

    /// Returns all credentials with their current code (or `null`) as a JSON
    /// array of `{"credential": .., "code": ..}` objects, in credential order.
    pub fn refresh_codes(&mut self) -> Result<String> {
        let codes = self.view_model.refresh_oath_codes()?;
        let entries: Vec<CodeEntry<'_>> = codes
            .iter()
            .map(|(credential, code)| CodeEntry { credential, code: code.as_ref() })
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }

    /// Returns the calculated code as JSON.
    pub fn calculate(&mut self, id: &str) -> Result<String> {
        let code = self.view_model.calculate(id)?;
        Ok(serde_json::to_string(&code)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OathType;

    #[derive(Debug, PartialEq)]
    enum Call {
        Reset,
        Unlock(String, bool),
        SetPassword(Option<String>, String),
        UnsetPassword(String),
        Forget,
        Add(String, bool),
        Rename(String, String, Option<String>),
        Delete(String),
        Refresh,
        Calculate(String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    fn credential(id: &str) -> Credential {
        Credential {
            device_id: "dev".into(),
            id: id.into(),
            oath_type: OathType::Totp,
            period: 30,
            issuer: None,
            account_name: "alice".into(),
            touch_required: false,
        }
    }

    impl OathViewModel for Recorder {
        fn reset_oath_session(&mut self) -> std::result::Result<(), Error> {
            self.calls.push(Call::Reset);
            Ok(())
        }

        fn unlock_oath_session(&mut self, password: &str, remember: bool) -> std::result::Result<bool, Error> {
            self.calls.push(Call::Unlock(password.into(), remember));
            Ok(password == "right")
        }

        fn set_oath_password(&mut self, current: Option<&str>, new: &str) -> std::result::Result<(), Error> {
            self.calls.push(Call::SetPassword(current.map(Into::into), new.into()));
            Ok(())
        }

        fn unset_oath_password(&mut self, current: &str) -> std::result::Result<(), Error> {
            self.calls.push(Call::UnsetPassword(current.into()));
            Err(Error::WrongPassword)
        }

        fn forget_password(&mut self) -> std::result::Result<(), Error> {
            self.calls.push(Call::Forget);
            Ok(())
        }

        fn add_account(&mut self, uri: &str, require_touch: bool) -> std::result::Result<Credential, Error> {
            self.calls.push(Call::Add(uri.into(), require_touch));
            Ok(credential("01"))
        }

        fn rename_credential(
            &mut self,
            id: &str,
            name: &str,
            issuer: Option<&str>,
        ) -> std::result::Result<Credential, Error> {
            self.calls.push(Call::Rename(id.into(), name.into(), issuer.map(Into::into)));
            Ok(credential(id))
        }

        fn delete_account(&mut self, id: &str) -> std::result::Result<(), Error> {
            self.calls.push(Call::Delete(id.into()));
            Ok(())
        }

        fn refresh_oath_codes(&mut self) -> std::result::Result<BTreeMap<Credential, Option<Code>>, Error> {
            self.calls.push(Call::Refresh);
            let mut codes = BTreeMap::new();
            codes.insert(credential("02"), None);
            codes.insert(credential("01"), Some(Code { value: "123456".into(), valid_from: 60, valid_until: 90 }));
            Ok(codes)
        }

        fn calculate(&mut self, id: &str) -> std::result::Result<Code, Error> {
            self.calls.push(Call::Calculate(id.into()));
            Err(Error::NoSuchCredential(id.into()))
        }
    }

    #[test]
    fn password_calls_forward() {
        let mut api = OathApi::new(Recorder::default());
        api.reset().unwrap();
        assert!(api.unlock("right", true).unwrap());
        assert!(!api.unlock("wrong", false).unwrap());
        api.set_password("new").unwrap();
        api.change_password("old", "new").unwrap();
        assert!(api.unset_password("old").is_err());
        api.forget_password().unwrap();

        assert_eq!(
            api.into_view_model().calls,
            vec![
                Call::Reset,
                Call::Unlock("right".into(), true),
                Call::Unlock("wrong".into(), false),
                Call::SetPassword(None, "new".into()),
                Call::SetPassword(Some("old".into()), "new".into()),
                Call::UnsetPassword("old".into()),
                Call::Forget,
            ]
        );
    }

    #[test]
    fn account_calls_forward() {
        let mut api = OathApi::new(Recorder::default());
        let added = api.add_account("otpauth://totp/alice?secret=JBSWY3DP", true).unwrap();
        assert!(added.contains(r#""id":"01""#));
        api.rename_account("01", "bob").unwrap();
        api.rename_account_with_issuer("01", "bob", "ACME").unwrap();
        api.delete_account("01").unwrap();

        assert_eq!(
            api.view_model().calls,
            vec![
                Call::Add("otpauth://totp/alice?secret=JBSWY3DP".into(), true),
                Call::Rename("01".into(), "bob".into(), None),
                Call::Rename("01".into(), "bob".into(), Some("ACME".into())),
                Call::Delete("01".into()),
            ]
        );
    }

    #[test]
    fn refresh_codes_json() {
        let mut api = OathApi::new(Recorder::default());
        let json: serde_json::Value = serde_json::from_str(&api.refresh_codes().unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["credential"]["id"], "01");
        assert_eq!(entries[0]["code"]["validUntil"], 90);
        assert_eq!(entries[1]["credential"]["id"], "02");
        assert!(entries[1]["code"].is_null());
    }

    #[test]
    fn errors_pass_through() {
        let mut api = OathApi::new(Recorder::default());
        let error = api.calculate("ff").unwrap_err();
        assert_eq!(error.downcast_ref::<Error>(), Some(&Error::NoSuchCredential("ff".into())));
    }
}
