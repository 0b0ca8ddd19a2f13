//! Scope-to-claims resolution.
//!
//! Maps granted scopes onto user attributes from the directory
//! collaborator. The mapping is deterministic and strictly scope-gated:
//! a claim is emitted only when its scope was granted AND the directory
//! has a value for it. Nothing else ever leaves this function,
//! whatever the directory returned.

use serde_json::{Map, Value};

use oxidc_model::DirectoryUser;

use crate::types::scopes;

/// Resolves scope-gated claims for a user.
pub struct ClaimsResolver;

impl ClaimsResolver {
    /// Maps granted scopes to a claim map for ID tokens and userinfo.
    #[must_use]
    pub fn resolve(user: &DirectoryUser, granted_scopes: &[String]) -> Map<String, Value> {
        let mut claims = Map::new();
        let granted = |scope: &str| granted_scopes.iter().any(|s| s == scope);

        if granted(scopes::PROFILE) {
            put_str(&mut claims, "name", user.name.as_deref());
            put_str(&mut claims, "given_name", user.given_name.as_deref());
            put_str(&mut claims, "family_name", user.family_name.as_deref());
            put_str(&mut claims, "preferred_username", user.username.as_deref());
            put_str(&mut claims, "locale", user.locale.as_deref());
            put_str(&mut claims, "zoneinfo", user.zoneinfo.as_deref());
            if let Some(updated) = user.updated_at {
                claims.insert("updated_at".to_string(), Value::from(updated.timestamp()));
            }
        }

        if granted(scopes::EMAIL) {
            put_str(&mut claims, "email", user.email.as_deref());
            if let Some(verified) = user.email_verified {
                claims.insert("email_verified".to_string(), Value::Bool(verified));
            }
        }

        if granted(scopes::PHONE) {
            put_str(&mut claims, "phone_number", user.phone_number.as_deref());
            if let Some(verified) = user.phone_number_verified {
                claims.insert("phone_number_verified".to_string(), Value::Bool(verified));
            }
        }

        if granted(scopes::ADDRESS) {
            if let Some(address) = &user.address {
                if let Ok(value) = serde_json::to_value(address) {
                    claims.insert("address".to_string(), value);
                }
            }
        }

        if granted(scopes::GROUPS) {
            claims.insert(
                "groups".to_string(),
                Value::from(user.groups.clone()),
            );
        }

        if granted(scopes::ROLES) {
            claims.insert("roles".to_string(), Value::from(user.roles.clone()));
        }

        claims
    }
}

fn put_str(claims: &mut Map<String, Value>, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        claims.insert(name.to_string(), Value::String(v.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxidc_model::DirectoryAddress;

    fn full_user() -> DirectoryUser {
        DirectoryUser {
            id: "user-1".into(),
            username: Some("jdoe".into()),
            name: Some("Jane Doe".into()),
            given_name: Some("Jane".into()),
            family_name: Some("Doe".into()),
            locale: Some("en-US".into()),
            zoneinfo: Some("America/New_York".into()),
            updated_at: None,
            email: Some("jane@example.com".into()),
            email_verified: Some(true),
            phone_number: Some("+1 555 0100".into()),
            phone_number_verified: Some(false),
            address: Some(DirectoryAddress {
                locality: Some("Springfield".into()),
                country: Some("US".into()),
                ..DirectoryAddress::default()
            }),
            groups: vec!["staff".into()],
            roles: vec!["admin".into()],
        }
    }

    fn scopes_of(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn profile_scope_maps_profile_claims() {
        let claims = ClaimsResolver::resolve(&full_user(), &scopes_of(&["openid", "profile"]));
        assert_eq!(claims["name"], "Jane Doe");
        assert_eq!(claims["preferred_username"], "jdoe");
        assert_eq!(claims["locale"], "en-US");
        // email scope not granted
        assert!(!claims.contains_key("email"));
    }

    #[test]
    fn never_over_discloses() {
        let claims = ClaimsResolver::resolve(&full_user(), &scopes_of(&["openid", "email"]));
        assert_eq!(claims["email"], "jane@example.com");
        assert_eq!(claims["email_verified"], true);
        for withheld in ["name", "phone_number", "address", "groups", "roles"] {
            assert!(!claims.contains_key(withheld), "{withheld} leaked");
        }
    }

    #[test]
    fn no_scopes_no_claims() {
        let claims = ClaimsResolver::resolve(&full_user(), &scopes_of(&["openid"]));
        assert!(claims.is_empty());
    }

    #[test]
    fn address_is_structured() {
        let claims = ClaimsResolver::resolve(&full_user(), &scopes_of(&["address"]));
        assert_eq!(claims["address"]["locality"], "Springfield");
        assert_eq!(claims["address"]["country"], "US");
        assert!(claims["address"].get("street_address").is_none());
    }

    #[test]
    fn groups_and_roles_from_directory() {
        let claims = ClaimsResolver::resolve(&full_user(), &scopes_of(&["groups", "roles"]));
        assert_eq!(claims["groups"], serde_json::json!(["staff"]));
        assert_eq!(claims["roles"], serde_json::json!(["admin"]));
    }

    #[test]
    fn missing_attributes_are_simply_absent() {
        let user = DirectoryUser::new("user-2");
        let claims =
            ClaimsResolver::resolve(&user, &scopes_of(&["profile", "email", "phone", "address"]));
        assert!(claims.is_empty());
    }
}
