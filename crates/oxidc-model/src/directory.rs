//! User attributes sourced from the external directory service.
//!
//! The directory owns user, group, and role data. The core only reads
//! from it, through [`DirectoryProvider`], and only at claim-resolution
//! time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Structured postal address, shaped after the OIDC `address` claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryAddress {
    /// Full mailing address, formatted for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Street address component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    /// City or locality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    /// State, province, or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Zip or postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Country name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// A user record as the directory service reports it.
///
/// Everything except `id` is optional; the claims resolver only emits
/// what is both present here and covered by a granted scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Stable unique identifier; becomes the token `sub`.
    pub id: String,
    /// Login name.
    #[serde(default)]
    pub username: Option<String>,
    /// Full display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub family_name: Option<String>,
    /// BCP 47 locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// IANA time zone.
    #[serde(default)]
    pub zoneinfo: Option<String>,
    /// When the record was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: Option<bool>,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Whether the phone number has been verified.
    #[serde(default)]
    pub phone_number_verified: Option<bool>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<DirectoryAddress>,
    /// Group memberships by name.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Assigned role names.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl DirectoryUser {
    /// Creates a minimal user with only an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Read-only lookup into the directory service.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Fetches a user by id. `None` when the user no longer exists.
    async fn lookup_user(&self, user_id: &str) -> Result<Option<DirectoryUser>, ProviderError>;
}
