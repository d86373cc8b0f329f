//! Remote feature-flag and subscription-offer state.
//!
//! Both records are cached locally and only replaced by a successful
//! remote fetch. The cascade in [`FlagSnapshot::download_visible`] decides
//! whether the download surface is shown for a given app version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current values of the download-gating flags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSnapshot {
    /// Base visibility flag (`x5t9`)
    pub primary: bool,

    /// Blanket suppression for every version up to the legacy cutover (`hiBuFVer`)
    pub legacy_override: bool,

    /// Suppression scoped to the v1 literal (`hFor1_0_8`)
    pub override_v1: bool,

    /// Suppression scoped to the v2 literal (`hFor1_0_9`)
    pub override_v2: bool,

    /// Remote config revision (`version`)
    pub config_version: Option<String>,

    /// When the last successful response was applied
    pub fetched_at: Option<DateTime<Utc>>,
}

/// The two version literals the scoped overrides apply to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionGates {
    pub v1: String,
    pub v2: String,
}

impl Default for VersionGates {
    fn default() -> Self {
        Self {
            v1: "1.0.8".to_string(),
            v2: "1.0.9".to_string(),
        }
    }
}

impl FlagSnapshot {
    /// Evaluate the kill-switch cascade for `running_version`.
    ///
    /// Precedence: v2 override, v1 override, legacy override, then `primary`.
    pub fn download_visible(&self, running_version: &str, gates: &VersionGates) -> bool {
        if self.override_v2 && running_version == gates.v2 {
            return false;
        }
        if self.override_v1 && running_version == gates.v1 {
            return false;
        }
        if self.legacy_override {
            return false;
        }
        self.primary
    }

    /// Overwrite the fields present in `payload`, leaving absent ones untouched
    pub fn merge(&mut self, payload: &FlagPayload, fetched_at: DateTime<Utc>) {
        if let Some(v) = payload.primary {
            self.primary = v;
        }
        if let Some(v) = payload.legacy_override {
            self.legacy_override = v;
        }
        if let Some(v) = payload.override_v1 {
            self.override_v1 = v;
        }
        if let Some(v) = payload.override_v2 {
            self.override_v2 = v;
        }
        if let Some(ref v) = payload.version {
            self.config_version = Some(v.clone());
        }
        self.fetched_at = Some(fetched_at);
    }
}

/// Remote feature-flag document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlagPayload {
    #[serde(default, rename = "x5t9")]
    pub primary: Option<bool>,

    #[serde(default, rename = "hiBuFVer")]
    pub legacy_override: Option<bool>,

    #[serde(default, rename = "hFor1_0_8")]
    pub override_v1: Option<bool>,

    #[serde(default, rename = "hFor1_0_9")]
    pub override_v2: Option<bool>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub last_updated: Option<String>,

    /// Offer settings embedded in the flag document. Kept untyped: the flag
    /// refresh never applies them, so a malformed member must not reject
    /// the flags next to it.
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

fn default_package() -> String {
    "annual".to_string()
}

/// Paywall offer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOffer {
    #[serde(default)]
    pub offering_id: String,

    #[serde(default)]
    pub fallback_offering_id: Option<String>,

    #[serde(default = "default_true")]
    pub show_annual: bool,

    #[serde(default = "default_true")]
    pub show_monthly: bool,

    #[serde(default = "default_true")]
    pub show_weekly: bool,

    #[serde(default = "default_package")]
    pub preferred_package: String,
}

impl Default for SubscriptionOffer {
    fn default() -> Self {
        Self {
            offering_id: String::new(),
            fallback_offering_id: None,
            show_annual: default_true(),
            show_monthly: default_true(),
            show_weekly: default_true(),
            preferred_package: default_package(),
        }
    }
}

/// Wire form of the offer settings (`offering_id` is required)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOfferPayload {
    pub offering_id: String,

    #[serde(default)]
    pub fallback_offering_id: Option<String>,

    #[serde(default = "default_true")]
    pub show_annual: bool,

    #[serde(default = "default_true")]
    pub show_monthly: bool,

    #[serde(default = "default_true")]
    pub show_weekly: bool,

    #[serde(default = "default_package")]
    pub preferred_package: String,
}

impl From<SubscriptionOfferPayload> for SubscriptionOffer {
    fn from(p: SubscriptionOfferPayload) -> Self {
        Self {
            offering_id: p.offering_id,
            fallback_offering_id: p.fallback_offering_id,
            show_annual: p.show_annual,
            show_monthly: p.show_monthly,
            show_weekly: p.show_weekly,
            preferred_package: p.preferred_package,
        }
    }
}

/// Subscription endpoint document: offer settings under `settings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEnvelope {
    pub settings: SubscriptionOfferPayload,
}
