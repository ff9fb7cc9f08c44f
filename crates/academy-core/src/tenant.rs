//! Tenant: an academy created during owner onboarding.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{identity::IdentityId, Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
  pub fn new_v4() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for TenantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Opening hours for a single weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
  pub weekday: Weekday,
  pub opens:   NaiveTime,
  pub closes:  NaiveTime,
}

/// Operational fields filled in by the academy-setup step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcademySettings {
  #[serde(default)]
  pub business_hours:   Vec<BusinessHours>,
  #[serde(default)]
  pub default_subjects: Vec<String>,
}

impl AcademySettings {
  /// Validate and canonicalise: hours must open before they close with one
  /// entry per weekday; subjects are trimmed, non-empty and deduplicated.
  pub fn normalized(self) -> Result<Self> {
    let mut seen = BTreeSet::new();
    for hours in &self.business_hours {
      if hours.opens >= hours.closes {
        return Err(Error::validation(format!(
          "business hours for {} must open before they close",
          hours.weekday
        )));
      }
      if !seen.insert(hours.weekday.num_days_from_monday()) {
        return Err(Error::validation(format!(
          "duplicate business hours for {}",
          hours.weekday
        )));
      }
    }

    let mut subjects: Vec<String> = Vec::with_capacity(self.default_subjects.len());
    for subject in self.default_subjects {
      let subject = subject.trim().to_owned();
      if subject.is_empty() {
        return Err(Error::validation("default subjects must not be blank"));
      }
      if !subjects.contains(&subject) {
        subjects.push(subject);
      }
    }

    let mut business_hours = self.business_hours;
    business_hours.sort_by_key(|h| h.weekday.num_days_from_monday());

    Ok(Self { business_hours, default_subjects: subjects })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
  pub id:         TenantId,
  pub name:       String,
  pub owner_id:   IdentityId,
  pub slug:       Option<String>,
  pub timezone:   Option<String>,
  pub settings:   AcademySettings,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Tenant {
  /// Name and timezone are both required before the academy is usable.
  pub fn is_setup_complete(&self) -> bool {
    !self.name.trim().is_empty() && self.timezone.is_some()
  }
}

/// Lower-case ASCII alphanumerics and `-`, 3 to 63 characters, not starting
/// or ending with `-`.
pub fn validate_slug(raw: &str) -> Result<String> {
  let slug = raw.trim().to_lowercase();
  let ok = (3..=63).contains(&slug.len())
    && slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    && !slug.starts_with('-')
    && !slug.ends_with('-');
  if !ok {
    return Err(Error::validation(format!("invalid academy slug: {raw:?}")));
  }
  Ok(slug)
}

/// Accepts `UTC` or an `Area/Location` style IANA name.
pub fn validate_timezone(raw: &str) -> Result<String> {
  let tz = raw.trim();
  let well_formed = tz == "UTC"
    || (tz.contains('/')
      && tz.split('/').all(|part| {
        !part.is_empty()
          && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
      }));
  if !well_formed {
    return Err(Error::validation(format!("invalid timezone: {raw:?}")));
  }
  Ok(tz.to_owned())
}
