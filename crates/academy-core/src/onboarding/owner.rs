//! Owner onboarding: tenant creation and the follow-up academy setup.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{bootstrap::load_or_create, require_confirmed, Onboarding};
use crate::{
  identity::{Identity, IdentityId},
  profile::{ApprovalStatus, Profile, RoleCode},
  store::OnboardingStore,
  tenant::{validate_slug, validate_timezone, AcademySettings, Tenant, TenantId},
  Error, ErrorKind, Result,
};

/// Input for [`Onboarding::complete_owner_onboarding`].
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerOnboarding {
  pub name:         String,
  pub academy_name: String,
  #[serde(default)]
  pub slug:         Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerOnboarded {
  pub profile: Profile,
  pub tenant:  Tenant,
}

/// Input for [`Onboarding::complete_academy_setup`].
#[derive(Debug, Clone, Deserialize)]
pub struct AcademySetup {
  pub timezone: String,
  #[serde(default)]
  pub settings: AcademySettings,
}

impl<S: OnboardingStore> Onboarding<S> {
  /// Create a tenant owned by `identity` and promote its Profile to a
  /// pending owner, in one transaction.
  ///
  /// A Profile that already has a tenant fails with `Conflict`, so a
  /// resubmitted form never creates a second tenant.
  pub async fn complete_owner_onboarding(
    &self,
    identity: &Identity,
    input: OwnerOnboarding,
  ) -> Result<OwnerOnboarded> {
    let name = required(&input.name, "name")?;
    let academy_name = required(&input.academy_name, "academy name")?;
    let slug = match input.slug.as_deref().map(str::trim) {
      Some(s) if !s.is_empty() => Some(validate_slug(s)?),
      _ => None,
    };
    let email = require_confirmed(identity)?;
    let identity = identity.clone();
    let now = Utc::now();

    let result = self
      .store
      .transaction(move |tx| {
        let (mut profile, _) = load_or_create(tx, &identity, email, now)?;
        if let Some(existing) = profile.tenant_id {
          return Err(Error::conflict(format!(
            "profile {} already belongs to tenant {existing}",
            profile.id
          )));
        }

        let tenant = Tenant {
          id: TenantId::new_v4(),
          name: academy_name,
          owner_id: profile.id.clone(),
          slug,
          timezone: None,
          settings: AcademySettings::default(),
          created_at: now,
          updated_at: now,
        };
        tx.insert_tenant(&tenant)?;

        profile.tenant_id = Some(tenant.id);
        profile.role_code = Some(RoleCode::Owner);
        profile.approval_status = ApprovalStatus::Pending;
        profile.name = Some(name);
        profile.updated_at = now;
        tx.update_profile(&profile)?;

        Ok(OwnerOnboarded { profile, tenant })
      })
      .await;

    match &result {
      Ok(done) => info!(
        identity = %done.profile.id,
        tenant = %done.tenant.id,
        "created tenant for new owner"
      ),
      Err(e) if e.kind() == ErrorKind::Conflict => {
        warn!(error = %e, "owner onboarding refused")
      }
      Err(_) => {}
    }
    result
  }

  /// Fill in the operational fields of the owner's tenant. Repeated calls
  /// overwrite the same fields.
  pub async fn complete_academy_setup(
    &self,
    owner_id: &IdentityId,
    input: AcademySetup,
  ) -> Result<Tenant> {
    let timezone = validate_timezone(&input.timezone)?;
    let settings = input.settings.normalized()?;
    let owner_id = owner_id.clone();
    let now = Utc::now();

    let tenant = self
      .store
      .transaction(move |tx| {
        let profile = tx
          .profile(&owner_id)?
          .ok_or_else(|| Error::not_found("profile", &owner_id))?;
        let Some(tenant_id) = profile.tenant_id else {
          return Err(Error::conflict(
            "academy setup requires a completed owner onboarding",
          ));
        };
        if profile.role_code != Some(RoleCode::Owner) {
          return Err(Error::forbidden("only the owner may configure the academy"));
        }

        let mut tenant = tx
          .tenant(tenant_id)?
          .ok_or_else(|| Error::not_found("tenant", tenant_id))?;
        tenant.timezone = Some(timezone);
        tenant.settings = settings;
        tenant.updated_at = now;
        tx.update_tenant(&tenant)?;
        Ok(tenant)
      })
      .await?;

    info!(tenant = %tenant.id, "academy setup saved");
    Ok(tenant)
  }
}

fn required(value: &str, field: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::validation(format!("{field} must not be empty")));
  }
  Ok(trimmed.to_owned())
}
