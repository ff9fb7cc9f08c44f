//! Stage resolution: where an identity sits in the onboarding pipeline.
//!
//! [`resolve`] is the single decision table for every entry point. It is pure:
//! callers fetch the inputs, this module only decides.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  identity::Identity,
  invitation::{Invitation, InvitationToken},
  profile::{ApprovalStatus, Profile, RoleCode},
  tenant::Tenant,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StageCode {
  NoIdentity,
  EmailUnverified,
  NoProfile,
  MemberInvited,
  OwnerPendingApproval,
  OwnerRejected,
  OwnerSetupIncomplete,
  Ready,
}

/// What the caller should invoke to move the identity forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NextAction {
  SignIn,
  VerifyEmail,
  CreateProfile,
  AcceptInvitation { token: InvitationToken },
  CompleteOwnerOnboarding,
  AwaitApproval,
  /// Terminal: the owner application was rejected.
  ContactSupport { reason: Option<String> },
  CompleteAcademySetup,
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
  pub code:        StageCode,
  pub next_action: Option<NextAction>,
}

impl Stage {
  fn new(code: StageCode, next_action: NextAction) -> Self {
    Self { code, next_action: Some(next_action) }
  }

  pub fn ready() -> Self { Self { code: StageCode::Ready, next_action: None } }

  pub fn is_ready(&self) -> bool { self.code == StageCode::Ready }

  /// Pipeline position used to compare stages. Both `NoProfile` variants
  /// share a rank; terminal rejection ranks with pending approval.
  pub fn rank(&self) -> u8 {
    match self.code {
      StageCode::NoIdentity => 0,
      StageCode::EmailUnverified => 1,
      StageCode::NoProfile => match self.next_action {
        Some(NextAction::CreateProfile) => 2,
        _ => 3,
      },
      StageCode::MemberInvited => 3,
      StageCode::OwnerPendingApproval | StageCode::OwnerRejected => 4,
      StageCode::OwnerSetupIncomplete => 5,
      StageCode::Ready => 6,
    }
  }
}

/// Inputs already fetched for a single resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInputs<'a> {
  pub identity:   Option<&'a Identity>,
  pub profile:    Option<&'a Profile>,
  /// An open (pending, unexpired) invitation addressed to the profile email.
  pub invitation: Option<&'a Invitation>,
  /// The tenant referenced by `profile.tenant_id`, if any.
  pub tenant:     Option<&'a Tenant>,
}

/// Map the inputs to a [`Stage`]. Check order is significant.
pub fn resolve(inputs: StageInputs<'_>) -> Stage {
  let Some(identity) = inputs.identity else {
    return Stage::new(StageCode::NoIdentity, NextAction::SignIn);
  };

  if !identity.email_confirmed {
    return Stage::new(StageCode::EmailUnverified, NextAction::VerifyEmail);
  }

  let Some(profile) = inputs.profile else {
    return Stage::new(StageCode::NoProfile, NextAction::CreateProfile);
  };

  if profile.tenant_id.is_none() {
    // "No tenant yet" is ambiguous between invited staff and a new owner;
    // a waiting invitation decides it.
    return match inputs.invitation {
      Some(invitation) => Stage::new(
        StageCode::MemberInvited,
        NextAction::AcceptInvitation { token: invitation.token.clone() },
      ),
      None => Stage::new(StageCode::NoProfile, NextAction::CompleteOwnerOnboarding),
    };
  }

  let is_owner = profile.role_code == Some(RoleCode::Owner);

  if is_owner {
    match profile.approval_status {
      ApprovalStatus::Pending => {
        return Stage::new(StageCode::OwnerPendingApproval, NextAction::AwaitApproval);
      }
      ApprovalStatus::Rejected => {
        return Stage::new(
          StageCode::OwnerRejected,
          NextAction::ContactSupport { reason: profile.rejection_reason.clone() },
        );
      }
      ApprovalStatus::Approved => {}
    }

    let setup_complete = inputs.tenant.is_some_and(Tenant::is_setup_complete);
    if !setup_complete {
      return Stage::new(
        StageCode::OwnerSetupIncomplete,
        NextAction::CompleteAcademySetup,
      );
    }
  }

  Stage::ready()
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    identity::IdentityId,
    invitation::InvitationStatus,
    tenant::{AcademySettings, TenantId},
  };

  fn identity(confirmed: bool) -> Identity {
    Identity {
      id:              IdentityId::new("u1").unwrap(),
      email:           "jane@example.com".into(),
      email_confirmed: confirmed,
    }
  }

  fn profile() -> Profile {
    Profile::bootstrap(
      IdentityId::new("u1").unwrap(),
      "jane@example.com".into(),
      Utc::now(),
    )
  }

  fn owner(status: ApprovalStatus, tenant_id: TenantId) -> Profile {
    Profile {
      tenant_id: Some(tenant_id),
      role_code: Some(RoleCode::Owner),
      approval_status: status,
      ..profile()
    }
  }

  fn tenant(id: TenantId, timezone: Option<&str>) -> Tenant {
    Tenant {
      id,
      name: "Jane's Academy".into(),
      owner_id: IdentityId::new("u1").unwrap(),
      slug: None,
      timezone: timezone.map(str::to_owned),
      settings: AcademySettings::default(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn invitation() -> Invitation {
    Invitation {
      token:      InvitationToken::generate(),
      tenant_id:  TenantId::new_v4(),
      invited_by: IdentityId::new("owner").unwrap(),
      email:      "jane@example.com".into(),
      role_code:  RoleCode::Instructor,
      status:     InvitationStatus::Pending,
      expires_at: Utc::now() + Duration::days(7),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn no_identity() {
    let stage = resolve(StageInputs::default());
    assert_eq!(stage.code, StageCode::NoIdentity);
    assert_eq!(stage.next_action, Some(NextAction::SignIn));
  }

  #[test]
  fn unverified_email_gates_everything() {
    let id = identity(false);
    let p = owner(ApprovalStatus::Approved, TenantId::new_v4());
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::EmailUnverified);
  }

  #[test]
  fn missing_profile_asks_for_bootstrap() {
    let id = identity(true);
    let stage = resolve(StageInputs { identity: Some(&id), ..Default::default() });
    assert_eq!(stage.code, StageCode::NoProfile);
    assert_eq!(stage.next_action, Some(NextAction::CreateProfile));
  }

  #[test]
  fn tenantless_profile_with_invitation_is_member_invited() {
    let id = identity(true);
    let p = profile();
    let inv = invitation();
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      invitation: Some(&inv),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::MemberInvited);
    assert_eq!(
      stage.next_action,
      Some(NextAction::AcceptInvitation { token: inv.token.clone() })
    );
  }

  #[test]
  fn tenantless_profile_without_invitation_needs_owner_onboarding() {
    let id = identity(true);
    let p = profile();
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::NoProfile);
    assert_eq!(stage.next_action, Some(NextAction::CompleteOwnerOnboarding));
  }

  #[test]
  fn pending_owner_waits_for_approval_even_with_complete_setup() {
    let id = identity(true);
    let tid = TenantId::new_v4();
    let p = owner(ApprovalStatus::Pending, tid);
    let t = tenant(tid, Some("UTC"));
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      tenant: Some(&t),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::OwnerPendingApproval);
  }

  #[test]
  fn rejected_owner_is_terminal() {
    let id = identity(true);
    let tid = TenantId::new_v4();
    let p = Profile {
      rejection_reason: Some("duplicate academy".into()),
      ..owner(ApprovalStatus::Rejected, tid)
    };
    let t = tenant(tid, Some("UTC"));
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      tenant: Some(&t),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::OwnerRejected);
    assert!(!stage.is_ready());
    assert_eq!(
      stage.next_action,
      Some(NextAction::ContactSupport { reason: Some("duplicate academy".into()) })
    );
  }

  #[test]
  fn approved_owner_without_timezone_must_finish_setup() {
    let id = identity(true);
    let tid = TenantId::new_v4();
    let p = owner(ApprovalStatus::Approved, tid);
    let t = tenant(tid, None);
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      tenant: Some(&t),
      ..Default::default()
    });
    assert_eq!(stage.code, StageCode::OwnerSetupIncomplete);
  }

  #[test]
  fn approved_owner_with_complete_setup_is_ready() {
    let id = identity(true);
    let tid = TenantId::new_v4();
    let p = owner(ApprovalStatus::Approved, tid);
    let t = tenant(tid, Some("Asia/Seoul"));
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      tenant: Some(&t),
      ..Default::default()
    });
    assert_eq!(stage, Stage::ready());
  }

  #[test]
  fn staff_member_is_ready_regardless_of_tenant_setup() {
    let id = identity(true);
    let tid = TenantId::new_v4();
    let p = Profile {
      tenant_id: Some(tid),
      role_code: Some(RoleCode::Instructor),
      approval_status: ApprovalStatus::Approved,
      ..profile()
    };
    let t = tenant(tid, None);
    let stage = resolve(StageInputs {
      identity: Some(&id),
      profile: Some(&p),
      tenant: Some(&t),
      ..Default::default()
    });
    assert!(stage.is_ready());
  }

  #[test]
  fn codes_serialize_screaming_snake() {
    assert_eq!(StageCode::OwnerPendingApproval.as_ref(), "OWNER_PENDING_APPROVAL");
    let json = serde_json::to_value(Stage::ready()).unwrap();
    assert_eq!(json["code"], "READY");
  }
}
