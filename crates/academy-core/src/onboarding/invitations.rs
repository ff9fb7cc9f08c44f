//! Invitation acceptance, plus the issuing and cancel actions that feed it.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::{bootstrap::load_or_create, require_confirmed, Onboarding};
use crate::{
  identity::{normalize_email, Identity, IdentityId},
  invitation::{Invitation, InvitationStatus, InvitationToken},
  profile::{ApprovalStatus, Profile, RoleCode},
  store::OnboardingStore,
  Error, ErrorKind, Result,
};

/// Input for [`Onboarding::issue_invitation`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvitation {
  pub email:     String,
  pub role_code: RoleCode,
}

impl<S: OnboardingStore> Onboarding<S> {
  /// Consume a pending invitation and attach the accepting identity's Profile
  /// to the invitation's tenant and role.
  ///
  /// Of any number of concurrent calls with the same token exactly one
  /// succeeds; the rest fail with `AlreadyConsumed`. The status flip and the
  /// Profile update commit together or not at all.
  pub async fn accept_invitation(
    &self,
    raw_token: &str,
    identity: &Identity,
  ) -> Result<Profile> {
    let token = InvitationToken::parse(raw_token)?;
    let email = require_confirmed(identity)?;
    let fingerprint = token.fingerprint();
    let identity = identity.clone();
    let now = Utc::now();

    let result = self
      .store
      .transaction(move |tx| {
        let invitation = tx
          .invitation(&token)?
          .ok_or_else(|| Error::not_found("invitation", token.fingerprint()))?;

        // Expiry wins over every stored status.
        if invitation.is_expired_at(now) || invitation.status == InvitationStatus::Expired {
          return Err(Error::Expired(token.fingerprint()));
        }
        if invitation.status != InvitationStatus::Pending {
          return Err(Error::AlreadyConsumed {
            fingerprint: token.fingerprint(),
            status:      invitation.status,
          });
        }

        let (mut profile, _) = load_or_create(tx, &identity, email, now)?;

        if profile.email != invitation.email {
          return Err(Error::forbidden(
            "invitation is addressed to a different email",
          ));
        }
        if profile.tenant_id.is_some() {
          return Err(Error::conflict(format!(
            "profile {} already belongs to a tenant",
            profile.id
          )));
        }

        profile.tenant_id = Some(invitation.tenant_id);
        profile.role_code = Some(invitation.role_code);
        profile.approval_status = ApprovalStatus::Approved;
        profile.approved_by = Some(invitation.invited_by.clone());
        profile.approved_at = Some(now);
        profile.updated_at = now;
        tx.update_profile(&profile)?;

        // Guarded flip; losing it rolls back the profile update above.
        if !tx.transition_invitation(
          &token,
          InvitationStatus::Pending,
          InvitationStatus::Accepted,
        )? {
          let status = tx
            .invitation(&token)?
            .map_or(InvitationStatus::Accepted, |i| i.status);
          return Err(Error::AlreadyConsumed { fingerprint: token.fingerprint(), status });
        }

        Ok(profile)
      })
      .await;

    match &result {
      Ok(profile) => info!(
        identity = %profile.id,
        tenant = ?profile.tenant_id,
        role = ?profile.role_code,
        invitation = %fingerprint,
        "accepted invitation"
      ),
      Err(e) if matches!(e.kind(), ErrorKind::AlreadyConsumed | ErrorKind::Conflict) => {
        warn!(invitation = %fingerprint, error = %e, "invitation acceptance refused")
      }
      Err(_) => {}
    }
    result
  }

  /// Issue an invitation on behalf of an approved owner for their tenant.
  pub async fn issue_invitation(
    &self,
    inviter_id: &IdentityId,
    input: NewInvitation,
  ) -> Result<Invitation> {
    let email = normalize_email(&input.email)?;
    if input.role_code == RoleCode::Owner {
      return Err(Error::validation("owners cannot be invited; they onboard themselves"));
    }

    let inviter_id = inviter_id.clone();
    let now = Utc::now();
    let expires_at = now + self.invitation_ttl;

    let invitation = self
      .store
      .transaction(move |tx| {
        let inviter = tx
          .profile(&inviter_id)?
          .ok_or_else(|| Error::not_found("profile", &inviter_id))?;

        let tenant_id = match (inviter.tenant_id, inviter.role_code) {
          (Some(tenant_id), Some(role))
            if role == RoleCode::Owner
              && role.outranks(input.role_code)
              && inviter.approval_status == ApprovalStatus::Approved =>
          {
            tenant_id
          }
          _ => return Err(Error::forbidden("only approved owners may invite staff")),
        };

        let invitation = Invitation {
          token: InvitationToken::generate(),
          tenant_id,
          invited_by: inviter_id.clone(),
          email,
          role_code: input.role_code,
          status: InvitationStatus::Pending,
          expires_at,
          created_at: now,
        };
        tx.insert_invitation(&invitation)?;
        Ok(invitation)
      })
      .await?;

    info!(
      tenant = %invitation.tenant_id,
      role = %invitation.role_code,
      invitation = %invitation.token.fingerprint(),
      "issued invitation"
    );
    Ok(invitation)
  }

  /// Cancel a pending invitation. Only the owner of the invitation's tenant
  /// may do so. An invitation past its expiry is already dead and fails with
  /// `Expired`.
  pub async fn cancel_invitation(
    &self,
    actor_id: &IdentityId,
    raw_token: &str,
  ) -> Result<Invitation> {
    let token = InvitationToken::parse(raw_token)?;
    let actor_id = actor_id.clone();
    let now = Utc::now();

    let invitation = self
      .store
      .transaction(move |tx| {
        let mut invitation = tx
          .invitation(&token)?
          .ok_or_else(|| Error::not_found("invitation", token.fingerprint()))?;

        let actor = tx.profile(&actor_id)?;
        let is_tenant_owner = actor.as_ref().is_some_and(|p| {
          p.is_owner() && p.tenant_id == Some(invitation.tenant_id)
        });
        if !is_tenant_owner {
          return Err(Error::forbidden("only the tenant owner may cancel invitations"));
        }
        if invitation.is_expired_at(now) || invitation.status == InvitationStatus::Expired {
          return Err(Error::Expired(token.fingerprint()));
        }

        if !tx.transition_invitation(
          &token,
          InvitationStatus::Pending,
          InvitationStatus::Cancelled,
        )? {
          return Err(Error::AlreadyConsumed {
            fingerprint: token.fingerprint(),
            status:      invitation.status,
          });
        }

        invitation.status = InvitationStatus::Cancelled;
        Ok(invitation)
      })
      .await?;

    info!(invitation = %invitation.token.fingerprint(), "cancelled invitation");
    Ok(invitation)
  }
}
