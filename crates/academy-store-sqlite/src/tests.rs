//! Integration tests for `SqliteStore` against an in-memory database.

use academy_core::{
  identity::{Identity, IdentityId},
  invitation::{Invitation, InvitationStatus, InvitationToken},
  onboarding::{AcademySetup, Onboarding, OwnerOnboarding},
  profile::{ApprovalStatus, Profile, RoleCode},
  stage::StageCode,
  store::OnboardingStore,
  tenant::{AcademySettings, TenantId},
  ErrorKind,
};
use chrono::{Duration, Utc};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn identity(id: &str, email: &str) -> Identity {
  Identity {
    id:              IdentityId::new(id).unwrap(),
    email:           email.into(),
    email_confirmed: true,
  }
}

fn pending_invitation(email: &str, expires_in: Duration) -> Invitation {
  Invitation {
    token:      InvitationToken::generate(),
    tenant_id:  TenantId::new_v4(),
    invited_by: IdentityId::new("owner-1").unwrap(),
    email:      email.into(),
    role_code:  RoleCode::Instructor,
    status:     InvitationStatus::Pending,
    expires_at: Utc::now() + expires_in,
    created_at: Utc::now(),
  }
}

async fn seed(s: &SqliteStore, invitation: &Invitation) {
  let row = invitation.clone();
  s.transaction(move |tx| tx.insert_invitation(&row)).await.unwrap();
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_round_trips() {
  let s = store().await;
  let mut profile = Profile::bootstrap(
    IdentityId::new("u1").unwrap(),
    "jane@x.com".into(),
    Utc::now(),
  );

  let row = profile.clone();
  assert!(s.transaction(move |tx| tx.insert_profile(&row)).await.unwrap());

  profile.name = Some("Jane".into());
  profile.rejection_reason = Some("n/a".into());
  let row = profile.clone();
  s.transaction(move |tx| tx.update_profile(&row)).await.unwrap();

  let id = profile.id.clone();
  let fetched = s.transaction(move |tx| tx.profile(&id)).await.unwrap();
  assert_eq!(fetched, Some(profile));
}

#[tokio::test]
async fn conditional_insert_keeps_the_first_row() {
  let s = store().await;
  let first = Profile::bootstrap(IdentityId::new("u1").unwrap(), "a@x.com".into(), Utc::now());
  let second = Profile { email: "b@x.com".into(), ..first.clone() };

  let row = first.clone();
  assert!(s.transaction(move |tx| tx.insert_profile(&row)).await.unwrap());
  assert!(!s.transaction(move |tx| tx.insert_profile(&second)).await.unwrap());

  let id = first.id.clone();
  let stored = s.transaction(move |tx| tx.profile(&id)).await.unwrap().unwrap();
  assert_eq!(stored.email, "a@x.com");
}

#[tokio::test]
async fn update_of_missing_profile_is_not_found() {
  let s = store().await;
  let ghost = Profile::bootstrap(IdentityId::new("ghost").unwrap(), "g@x.com".into(), Utc::now());
  let err = s
    .transaction(move |tx| tx.update_profile(&ghost))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn invitation_status_swap_is_conditional() {
  let s = store().await;
  let invitation = pending_invitation("staff@x.com", Duration::days(7));
  seed(&s, &invitation).await;

  let token = invitation.token.clone();
  let swapped = s
    .transaction(move |tx| {
      let first = tx.transition_invitation(&token, InvitationStatus::Pending, InvitationStatus::Accepted)?;
      let second = tx.transition_invitation(&token, InvitationStatus::Pending, InvitationStatus::Cancelled)?;
      Ok((first, second))
    })
    .await
    .unwrap();
  assert_eq!(swapped, (true, false));

  let token = invitation.token.clone();
  let stored = s.transaction(move |tx| tx.invitation(&token)).await.unwrap().unwrap();
  assert_eq!(stored.status, InvitationStatus::Accepted);
}

#[tokio::test]
async fn open_invitation_lookup_skips_expired_and_consumed() {
  let s = store().await;
  seed(&s, &pending_invitation("staff@x.com", -Duration::hours(1))).await;
  let mut accepted = pending_invitation("staff@x.com", Duration::days(1));
  accepted.status = InvitationStatus::Accepted;
  seed(&s, &accepted).await;

  let now = Utc::now();
  let found = s
    .transaction(move |tx| tx.open_invitation_for_email("staff@x.com", now))
    .await
    .unwrap();
  assert!(found.is_none());

  let open = pending_invitation("staff@x.com", Duration::days(1));
  seed(&s, &open).await;
  let found = s
    .transaction(move |tx| tx.open_invitation_for_email("staff@x.com", now))
    .await
    .unwrap();
  assert_eq!(found.map(|i| i.token), Some(open.token));
}

#[tokio::test]
async fn failed_closure_rolls_back_every_write() {
  let s = store().await;
  let profile = Profile::bootstrap(IdentityId::new("u1").unwrap(), "a@x.com".into(), Utc::now());

  let row = profile.clone();
  let err = s
    .transaction(move |tx| {
      tx.insert_profile(&row)?;
      Err::<(), _>(academy_core::Error::conflict("abort"))
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let id = profile.id.clone();
  assert!(s.transaction(move |tx| tx.profile(&id)).await.unwrap().is_none());
}

#[tokio::test]
async fn read_rolls_back_and_sees_committed_rows() {
  let s = store().await;
  let profile = Profile::bootstrap(IdentityId::new("u1").unwrap(), "a@x.com".into(), Utc::now());

  let row = profile.clone();
  assert!(s.read(move |tx| tx.insert_profile(&row)).await.unwrap());
  let id = profile.id.clone();
  assert!(s.read(move |tx| tx.profile(&id)).await.unwrap().is_none());

  let row = profile.clone();
  s.transaction(move |tx| tx.insert_profile(&row)).await.unwrap();
  let id = profile.id.clone();
  assert_eq!(s.read(move |tx| tx.profile(&id)).await.unwrap(), Some(profile));
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn owner_scenario_on_sqlite() {
  let engine = Onboarding::new(store().await);
  let u1 = identity("u1", "jane@x.com");

  engine.ensure_profile(&u1).await.unwrap();
  let done = engine
    .complete_owner_onboarding(
      &u1,
      OwnerOnboarding {
        name:         "Jane".into(),
        academy_name: "Jane's Academy".into(),
        slug:         Some("janes-academy".into()),
      },
    )
    .await
    .unwrap();
  assert_eq!(done.tenant.slug.as_deref(), Some("janes-academy"));
  assert_eq!(
    engine.get_stage(Some(&u1)).await.unwrap().code,
    StageCode::OwnerPendingApproval
  );

  engine
    .set_approval_status(
      &u1.id,
      ApprovalStatus::Approved,
      None,
      &IdentityId::new("admin").unwrap(),
    )
    .await
    .unwrap();
  engine
    .complete_academy_setup(
      &u1.id,
      AcademySetup { timezone: "Asia/Seoul".into(), settings: AcademySettings::default() },
    )
    .await
    .unwrap();
  assert!(engine.get_stage(Some(&u1)).await.unwrap().is_ready());

  let tenant_id = done.tenant.id;
  let stored = engine
    .store()
    .transaction(move |tx| tx.tenant(tenant_id))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.owner_id, u1.id);
  assert_eq!(stored.timezone.as_deref(), Some("Asia/Seoul"));

  let err = engine
    .complete_owner_onboarding(
      &u1,
      OwnerOnboarding { name: "Jane".into(), academy_name: "Again".into(), slug: None },
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict_and_leaves_no_profile() {
  let engine = Onboarding::new(store().await);
  let input = || OwnerOnboarding {
    name:         "Owner".into(),
    academy_name: "Academy".into(),
    slug:         Some("same-slug".into()),
  };

  engine
    .complete_owner_onboarding(&identity("u1", "a@x.com"), input())
    .await
    .unwrap();
  let err = engine
    .complete_owner_onboarding(&identity("u2", "b@x.com"), input())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let id = IdentityId::new("u2").unwrap();
  let leftover = engine.store().transaction(move |tx| tx.profile(&id)).await.unwrap();
  assert!(leftover.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bootstrap_on_sqlite() {
  let engine = Onboarding::new(store().await);
  let u1 = identity("u1", "jane@x.com");

  let handles: Vec<_> = (0..12)
    .map(|_| {
      let engine = engine.clone();
      let u1 = u1.clone();
      tokio::spawn(async move { engine.ensure_profile(&u1).await })
    })
    .collect();

  let mut seen = Vec::new();
  for handle in handles {
    seen.push(handle.await.unwrap().unwrap());
  }
  assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_on_sqlite() {
  let engine = Onboarding::new(store().await);
  let invitation = pending_invitation("staff@x.com", Duration::days(7));
  seed(engine.store(), &invitation).await;
  let u2 = identity("u2", "staff@x.com");

  let handles: Vec<_> = (0..12)
    .map(|_| {
      let engine = engine.clone();
      let u2 = u2.clone();
      let token = invitation.token.as_str().to_owned();
      tokio::spawn(async move { engine.accept_invitation(&token, &u2).await })
    })
    .collect();

  let mut wins = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(profile) => {
        wins += 1;
        assert_eq!(profile.tenant_id, Some(invitation.tenant_id));
        assert_eq!(profile.approval_status, ApprovalStatus::Approved);
      }
      Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyConsumed),
    }
  }
  assert_eq!(wins, 1);
}
