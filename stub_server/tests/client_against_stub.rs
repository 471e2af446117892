use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

use salon_client::booking::BookingWizard;
use salon_client::clock::{Clock, ManualClock};
use salon_client::models::{
    AppointmentStatus, AvailabilitySlot, LoginRequest, PageRequest, RegisterRequest, Role,
    ServiceDraft, Staff,
};
use salon_client::storage::MemoryStorage;
use salon_client::{ClientConfig, ClientError, SalonContext};
use stub_server::{config::StubConfig, state::AppState};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "lovelace1815";

async fn start_stub() -> (AppState, Url) {
    let state = AppState::new(StubConfig::for_tests());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    tokio::spawn(stub_server::serve(listener, state.clone()));
    (state, base)
}

fn context(base: &Url, clock: &ManualClock) -> SalonContext {
    let config = ClientConfig {
        user_service: base.clone(),
        catalog_service: base.clone(),
        staff_service: base.clone(),
        appointment_service: base.clone(),
        analytics_service: base.clone(),
        notification_service: None,
        request_timeout: Duration::from_secs(5),
        session_file: PathBuf::from("unused.json"),
    };
    SalonContext::new(config, Arc::new(MemoryStorage::new()), Arc::new(clock.clone())).unwrap()
}

async fn signed_in(base: &Url, clock: &ManualClock) -> SalonContext {
    let ctx = context(base, clock);
    ctx.users
        .register(&RegisterRequest {
            name: "Ada".into(),
            email: EMAIL.into(),
            password: PASSWORD.into(),
            phone: None,
        })
        .await
        .unwrap();
    ctx.users
        .login(&LoginRequest {
            email: EMAIL.into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    ctx
}

fn stylist() -> Staff {
    Staff {
        id: Uuid::new_v4(),
        name: "Mira".into(),
        email: None,
        phone: None,
        specialties: vec!["Hair".into()],
        active: true,
    }
}

#[tokio::test]
async fn booking_flow_refreshes_before_the_token_lapses() {
    let (state, base) = start_stub().await;
    state.add_service(ServiceDraft {
        name: "Haircut".into(),
        description: None,
        price: 35.0,
        duration_minutes: 45,
        category: Some("Hair".into()),
        active: true,
    });

    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;
    let logged_in_at = clock.now_ms();
    let refresh_deadline = ctx.tokens().refresh_expires_at().unwrap();
    assert_eq!(ctx.tokens().access_expires_at(), Some(logged_in_at + 900_000));

    // 30 seconds of access left, inside the near-expiry threshold
    clock.advance(Duration::from_secs(870));
    let before = ctx.tokens().access();

    let services = ctx.catalog.list(PageRequest::default()).await.unwrap();
    assert_eq!(services.total, 1);
    assert_eq!(state.refresh_calls(), 1);
    assert_ne!(ctx.tokens().access(), before);
    assert_eq!(ctx.tokens().access_expires_at(), Some(clock.now_ms() + 900_000));
    assert_eq!(ctx.tokens().refresh_expires_at(), Some(refresh_deadline));

    let staff = stylist();
    let start = Utc::now() + ChronoDuration::days(1);
    let slot = AvailabilitySlot {
        id: Uuid::new_v4(),
        staff_id: staff.id,
        start_time: start,
        end_time: start + ChronoDuration::minutes(45),
        is_available: true,
    };

    let mut wizard = BookingWizard::new();
    wizard.choose_service(services.items[0].clone()).unwrap();
    wizard.choose_staff(staff).unwrap();
    wizard.choose_slot(slot, Utc::now()).unwrap();
    wizard.set_notes(Some("first visit".into()));

    // Near expiry again, so the booking call itself carries the refresh
    let expires_at = ctx.tokens().access_expires_at().unwrap();
    clock.set(expires_at - 30_000);
    let stale = ctx.tokens().access();

    let booked = wizard.submit(&ctx.appointments).await.unwrap();
    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(booked.end_time, Some(start + ChronoDuration::minutes(45)));
    assert_eq!(state.refresh_calls(), 2);
    assert_ne!(ctx.tokens().access(), stale);
    assert_eq!(ctx.tokens().access_expires_at(), Some(clock.now_ms() + 900_000));
    assert_eq!(ctx.tokens().refresh_expires_at(), Some(refresh_deadline));

    let again = wizard.submit(&ctx.appointments).await.unwrap_err();
    assert_eq!(again.status().map(|s| s.as_u16()), Some(409));
    assert_eq!(again.user_message(), "That slot is already booked");

    let mine = ctx.appointments.mine(PageRequest::default()).await.unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].notes.as_deref(), Some("first visit"));

    let cancelled = ctx.appointments.cancel(booked.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(state.refresh_calls(), 2);
}

#[tokio::test]
async fn revoked_token_is_recovered_with_one_refresh() {
    let (state, base) = start_stub().await;
    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;
    let original = ctx.tokens().access();

    state.revoke_access_tokens();
    let profile = ctx.users.profile().await.unwrap();

    assert_eq!(profile.email, EMAIL);
    assert_eq!(state.refresh_calls(), 1);
    assert_ne!(ctx.tokens().access(), original);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let (state, base) = start_stub().await;
    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;

    state.revoke_access_tokens();
    let results = join_all((0..4).map(|_| ctx.users.profile())).await;

    assert!(results.iter().all(|r| r.is_ok()), "{results:?}");
    assert_eq!(state.refresh_calls(), 1);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let (state, base) = start_stub().await;
    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;

    state.revoke_access_tokens();
    state.refresh_tokens.clear();

    let err = ctx.users.profile().await.unwrap_err();
    assert!(err.is_unauthorized(), "{err}");
    assert_eq!(state.refresh_calls(), 1);
    assert!(!ctx.tokens().has_session());
}

#[tokio::test]
async fn lapsed_refresh_window_logs_out_without_a_network_call() {
    let (state, base) = start_stub().await;
    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;

    clock.advance(Duration::from_secs(24 * 60 * 60 + 1));

    let err = ctx.users.profile().await.unwrap_err();
    assert!(err.is_unauthorized(), "{err}");
    assert_eq!(state.refresh_calls(), 0);
    assert!(!ctx.users.is_logged_in());
}

#[tokio::test]
async fn only_admins_move_appointments_beyond_cancelled() {
    let (state, base) = start_stub().await;
    let service = state.add_service(ServiceDraft {
        name: "Brow shaping".into(),
        description: None,
        price: 20.0,
        duration_minutes: 20,
        category: None,
        active: true,
    });
    let clock = ManualClock::starting_now();
    let ctx = signed_in(&base, &clock).await;

    let staff = stylist();
    let start = Utc::now() + ChronoDuration::hours(5);
    let mut wizard = BookingWizard::new();
    wizard.choose_service(service).unwrap();
    wizard.choose_staff(staff.clone()).unwrap();
    wizard
        .choose_slot(
            AvailabilitySlot {
                id: Uuid::new_v4(),
                staff_id: staff.id,
                start_time: start,
                end_time: start + ChronoDuration::minutes(20),
                is_available: true,
            },
            Utc::now(),
        )
        .unwrap();
    let booked = wizard.submit(&ctx.appointments).await.unwrap();

    let denied = ctx
        .appointments
        .update_status(booked.id, AppointmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(denied, ClientError::Http { .. }));
    assert_eq!(denied.status().map(|s| s.as_u16()), Some(403));

    assert!(state.set_role(EMAIL, Role::Admin));
    let done = ctx
        .appointments
        .update_status(booked.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);
}
