use dashmap::DashMap;
use salon_client::models::{Appointment, Role, Service, ServiceDraft, User};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use tracing::info;
use uuid::Uuid;

use crate::config::StubConfig;

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Everything the stub keeps, shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<StubConfig>,
    pub users: Arc<DashMap<Uuid, UserRecord>>,
    pub emails: Arc<DashMap<String, Uuid>>,
    pub refresh_tokens: Arc<DashMap<String, Uuid>>,
    pub services: Arc<DashMap<Uuid, Service>>,
    pub appointments: Arc<DashMap<Uuid, Appointment>>,
    token_epoch: Arc<AtomicU64>,
    refresh_calls: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: StubConfig) -> Self {
        AppState {
            config: Arc::new(config),
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
            refresh_tokens: Arc::new(DashMap::new()),
            services: Arc::new(DashMap::new()),
            appointments: Arc::new(DashMap::new()),
            token_epoch: Arc::new(AtomicU64::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn add_service(&self, draft: ServiceDraft) -> Service {
        let service = Service {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            duration_minutes: draft.duration_minutes,
            category: draft.category,
            active: draft.active,
        };
        self.services.insert(service.id, service.clone());
        service
    }

    pub fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let id = *self.emails.get(&email.to_lowercase())?;
        self.users.get(&id).map(|r| r.clone())
    }

    pub fn set_role(&self, email: &str, role: Role) -> bool {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| *id) else {
            return false;
        };
        match self.users.get_mut(&id) {
            Some(mut record) => {
                record.user.role = role;
                true
            }
            None => false,
        }
    }

    pub fn token_epoch(&self) -> u64 {
        self.token_epoch.load(Ordering::SeqCst)
    }

    /// Invalidates every access token issued so far. Refresh tokens stay valid.
    pub fn revoke_access_tokens(&self) {
        let epoch = self.token_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Access tokens revoked, epoch is now {epoch}");
    }

    pub fn record_refresh(&self) {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// How many times `/refresh` has been called.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}
