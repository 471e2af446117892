//! Client-side form checks, run before anything is sent.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ApiResult, ClientError, FieldError};
use crate::models::{
    LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest, ServiceDraft, SlotDraft,
    StaffDraft,
};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("phone pattern"));

const MAX_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_DURATION_MINUTES: u32 = 5;
const MAX_DURATION_MINUTES: u32 = 480;

/// Accumulates field failures and turns them into one error.
#[derive(Debug, Default)]
struct Checks(Vec<FieldError>);

impl Checks {
    fn fail(&mut self, field: &str, message: &str) {
        self.0.push(FieldError::new(field, message));
    }

    fn name(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.fail(field, "is required");
        } else if value.chars().count() > MAX_NAME_LEN {
            self.fail(field, "must be at most 100 characters");
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.fail(field, "is required");
        } else if !EMAIL.is_match(value.trim()) {
            self.fail(field, "is not a valid email address");
        }
    }

    fn password(&mut self, field: &str, value: &str) {
        if value.chars().count() < MIN_PASSWORD_LEN {
            self.fail(field, "must be at least 8 characters");
        } else if !value.chars().any(|c| c.is_alphabetic()) || !value.chars().any(|c| c.is_ascii_digit()) {
            self.fail(field, "must contain a letter and a digit");
        }
    }

    fn phone(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        let digits = value.chars().filter(char::is_ascii_digit).count();
        if !PHONE_CHARS.is_match(value) || !(7..=15).contains(&digits) {
            self.fail(field, "is not a valid phone number");
        }
    }

    fn finish(self) -> ApiResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self.0))
        }
    }
}

pub fn validate_registration(request: &RegisterRequest) -> ApiResult<()> {
    let mut checks = Checks::default();
    checks.name("name", &request.name);
    checks.email("email", &request.email);
    checks.password("password", &request.password);
    checks.phone("phone", request.phone.as_deref());
    checks.finish()
}

pub fn validate_login(request: &LoginRequest) -> ApiResult<()> {
    let mut checks = Checks::default();
    checks.email("email", &request.email);
    if request.password.is_empty() {
        checks.fail("password", "is required");
    }
    checks.finish()
}

pub fn validate_profile_update(update: &ProfileUpdate) -> ApiResult<()> {
    let mut checks = Checks::default();
    if let Some(name) = &update.name {
        checks.name("name", name);
    }
    checks.phone("phone", update.phone.as_deref());
    checks.finish()
}

pub fn validate_password_change(change: &PasswordChange) -> ApiResult<()> {
    let mut checks = Checks::default();
    if change.current_password.is_empty() {
        checks.fail("current_password", "is required");
    }
    checks.password("new_password", &change.new_password);
    if !change.current_password.is_empty() && change.current_password == change.new_password {
        checks.fail("new_password", "must differ from the current password");
    }
    checks.finish()
}

impl ServiceDraft {
    pub fn validate(&self) -> ApiResult<()> {
        let mut checks = Checks::default();
        checks.name("name", &self.name);
        if !(self.price.is_finite() && self.price > 0.0) {
            checks.fail("price", "must be greater than zero");
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            checks.fail("duration_minutes", "must be between 5 and 480 minutes");
        }
        checks.finish()
    }
}

impl StaffDraft {
    pub fn validate(&self) -> ApiResult<()> {
        let mut checks = Checks::default();
        checks.name("name", &self.name);
        if let Some(email) = &self.email {
            checks.email("email", email);
        }
        checks.phone("phone", self.phone.as_deref());
        checks.finish()
    }
}

impl SlotDraft {
    pub fn validate(&self) -> ApiResult<()> {
        let mut checks = Checks::default();
        if self.end_time <= self.start_time {
            checks.fail("end_time", "must be after the start time");
        }
        checks.finish()
    }
}
