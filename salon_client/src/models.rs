//! Request and response shapes of the remote services.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued on login. `refresh_expires_in` is accepted but not trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

/// Create/update payload for a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "active_by_default")]
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

fn active_by_default() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Whether the appointment can still change.
    pub fn is_open(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(format!("unknown appointment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub service_id: Uuid,
    pub staff_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

/// Admin listing filters; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
}

impl AppointmentFilter {
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.to_string()));
        }
        if let Some(date) = self.date {
            query.push(("date".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(staff_id) = self.staff_id {
            query.push(("staff_id".to_string(), staff_id.to_string()));
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// 1-based page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn previous(self) -> Self {
        Self {
            page: self.page.saturating_sub(1).max(1),
            ..self
        }
    }

    pub fn query(&self) -> [(String, String); 2] {
        [
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn query(&self) -> [(String, String); 2] {
        [
            ("start".to_string(), self.start.format("%Y-%m-%d").to_string()),
            ("end".to_string(), self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: f64,
    #[serde(default)]
    pub appointments: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_revenue: f64,
    pub appointment_count: u32,
    pub average_ticket: f64,
    #[serde(default)]
    pub daily: Vec<RevenuePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePopularity {
    pub service_id: Uuid,
    pub service_name: String,
    pub bookings: u32,
    #[serde(default)]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffPerformance {
    pub staff_id: Uuid,
    pub staff_name: String,
    pub appointments: u32,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsights {
    #[serde(default)]
    pub busiest_day: Option<String>,
    #[serde(default)]
    pub busiest_hour: Option<u8>,
    #[serde(default)]
    pub repeat_customer_rate: f64,
    #[serde(default)]
    pub cancellation_rate: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_arithmetic() {
        let page: Page<u8> = Page {
            items: vec![],
            total: 21,
            page: 2,
            limit: 10,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = Page { page: 3, ..page };
        assert!(!last.has_next());
    }

    #[test]
    fn page_request_stays_in_bounds() {
        let request = PageRequest::new(0, 500);
        assert_eq!(request, PageRequest { page: 1, limit: 100 });
        assert_eq!(request.previous().page, 1);
        assert_eq!(request.next().page, 2);
    }

    #[test]
    fn status_parses_loose_spellings() {
        assert_eq!("Canceled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert_eq!("no-show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert!("lost".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn filter_only_sends_set_fields() {
        let filter = AppointmentFilter {
            status: Some(AppointmentStatus::Confirmed),
            date: NaiveDate::from_ymd_opt(2025, 3, 14),
            staff_id: None,
        };
        assert_eq!(
            filter.query(),
            vec![
                ("status".to_string(), "confirmed".to_string()),
                ("date".to_string(), "2025-03-14".to_string()),
            ]
        );
    }

    #[test]
    fn token_response_tolerates_missing_optionals() {
        let parsed: TokenResponse =
            serde_json::from_value(json!({ "access_token": "a", "refresh_token": "r" })).unwrap();
        assert_eq!(parsed.expires_in, None);
        assert_eq!(parsed.refresh_expires_in, None);
    }

    #[test]
    fn service_defaults_to_active() {
        let service: Service = serde_json::from_value(json!({
            "id": "6f1c1f0e-8a53-4b61-9d8e-0f1b2c3d4e5f",
            "name": "Balayage",
            "price": 120.0,
            "duration_minutes": 150
        }))
        .unwrap();
        assert!(service.active);
        assert_eq!(service.category, None);
    }
}
