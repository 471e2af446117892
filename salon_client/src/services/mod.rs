//! Thin typed wrappers, one per remote service.

pub mod analytics;
pub mod appointments;
pub mod catalog;
pub mod staff;
pub mod users;

pub use analytics::AnalyticsApi;
pub use appointments::AppointmentApi;
pub use catalog::CatalogApi;
pub use staff::StaffApi;
pub use users::UserApi;
