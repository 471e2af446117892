pub mod appointment_handlers;
pub mod auth_handlers;
pub mod catalog_handlers;
pub mod jwt;
