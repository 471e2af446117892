use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::{Duration, Utc};
use salon_client::models::{Appointment, AppointmentStatus, BookingRequest, Page, StatusUpdate};
use tracing::info;
use uuid::Uuid;

use super::catalog_handlers::{paginate, PageQuery};
use crate::error::AppError;
use crate::middleware::auth_middleware::CurrentUser;
use crate::state::AppState;

pub async fn book(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let service = state
        .services
        .get(&payload.service_id)
        .map(|s| s.clone())
        .ok_or_else(|| AppError::NotFound("Service not found".into()))?;
    if !service.active {
        return Err(AppError::BadRequest(format!("{} is not currently offered", service.name)));
    }
    if payload.start_time <= Utc::now() {
        return Err(AppError::BadRequest("Appointments must be in the future".into()));
    }

    let taken = state.appointments.iter().any(|a| {
        a.staff_id == payload.staff_id && a.start_time == payload.start_time && a.status.is_open()
    });
    if taken {
        return Err(AppError::Conflict("That slot is already booked".into()));
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        customer_id: user.id,
        service_id: service.id,
        staff_id: payload.staff_id,
        start_time: payload.start_time,
        end_time: Some(payload.start_time + Duration::minutes(service.duration_minutes as i64)),
        status: AppointmentStatus::Pending,
        notes: payload.notes,
        created_at: Some(Utc::now()),
    };
    state.appointments.insert(appointment.id, appointment.clone());
    info!("{} booked {} at {}", user.email, service.name, appointment.start_time);

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn my_appointments(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Json<Page<Appointment>> {
    let mut mine: Vec<Appointment> = state
        .appointments
        .iter()
        .filter(|a| a.customer_id == user.id)
        .map(|a| a.value().clone())
        .collect();
    mine.sort_by_key(|a| a.start_time);
    Json(paginate(mine, &query))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .appointments
        .get(&id)
        .map(|a| a.clone())
        .filter(|a| a.customer_id == user.id || user.role.is_admin())
        .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;
    Ok(Json(appointment))
}

/// Admins may set any status; customers may only cancel their own open bookings.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<Appointment>, AppError> {
    let mut appointment = state
        .appointments
        .get_mut(&id)
        .filter(|a| a.customer_id == user.id || user.role.is_admin())
        .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;

    if !user.role.is_admin() {
        if payload.status != AppointmentStatus::Cancelled {
            return Err(AppError::Forbidden("Customers can only cancel appointments".into()));
        }
        if !appointment.status.is_open() {
            return Err(AppError::BadRequest(format!(
                "Appointment is already {}",
                appointment.status
            )));
        }
    }

    appointment.status = payload.status;
    info!("Appointment {id} is now {}", payload.status);
    Ok(Json(appointment.clone()))
}
