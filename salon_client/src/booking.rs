//! Step-by-step appointment booking: service, then staff, then slot, then confirm.
//!
//! Picking something at an earlier step again throws away the later picks,
//! since a different service or stylist invalidates the chosen slot.

use chrono::{DateTime, Utc};

use crate::error::{ApiResult, ClientError};
use crate::models::{Appointment, AvailabilitySlot, BookingRequest, Service, Staff};
use crate::services::AppointmentApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingStep {
    SelectService,
    SelectStaff,
    SelectSlot,
    Confirm,
}

#[derive(Debug, Clone, Default)]
pub struct BookingWizard {
    service: Option<Service>,
    staff: Option<Staff>,
    slot: Option<AvailabilitySlot>,
    notes: Option<String>,
}

impl BookingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> BookingStep {
        match (&self.service, &self.staff, &self.slot) {
            (None, _, _) => BookingStep::SelectService,
            (Some(_), None, _) => BookingStep::SelectStaff,
            (Some(_), Some(_), None) => BookingStep::SelectSlot,
            (Some(_), Some(_), Some(_)) => BookingStep::Confirm,
        }
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn staff(&self) -> Option<&Staff> {
        self.staff.as_ref()
    }

    pub fn slot(&self) -> Option<&AvailabilitySlot> {
        self.slot.as_ref()
    }

    pub fn choose_service(&mut self, service: Service) -> ApiResult<()> {
        if !service.active {
            return Err(booking_error(format!("{} is not currently offered", service.name)));
        }
        self.service = Some(service);
        self.staff = None;
        self.slot = None;
        Ok(())
    }

    pub fn choose_staff(&mut self, staff: Staff) -> ApiResult<()> {
        if self.service.is_none() {
            return Err(booking_error("choose a service first"));
        }
        if !staff.active {
            return Err(booking_error(format!("{} is not taking bookings", staff.name)));
        }
        self.staff = Some(staff);
        self.slot = None;
        Ok(())
    }

    pub fn choose_slot(&mut self, slot: AvailabilitySlot, now: DateTime<Utc>) -> ApiResult<()> {
        let Some(staff) = &self.staff else {
            return Err(booking_error("choose a staff member first"));
        };
        if slot.staff_id != staff.id {
            return Err(booking_error(format!("that slot does not belong to {}", staff.name)));
        }
        if !slot.is_available {
            return Err(booking_error("that slot is no longer available"));
        }
        if slot.start_time <= now {
            return Err(booking_error("that slot has already started"));
        }
        self.slot = Some(slot);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    }

    /// Steps back once, forgetting the most recent choice.
    pub fn back(&mut self) {
        match self.step() {
            BookingStep::Confirm => self.slot = None,
            BookingStep::SelectSlot => self.staff = None,
            BookingStep::SelectStaff => self.service = None,
            BookingStep::SelectService => {}
        }
    }

    /// The request to send, available only once every choice is made.
    pub fn request(&self) -> ApiResult<BookingRequest> {
        match (&self.service, &self.staff, &self.slot) {
            (Some(service), Some(staff), Some(slot)) => Ok(BookingRequest {
                service_id: service.id,
                staff_id: staff.id,
                slot_id: Some(slot.id),
                start_time: slot.start_time,
                notes: self.notes.clone(),
            }),
            _ => Err(booking_error("booking is not complete yet")),
        }
    }

    pub async fn submit(&self, appointments: &AppointmentApi) -> ApiResult<Appointment> {
        let request = self.request()?;
        appointments.book(&request).await
    }
}

fn booking_error(message: impl Into<String>) -> ClientError {
    ClientError::Booking(message.into())
}
