use std::collections::HashSet;
use std::sync::Arc;

use chrono::Datelike;

use crate::civil_time::{self, Clock};
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingRequest};
use crate::repository::{NewBooking, ScheduleRepository};
use crate::services::availability::{anchor_date, available_slots};
use crate::services::slots::is_valid_slot;

/// Booking operations exposed to the HTTP layer.
///
/// Identifiers and calendar filters arrive as raw path text and are checked
/// here before anything reaches the repository.
pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
    pub fn new(repo: Arc<dyn ScheduleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn repository(&self) -> &Arc<dyn ScheduleRepository> {
        &self.repo
    }

    pub async fn create(&self, request: BookingRequest) -> AppResult<Booking> {
        request.check()?;
        let slot = request.date_time;

        if self.repo.find_by_slot(slot).await?.is_some() {
            tracing::warn!(%slot, "slot already booked");
            return Err(AppError::Conflict(
                "Schedule already exists for this date".to_string(),
            ));
        }

        if !is_valid_slot(&slot, &self.clock.now()) {
            tracing::warn!(%slot, "rejected slot outside the bookable window");
            return Err(AppError::InvalidInput("Invalid date".to_string()));
        }

        let car = self
            .repo
            .ensure_car(&request.car_license_plate, &request.car_model)
            .await?;
        let customer = self
            .repo
            .ensure_customer(&request.cpf, &request.name, &request.phone)
            .await?;

        let booking = self
            .repo
            .create(NewBooking {
                car_id: car.id,
                customer_id: customer.id,
                slot,
            })
            .await?;

        tracing::info!(id = booking.id, slot = %booking.slot_date_time, "schedule created");
        Ok(booking)
    }

    pub async fn get(&self, raw_id: &str) -> AppResult<Booking> {
        let id = parse_id(raw_id)?;
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Booking>> {
        self.repo.get_all().await
    }

    pub async fn list_by_license_plate(&self, plate: &str) -> AppResult<Vec<Booking>> {
        self.repo.get_by_license_plate(plate).await
    }

    pub async fn list_by_cpf(&self, cpf: &str) -> AppResult<Vec<Booking>> {
        self.repo.get_by_tax_id(cpf).await
    }

    pub async fn list_by_month(&self, raw_month: &str) -> AppResult<Vec<Booking>> {
        let month = parse_month(raw_month)?;
        let year = self.clock.now().year();
        self.repo.get_by_month(month, year).await
    }

    pub async fn list_by_week(&self, raw_week: &str, raw_month: &str) -> AppResult<Vec<Booking>> {
        let week = parse_in_range(raw_week, 1, 5, "week")?;
        let month = parse_month(raw_month)?;
        let year = self.clock.now().year();
        self.repo.get_by_week(week, month, year).await
    }

    pub async fn list_by_day(&self, raw_day: &str, raw_month: &str) -> AppResult<Vec<Booking>> {
        let month = parse_month(raw_month)?;
        let year = self.clock.now().year();
        let last_day = civil_time::days_in_month(year, month)
            .ok_or_else(|| AppError::InvalidInput("Invalid month".to_string()))?;
        let day = parse_in_range(raw_day, 1, last_day, "day")?;
        self.repo.get_by_day(day, month, year).await
    }

    /// Replaces the slot and the car/customer references of a booking.
    /// The car and customer must already exist.
    pub async fn update(&self, raw_id: &str, request: BookingRequest) -> AppResult<()> {
        let id = parse_id(raw_id)?;
        request.check()?;

        let car = self
            .repo
            .find_car(&request.car_license_plate)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;
        let customer = self
            .repo
            .find_customer(&request.cpf)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        self.repo
            .update(
                id,
                NewBooking {
                    car_id: car.id,
                    customer_id: customer.id,
                    slot: request.date_time,
                },
            )
            .await?;

        tracing::info!(id, slot = %request.date_time, "schedule updated");
        Ok(())
    }

    pub async fn delete(&self, raw_id: &str) -> AppResult<()> {
        let id = parse_id(raw_id)?;
        self.repo.delete(id).await?;
        tracing::info!(id, "schedule deleted");
        Ok(())
    }

    /// Free slots for the rest of the month, rendered as `dd/mm/yyyy, hh:mm`.
    pub async fn available_days(&self) -> AppResult<Vec<String>> {
        let now = self.clock.now();
        let anchor = anchor_date(&now);

        let booked: HashSet<_> = self
            .repo
            .get_by_month(anchor.month(), anchor.year())
            .await?
            .into_iter()
            .map(|b| b.slot_date_time)
            .collect();

        Ok(available_slots(&now, &booked)
            .iter()
            .map(civil_time::format_local)
            .collect())
    }
}

fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::InvalidInput("Invalid schedule id".to_string())),
    }
}

fn parse_month(raw: &str) -> AppResult<u32> {
    parse_in_range(raw, 1, 12, "month")
}

fn parse_in_range(raw: &str, min: u32, max: u32, what: &str) -> AppResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(value) if (min..=max).contains(&value) => Ok(value),
        _ => Err(AppError::InvalidInput(format!("Invalid {what}"))),
    }
}
