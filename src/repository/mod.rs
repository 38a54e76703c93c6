pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::models::{Booking, Car, Customer};

pub use sqlite::SqliteScheduleRepository;

/// Row-level input for create and update; `slot` is local civil time.
#[derive(Debug, Clone, Copy)]
pub struct NewBooking {
    pub car_id: i64,
    pub customer_id: i64,
    pub slot: NaiveDateTime,
}

/// Durable storage for bookings and the cars/customers they reference.
///
/// Implementations own the UNIQUE constraint on the booking slot and report
/// a violation as `AppError::Conflict`.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Returns the car with this plate, inserting it first if absent.
    async fn ensure_car(&self, plate: &str, model: &str) -> AppResult<Car>;

    /// Returns the customer with this CPF, inserting it first if absent.
    async fn ensure_customer(&self, cpf: &str, name: &str, phone: &str) -> AppResult<Customer>;

    async fn find_car(&self, plate: &str) -> AppResult<Option<Car>>;

    async fn find_customer(&self, cpf: &str) -> AppResult<Option<Customer>>;

    async fn find_by_slot(&self, slot: NaiveDateTime) -> AppResult<Option<Booking>>;

    async fn create(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn get_by_id(&self, id: i64) -> AppResult<Booking>;

    async fn get_all(&self) -> AppResult<Vec<Booking>>;

    async fn get_by_license_plate(&self, plate: &str) -> AppResult<Vec<Booking>>;

    async fn get_by_tax_id(&self, cpf: &str) -> AppResult<Vec<Booking>>;

    async fn get_by_month(&self, month: u32, year: i32) -> AppResult<Vec<Booking>>;

    async fn get_by_week(&self, week: u32, month: u32, year: i32) -> AppResult<Vec<Booking>>;

    async fn get_by_day(&self, day: u32, month: u32, year: i32) -> AppResult<Vec<Booking>>;

    async fn update(&self, id: i64, booking: NewBooking) -> AppResult<()>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    /// Releases the underlying store; later calls fail.
    async fn close(&self) -> AppResult<()>;
}

/// Opens the store named by `DATABASE_PROVIDER`.
pub fn connect(config: &AppConfig) -> anyhow::Result<Arc<dyn ScheduleRepository>> {
    match config.database_provider.as_str() {
        "sqlite" => {
            tracing::info!("using SQLite schedule store (path: {})", config.database_url);
            let repo = SqliteScheduleRepository::open(&config.database_url)?;
            Ok(Arc::new(repo))
        }
        other => anyhow::bail!("unsupported DATABASE_PROVIDER: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> AppConfig {
        AppConfig {
            port: 8080,
            database_provider: provider.to_string(),
            database_url: ":memory:".to_string(),
            manager_token: "test-token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connect_sqlite() {
        let repo = connect(&config("sqlite")).unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_connect_unknown_provider() {
        assert!(connect(&config("mongodb")).is_err());
    }
}
