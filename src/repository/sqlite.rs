use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::Connection;

use super::{NewBooking, ScheduleRepository};
use crate::civil_time::{self, LocalRange};
use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, Car, Customer};

pub struct SqliteScheduleRepository {
    conn: Mutex<Option<Connection>>,
}

impl SqliteScheduleRepository {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| AppError::Storage("connection lock poisoned".to_string()))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| AppError::Storage("connection closed".to_string()))?;
        f(conn)
    }

    fn in_range(&self, range: Option<LocalRange>, what: &str) -> AppResult<Vec<Booking>> {
        let range = range.ok_or_else(|| AppError::InvalidInput(format!("Invalid {what}")))?;
        self.with_conn(|conn| queries::list_bookings_in_range(conn, &range))
    }
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn ensure_car(&self, plate: &str, model: &str) -> AppResult<Car> {
        self.with_conn(|conn| queries::ensure_car(conn, plate, model))
    }

    async fn ensure_customer(&self, cpf: &str, name: &str, phone: &str) -> AppResult<Customer> {
        self.with_conn(|conn| queries::ensure_customer(conn, cpf, name, phone))
    }

    async fn find_car(&self, plate: &str) -> AppResult<Option<Car>> {
        self.with_conn(|conn| queries::find_car(conn, plate))
    }

    async fn find_customer(&self, cpf: &str) -> AppResult<Option<Customer>> {
        self.with_conn(|conn| queries::find_customer(conn, cpf))
    }

    async fn find_by_slot(&self, slot: NaiveDateTime) -> AppResult<Option<Booking>> {
        self.with_conn(|conn| queries::get_booking_at(conn, slot))
    }

    async fn create(&self, booking: NewBooking) -> AppResult<Booking> {
        self.with_conn(|conn| {
            let id = queries::insert_booking(conn, booking.car_id, booking.customer_id, booking.slot)?;
            queries::get_booking(conn, id)?
                .ok_or_else(|| AppError::Storage(format!("schedule {id} vanished after insert")))
        })
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Booking> {
        self.with_conn(|conn| queries::get_booking(conn, id))?
            .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))
    }

    async fn get_all(&self) -> AppResult<Vec<Booking>> {
        self.with_conn(queries::list_bookings)
    }

    async fn get_by_license_plate(&self, plate: &str) -> AppResult<Vec<Booking>> {
        self.with_conn(|conn| {
            let car = queries::find_car(conn, plate)?
                .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;
            queries::list_bookings_for_car(conn, car.id)
        })
    }

    async fn get_by_tax_id(&self, cpf: &str) -> AppResult<Vec<Booking>> {
        self.with_conn(|conn| {
            let customer = queries::find_customer(conn, cpf)?
                .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
            queries::list_bookings_for_customer(conn, customer.id)
        })
    }

    async fn get_by_month(&self, month: u32, year: i32) -> AppResult<Vec<Booking>> {
        self.in_range(civil_time::month_range(year, month), "month")
    }

    async fn get_by_week(&self, week: u32, month: u32, year: i32) -> AppResult<Vec<Booking>> {
        self.in_range(civil_time::week_range(year, month, week), "week")
    }

    async fn get_by_day(&self, day: u32, month: u32, year: i32) -> AppResult<Vec<Booking>> {
        self.in_range(civil_time::day_range(year, month, day), "day")
    }

    async fn update(&self, id: i64, booking: NewBooking) -> AppResult<()> {
        let updated = self.with_conn(|conn| {
            queries::update_booking(conn, id, booking.car_id, booking.customer_id, booking.slot)
        })?;
        if !updated {
            return Err(AppError::NotFound("Schedule not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let deleted = self.with_conn(|conn| queries::delete_booking(conn, id))?;
        if !deleted {
            return Err(AppError::NotFound("Schedule not found".to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Storage("connection lock poisoned".to_string()))?
            .take();

        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| AppError::Database(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    async fn seeded() -> (SqliteScheduleRepository, NewBooking) {
        let repo = SqliteScheduleRepository::open(":memory:").unwrap();
        let car = repo.ensure_car("ABC1234", "Gol").await.unwrap();
        let customer = repo
            .ensure_customer("12345678900", "Teste", "11999999999")
            .await
            .unwrap();
        let booking = NewBooking {
            car_id: car.id,
            customer_id: customer.id,
            slot: dt("2021-08-10 10:30"),
        };
        (repo, booking)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, new) = seeded().await;
        let created = repo.create(new).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.slot_date_time, dt("2021-08-10 10:30"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (repo, _) = seeded().await;
        assert!(matches!(repo.get_by_id(999999).await, Err(AppError::NotFound(_))));
        assert!(matches!(repo.delete(999999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_unknown_plate_or_cpf() {
        let (repo, _) = seeded().await;
        assert!(matches!(
            repo.get_by_license_plate("ZZZ9999").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.get_by_tax_id("00000000000").await,
            Err(AppError::NotFound(_))
        ));
        // known car, no bookings yet
        assert!(repo.get_by_license_plate("ABC1234").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_week_and_day_queries() {
        let (repo, new) = seeded().await;
        repo.create(new).await.unwrap();
        repo.create(NewBooking {
            slot: dt("2021-08-17 09:00"),
            ..new
        })
        .await
        .unwrap();

        // 10th falls in the second week of August 2021 (week 1 starts Monday the 2nd)
        assert_eq!(repo.get_by_week(2, 8, 2021).await.unwrap().len(), 1);
        assert_eq!(repo.get_by_week(3, 8, 2021).await.unwrap().len(), 1);
        assert!(repo.get_by_week(1, 8, 2021).await.unwrap().is_empty());
        assert_eq!(repo.get_by_day(17, 8, 2021).await.unwrap().len(), 1);
        assert_eq!(repo.get_by_month(8, 2021).await.unwrap().len(), 2);
        assert!(repo.get_by_month(8, 2022).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_ends_lifecycle() {
        let (repo, _) = seeded().await;
        repo.close().await.unwrap();
        assert!(matches!(repo.get_all().await, Err(AppError::Storage(_))));
        repo.close().await.unwrap();
    }
}
