//! SQL over `cars`, `customers` and `schedules`.
//!
//! Every function here takes and returns local civil time; the shift to and
//! from the stored representation happens only in this module.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Params};

use crate::civil_time::{self, LocalRange, STORE_FORMAT};
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, Car, Customer};

const BOOKING_SELECT: &str =
    "SELECT s.id, cu.name, cu.phone, cu.cpf, ca.license_plate, ca.model, s.date
     FROM schedules s
     JOIN customers cu ON cu.id = s.customer_id
     JOIN cars ca ON ca.id = s.car_id";

const BOOKING_ORDER: &str = "ORDER BY s.date ASC, s.id ASC";

fn store_text(local: NaiveDateTime) -> String {
    civil_time::to_store(local).format(STORE_FORMAT).to_string()
}

// ── Cars ──

pub fn find_car(conn: &Connection, plate: &str) -> AppResult<Option<Car>> {
    let result = conn.query_row(
        "SELECT id, model, license_plate FROM cars WHERE license_plate = ?1",
        params![plate],
        |row| {
            Ok(Car {
                id: row.get(0)?,
                model: row.get(1)?,
                license_plate: row.get(2)?,
            })
        },
    );

    match result {
        Ok(car) => Ok(Some(car)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn ensure_car(conn: &Connection, plate: &str, model: &str) -> AppResult<Car> {
    conn.execute(
        "INSERT INTO cars (license_plate, model) VALUES (?1, ?2)
         ON CONFLICT(license_plate) DO NOTHING",
        params![plate, model],
    )?;
    find_car(conn, plate)?
        .ok_or_else(|| AppError::Storage(format!("car {plate} vanished after insert")))
}

// ── Customers ──

pub fn find_customer(conn: &Connection, cpf: &str) -> AppResult<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, name, phone, cpf FROM customers WHERE cpf = ?1",
        params![cpf],
        |row| {
            Ok(Customer {
                id: row.get(0)?,
                name: row.get(1)?,
                phone: row.get(2)?,
                cpf: row.get(3)?,
            })
        },
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn ensure_customer(conn: &Connection, cpf: &str, name: &str, phone: &str) -> AppResult<Customer> {
    conn.execute(
        "INSERT INTO customers (cpf, name, phone) VALUES (?1, ?2, ?3)
         ON CONFLICT(cpf) DO NOTHING",
        params![cpf, name, phone],
    )?;
    find_customer(conn, cpf)?
        .ok_or_else(|| AppError::Storage(format!("customer {cpf} vanished after insert")))
}

// ── Schedules ──

pub fn insert_booking(
    conn: &Connection,
    car_id: i64,
    customer_id: i64,
    slot: NaiveDateTime,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO schedules (car_id, customer_id, date) VALUES (?1, ?2, ?3)",
        params![car_id, customer_id, store_text(slot)],
    )
    .map_err(|e| AppError::from_write(e, "Schedule already exists for this date"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> AppResult<Option<Booking>> {
    let mut bookings = query_bookings(conn, "WHERE s.id = ?1", params![id])?;
    Ok(bookings.pop())
}

pub fn get_booking_at(conn: &Connection, slot: NaiveDateTime) -> AppResult<Option<Booking>> {
    let mut bookings = query_bookings(conn, "WHERE s.date = ?1", params![store_text(slot)])?;
    Ok(bookings.pop())
}

pub fn list_bookings(conn: &Connection) -> AppResult<Vec<Booking>> {
    query_bookings(conn, "", params![])
}

pub fn list_bookings_for_car(conn: &Connection, car_id: i64) -> AppResult<Vec<Booking>> {
    query_bookings(conn, "WHERE s.car_id = ?1", params![car_id])
}

pub fn list_bookings_for_customer(conn: &Connection, customer_id: i64) -> AppResult<Vec<Booking>> {
    query_bookings(conn, "WHERE s.customer_id = ?1", params![customer_id])
}

pub fn list_bookings_in_range(conn: &Connection, range: &LocalRange) -> AppResult<Vec<Booking>> {
    query_bookings(
        conn,
        "WHERE s.date >= ?1 AND s.date < ?2",
        params![store_text(range.start), store_text(range.end)],
    )
}

pub fn update_booking(
    conn: &Connection,
    id: i64,
    car_id: i64,
    customer_id: i64,
    slot: NaiveDateTime,
) -> AppResult<bool> {
    let count = conn
        .execute(
            "UPDATE schedules SET car_id = ?1, customer_id = ?2, date = ?3 WHERE id = ?4",
            params![car_id, customer_id, store_text(slot), id],
        )
        .map_err(|e| AppError::from_write(e, "Schedule already exists for this date"))?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: i64) -> AppResult<bool> {
    let count = conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn query_bookings<P: Params>(conn: &Connection, filter: &str, params: P) -> AppResult<Vec<Booking>> {
    let sql = format!("{BOOKING_SELECT} {filter} {BOOKING_ORDER}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let date_str: String = row.get(6)?;
    let stored = NaiveDateTime::parse_from_str(&date_str, STORE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Booking {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        customer_phone: row.get(2)?,
        customer_tax_id: row.get(3)?,
        car_license_plate: row.get(4)?,
        car_model: row.get(5)?,
        slot_date_time: civil_time::from_store(stored),
    })
}
