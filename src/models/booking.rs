use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::civil_time;
use crate::errors::{AppError, AppResult};

/// A booked slot as returned to callers, `slot_date_time` in local civil time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(rename = "name")]
    pub customer_name: String,
    #[serde(rename = "phone")]
    pub customer_phone: String,
    #[serde(rename = "cpf")]
    pub customer_tax_id: String,
    #[serde(rename = "carLicensePlate")]
    pub car_license_plate: String,
    #[serde(rename = "carModel")]
    pub car_model: String,
    #[serde(rename = "dateTime")]
    pub slot_date_time: NaiveDateTime,
}

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookingRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub phone: String,
    #[validate(length(equal = 11, message = "cpf must have exactly 11 digits"))]
    pub cpf: String,
    #[validate(length(min = 1, message = "carModel must not be empty"))]
    pub car_model: String,
    #[validate(length(equal = 7, message = "carLicensePlate must have exactly 7 characters"))]
    pub car_license_plate: String,
    #[serde(deserialize_with = "civil_time::deserialize_local")]
    pub date_time: NaiveDateTime,
}

impl BookingRequest {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        if !self.cpf.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(
                "cpf must have exactly 11 digits".to_string(),
            ));
        }
        if !is_brazilian_phone(&self.phone) {
            return Err(AppError::InvalidInput(format!(
                "invalid phone number: {}",
                self.phone
            )));
        }
        Ok(())
    }
}

/// Accepts an optional `+55` country prefix, then area code plus 8 or 9 digits.
fn is_brazilian_phone(raw: &str) -> bool {
    if raw
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')')))
    {
        return false;
    }
    if raw.chars().skip(1).any(|c| c == '+') {
        return false;
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        12 | 13 if digits.starts_with("55") => &digits[2..],
        10 | 11 => digits.as_str(),
        _ => return false,
    };

    !national.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_json(plate: &str, cpf: &str, phone: &str) -> String {
        format!(
            r#"{{"name":"Teste","phone":"{phone}","cpf":"{cpf}","carModel":"Gol","carLicensePlate":"{plate}","dateTime":"10/08/2021 10:30"}}"#
        )
    }

    fn parse(json: &str) -> BookingRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let req = parse(&request_json("ABC1234", "12345678900", "+5511999999999"));
        assert!(req.check().is_ok());
        assert_eq!(
            req.date_time,
            NaiveDateTime::parse_from_str("2021-08-10 10:30", "%Y-%m-%d %H:%M").unwrap()
        );
    }

    #[test]
    fn test_plate_length() {
        let req = parse(&request_json("ABC123", "12345678900", "11999999999"));
        assert!(matches!(req.check(), Err(AppError::InvalidInput(_))));
        let req = parse(&request_json("ABC12345", "12345678900", "11999999999"));
        assert!(matches!(req.check(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_cpf_length_and_digits() {
        let req = parse(&request_json("ABC1234", "1234567890", "11999999999"));
        assert!(matches!(req.check(), Err(AppError::InvalidInput(_))));
        let req = parse(&request_json("ABC1234", "1234567890a", "11999999999"));
        assert!(matches!(req.check(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_phone_formats() {
        assert!(is_brazilian_phone("12345678900"));
        assert!(is_brazilian_phone("+55 (11) 99999-9999"));
        assert!(is_brazilian_phone("1133334444"));
        assert!(!is_brazilian_phone("999"));
        assert!(!is_brazilian_phone("0119999999"));
        assert!(!is_brazilian_phone("11-9999-abcd"));
        assert!(!is_brazilian_phone("11+999999999"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"name":"Teste","phone":"11999999999","cpf":"12345678900","carModel":"Gol","carLicensePlate":"ABC1234","dateTime":"10/08/2021 10:30","extra":1}"#;
        assert!(serde_json::from_str::<BookingRequest>(json).is_err());
    }

    #[test]
    fn test_missing_field_rejected() {
        assert!(serde_json::from_str::<BookingRequest>(r#"{"name":"Teste"}"#).is_err());
    }

    #[test]
    fn test_booking_serializes_with_wire_names() {
        let booking = Booking {
            id: 1,
            customer_name: "Teste".to_string(),
            customer_phone: "11999999999".to_string(),
            customer_tax_id: "12345678900".to_string(),
            car_license_plate: "ABC1234".to_string(),
            car_model: "Gol".to_string(),
            slot_date_time: NaiveDateTime::parse_from_str("2021-08-10 10:30", "%Y-%m-%d %H:%M")
                .unwrap(),
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["cpf"], "12345678900");
        assert_eq!(value["carLicensePlate"], "ABC1234");
        assert_eq!(value["dateTime"], "2021-08-10T10:30:00");
    }
}
