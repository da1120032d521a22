use crate::schema::{appointment_options, bookings, users};
use chrono::NaiveDate;
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref PHONE_NUMBER: Regex = Regex::new(r"^\+?[0-9][0-9 ()-]{5,19}$").unwrap();
}

/// Emails are compared case-insensitively, so they are stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A treatment together with the slots that can be booked for it.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, QueryableByName, Selectable, Insertable,
)]
#[diesel(table_name = appointment_options, check_for_backend(diesel::pg::Pg))]
pub struct AppointmentOption {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub slots: Vec<String>,
}

impl AppointmentOption {
    pub fn new(name: &str, slots: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slots: slots.iter().map(|slot| slot.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings, check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub appointment_date: NaiveDate,
    pub treatment: String,
    pub slot: String,
    pub patient: Option<String>,
    pub phone: Option<String>,
}

/// Booking as submitted by a client. Becomes a [`Booking`] once it gets an id.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBooking {
    #[validate(email)]
    pub email: String,
    pub appointment_date: NaiveDate,
    #[validate(length(min = 1, max = 100))]
    pub treatment: String,
    #[validate(length(min = 1, max = 50))]
    pub slot: String,
    #[validate(length(min = 1, max = 100))]
    pub patient: Option<String>,
    #[validate(regex(path = *PHONE_NUMBER))]
    pub phone: Option<String>,
}

impl NewBooking {
    pub fn into_booking(self) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            email: normalize_email(&self.email),
            appointment_date: self.appointment_date,
            treatment: self.treatment,
            slot: self.slot,
            patient: self.patient,
            phone: self.phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = users, check_for_backend(diesel::pg::Pg))]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: normalize_email(&self.email),
            name: self.name,
        }
    }
}

/// Response body of a write. `acknowledged` is false when the write was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Acknowledgement {
    Inserted {
        acknowledged: bool,
        #[serde(rename = "insertedId")]
        inserted_id: Uuid,
    },
    Rejected {
        acknowledged: bool,
        message: String,
    },
}

impl Acknowledgement {
    pub fn inserted(inserted_id: Uuid) -> Self {
        Self::Inserted {
            acknowledged: true,
            inserted_id,
        }
    }

    pub fn rejected(message: String) -> Self {
        Self::Rejected {
            acknowledged: false,
            message,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn new_booking(phone: Option<&str>) -> NewBooking {
        NewBooking {
            email: "a@x.com".into(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            treatment: "Checkup".into(),
            slot: "9am".into(),
            patient: Some("Ada".into()),
            phone: phone.map(String::from),
        }
    }

    #[test]
    fn booking_uses_client_field_names() {
        let booking = new_booking(Some("+49 170 1234567")).into_booking();
        let value = serde_json::to_value(&booking).unwrap();

        assert_eq!(value["_id"], json!(booking.id));
        assert_eq!(value["appointmentDate"], json!("2024-01-01"));
        assert_eq!(value["treatment"], json!("Checkup"));
    }

    #[test_case::test_case(Some("+49 170 1234567"), true)]
    #[test_case::test_case(Some("(030) 123-456"), false)]
    #[test_case::test_case(Some("call me"), false)]
    #[test_case::test_case(None, true)]
    fn phone_numbers_are_validated(phone: Option<&str>, valid: bool) {
        assert_eq!(new_booking(phone).validate().is_ok(), valid);
    }

    #[test]
    fn booking_rejects_unknown_fields() {
        let body = json!({
            "email": "a@x.com",
            "appointmentDate": "2024-01-01",
            "treatment": "Checkup",
            "slot": "9am",
            "price": 50
        });
        assert!(serde_json::from_value::<NewBooking>(body).is_err());
    }

    #[test]
    fn booking_rejects_malformed_dates() {
        let body = json!({
            "email": "a@x.com",
            "appointmentDate": "May 20, 2023",
            "treatment": "Checkup",
            "slot": "9am"
        });
        assert!(serde_json::from_value::<NewBooking>(body).is_err());
    }

    #[test]
    fn emails_are_stored_lowercase() {
        let mut booking = new_booking(None);
        booking.email = "Ada.Lovelace@X.com".into();
        assert_eq!(booking.into_booking().email, "ada.lovelace@x.com");

        let user = NewUser {
            email: "A@x.COM".into(),
            name: None,
        };
        assert_eq!(user.into_user().email, "a@x.com");
    }

    #[test]
    fn user_requires_valid_email() {
        let user = NewUser {
            email: "not-an-email".into(),
            name: None,
        };
        assert!(user.validate().is_err());
    }

    #[test]
    fn acknowledgement_shapes() {
        let id = Uuid::new_v4();
        assert_eq!(
            serde_json::to_value(Acknowledgement::inserted(id)).unwrap(),
            json!({ "acknowledged": true, "insertedId": id })
        );
        assert_eq!(
            serde_json::to_value(Acknowledgement::rejected("taken".into())).unwrap(),
            json!({ "acknowledged": false, "message": "taken" })
        );
    }
}
