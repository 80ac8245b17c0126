use chrono::NaiveDateTime;
use serde::Serialize;
use travel_shared::Masked;

/// A trip as listed by `GET /api/trips`, joined with its country.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id_trip: i32,
    pub name: String,
    pub description: String,
    pub date_from: NaiveDateTime,
    pub date_to: NaiveDateTime,
    pub max_people: i32,
    pub country_name: String,
}

/// One registration of a client, joined with trip and country data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTrip {
    pub id_trip: i32,
    pub name: String,
    pub description: String,
    pub date_from: NaiveDateTime,
    pub date_to: NaiveDateTime,
    pub max_people: i32,
    pub country_name: String,
    /// `YYYYMMDD`
    pub registered_at: i32,
    pub payment_date: Option<i32>,
}

impl ClientTrip {
    pub fn from_trip(trip: &Trip, registered_at: i32, payment_date: Option<i32>) -> Self {
        Self {
            id_trip: trip.id_trip,
            name: trip.name.clone(),
            description: trip.description.clone(),
            date_from: trip.date_from,
            date_to: trip.date_to,
            max_people: trip.max_people,
            country_name: trip.country_name.clone(),
            registered_at,
            payment_date,
        }
    }
}

/// A validated client ready to be inserted.
///
/// Only [`crate::validation::CreateClientRequest::validate`] builds one, so every
/// field already satisfies the client payload rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub first_name: Masked<String>,
    pub last_name: Masked<String>,
    pub email: Masked<String>,
    pub telephone: Masked<String>,
    pub pesel: Masked<String>,
}
