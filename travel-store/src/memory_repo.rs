//! In-process implementation of [`TravelRepository`].
//!
//! Mirrors the Postgres repository's semantics (check order, outcomes,
//! id generation) without a database. The whole registration workflow runs
//! under one lock, the same guarantee the Postgres row lock gives.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use travel_core::registration::{self, RegistrationOutcome, UnregistrationOutcome};
use travel_core::repository::TravelRepository;
use travel_core::{ClientTrip, CoreError, CoreResult, NewClient, Trip};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub client_id: i32,
    pub trip_id: i32,
    pub registered_at: i32,
    pub payment_date: Option<i32>,
}

#[derive(Default)]
struct MemoryState {
    trips: Vec<Trip>,
    clients: BTreeMap<i32, NewClient>,
    last_client_id: i32,
    registrations: Vec<Registration>,
}

impl MemoryState {
    fn trip(&self, trip_id: i32) -> Option<&Trip> {
        self.trips.iter().find(|t| t.id_trip == trip_id)
    }

    fn registration_count(&self, trip_id: i32) -> i64 {
        self.registrations.iter().filter(|r| r.trip_id == trip_id).count() as i64
    }

    fn is_registered(&self, client_id: i32, trip_id: i32) -> bool {
        self.registrations
            .iter()
            .any(|r| r.client_id == client_id && r.trip_id == trip_id)
    }
}

#[derive(Default)]
pub struct MemoryTravelRepository {
    state: Mutex<MemoryState>,
}

impl MemoryTravelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trips(trips: Vec<Trip>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                trips,
                ..Default::default()
            }),
        }
    }

    /// Stores a registration as-is, bypassing the workflow checks. Lets callers
    /// set up rows the API can never produce, such as paid registrations.
    pub async fn insert_registration(&self, registration: Registration) {
        self.state.lock().await.registrations.push(registration);
    }

    pub async fn registrations(&self) -> Vec<Registration> {
        self.state.lock().await.registrations.clone()
    }

    pub async fn registration_count(&self, trip_id: i32) -> i64 {
        self.state.lock().await.registration_count(trip_id)
    }
}

#[async_trait]
impl TravelRepository for MemoryTravelRepository {
    async fn list_trips(&self) -> CoreResult<Vec<Trip>> {
        Ok(self.state.lock().await.trips.clone())
    }

    async fn list_client_trips(&self, client_id: i32) -> CoreResult<Vec<ClientTrip>> {
        let state = self.state.lock().await;
        let trips = state
            .registrations
            .iter()
            .filter(|r| r.client_id == client_id)
            .filter_map(|r| {
                state
                    .trip(r.trip_id)
                    .map(|trip| ClientTrip::from_trip(trip, r.registered_at, r.payment_date))
            })
            .collect();
        Ok(trips)
    }

    async fn create_client(&self, client: &NewClient) -> CoreResult<i32> {
        let mut state = self.state.lock().await;
        let id = state
            .last_client_id
            .checked_add(1)
            .ok_or_else(|| CoreError::Internal("client id sequence exhausted".to_string()))?;
        state.last_client_id = id;
        state.clients.insert(id, client.clone());

        info!(client_id = id, "Client created");
        Ok(id)
    }

    async fn register_client_for_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<RegistrationOutcome> {
        let mut state = self.state.lock().await;

        if !state.clients.contains_key(&client_id) {
            debug!(client_id, trip_id, "Registration rejected: unknown client");
            return Ok(RegistrationOutcome::ClientNotFound);
        }

        let Some(max_people) = state.trip(trip_id).map(|t| t.max_people) else {
            debug!(client_id, trip_id, "Registration rejected: unknown trip");
            return Ok(RegistrationOutcome::TripNotFound);
        };

        let registered = state.registration_count(trip_id);
        if !registration::has_capacity(registered, max_people) {
            debug!(client_id, trip_id, registered, max_people, "Registration rejected: trip full");
            return Ok(RegistrationOutcome::CapacityReached);
        }

        if state.is_registered(client_id, trip_id) {
            debug!(client_id, trip_id, "Registration rejected: already registered");
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        let registered_at = registration::today();
        state.registrations.push(Registration {
            client_id,
            trip_id,
            registered_at,
            payment_date: None,
        });

        info!(client_id, trip_id, registered_at, "Client registered for trip");
        Ok(RegistrationOutcome::Registered)
    }

    async fn unregister_client_from_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<UnregistrationOutcome> {
        let mut state = self.state.lock().await;

        if !state.is_registered(client_id, trip_id) {
            debug!(client_id, trip_id, "Unregistration rejected: no such registration");
            return Ok(UnregistrationOutcome::RegistrationNotFound);
        }

        state
            .registrations
            .retain(|r| !(r.client_id == client_id && r.trip_id == trip_id));

        info!(client_id, trip_id, "Client unregistered from trip");
        Ok(UnregistrationOutcome::Unregistered)
    }
}
