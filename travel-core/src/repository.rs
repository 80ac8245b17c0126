use async_trait::async_trait;

use crate::models::{ClientTrip, NewClient, Trip};
use crate::registration::{RegistrationOutcome, UnregistrationOutcome};
use crate::CoreResult;

/// Data access for trips, clients and registrations.
#[async_trait]
pub trait TravelRepository: Send + Sync {
    /// All trips with their country name, in store order.
    async fn list_trips(&self) -> CoreResult<Vec<Trip>>;

    /// Registrations of one client joined with trip and country data.
    /// Unknown clients and clients without registrations both yield an empty list.
    async fn list_client_trips(&self, client_id: i32) -> CoreResult<Vec<ClientTrip>>;

    /// Inserts a client and returns its generated id.
    async fn create_client(&self, client: &NewClient) -> CoreResult<i32>;

    /// Runs the registration workflow: client exists, trip exists, trip has
    /// capacity, pair not yet registered, then insert with today's date.
    async fn register_client_for_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<RegistrationOutcome>;

    async fn unregister_client_from_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<UnregistrationOutcome>;
}
