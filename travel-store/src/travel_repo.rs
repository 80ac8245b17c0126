use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use travel_core::registration::{self, RegistrationOutcome, UnregistrationOutcome};
use travel_core::repository::TravelRepository;
use travel_core::{ClientTrip, CoreError, CoreResult, NewClient, Trip};

const LIST_TRIPS_SQL: &str = r#"
    SELECT t.IdTrip AS id_trip, t.Name AS name, t.Description AS description,
           t.DateFrom AS date_from, t.DateTo AS date_to, t.MaxPeople AS max_people,
           c.Name AS country_name
    FROM Trip t
    JOIN Country_Trip ct ON t.IdTrip = ct.IdTrip
    JOIN Country c ON ct.IdCountry = c.IdCountry
"#;

const LIST_CLIENT_TRIPS_SQL: &str = r#"
    SELECT t.IdTrip AS id_trip, t.Name AS name, t.Description AS description,
           t.DateFrom AS date_from, t.DateTo AS date_to, t.MaxPeople AS max_people,
           c.Name AS country_name, ct.RegisteredAt AS registered_at, ct.PaymentDate AS payment_date
    FROM Client_Trip ct
    JOIN Trip t ON ct.IdTrip = t.IdTrip
    JOIN Country_Trip ctr ON t.IdTrip = ctr.IdTrip
    JOIN Country c ON ctr.IdCountry = c.IdCountry
    WHERE ct.IdClient = $1
"#;

const INSERT_CLIENT_SQL: &str = r#"
    INSERT INTO Client (FirstName, LastName, Email, Telephone, Pesel)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING IdClient
"#;

const COUNT_CLIENT_SQL: &str = "SELECT COUNT(1) FROM Client WHERE IdClient = $1";
// Row lock serializes concurrent registrations for the same trip.
const LOCK_TRIP_SQL: &str = "SELECT MaxPeople FROM Trip WHERE IdTrip = $1 FOR UPDATE";
const COUNT_TRIP_REGISTRATIONS_SQL: &str = "SELECT COUNT(1) FROM Client_Trip WHERE IdTrip = $1";
const COUNT_REGISTRATION_SQL: &str =
    "SELECT COUNT(1) FROM Client_Trip WHERE IdClient = $1 AND IdTrip = $2";
const INSERT_REGISTRATION_SQL: &str =
    "INSERT INTO Client_Trip (IdClient, IdTrip, RegisteredAt) VALUES ($1, $2, $3)";
const DELETE_REGISTRATION_SQL: &str =
    "DELETE FROM Client_Trip WHERE IdClient = $1 AND IdTrip = $2";

pub struct PostgresTravelRepository {
    pool: PgPool,
}

impl PostgresTravelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id_trip: i32,
    name: String,
    description: String,
    date_from: NaiveDateTime,
    date_to: NaiveDateTime,
    max_people: i32,
    country_name: String,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id_trip: row.id_trip,
            name: row.name,
            description: row.description,
            date_from: row.date_from,
            date_to: row.date_to,
            max_people: row.max_people,
            country_name: row.country_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClientTripRow {
    id_trip: i32,
    name: String,
    description: String,
    date_from: NaiveDateTime,
    date_to: NaiveDateTime,
    max_people: i32,
    country_name: String,
    registered_at: i32,
    payment_date: Option<i32>,
}

impl From<ClientTripRow> for ClientTrip {
    fn from(row: ClientTripRow) -> Self {
        ClientTrip {
            id_trip: row.id_trip,
            name: row.name,
            description: row.description,
            date_from: row.date_from,
            date_to: row.date_to,
            max_people: row.max_people,
            country_name: row.country_name,
            registered_at: row.registered_at,
            payment_date: row.payment_date,
        }
    }
}

/// Inserts the `Client_Trip` row. Returns `false` when the primary key
/// already holds the pair.
async fn insert_registration(
    conn: &mut PgConnection,
    client_id: i32,
    trip_id: i32,
    registered_at: i32,
) -> CoreResult<bool> {
    let inserted = sqlx::query(INSERT_REGISTRATION_SQL)
        .bind(client_id)
        .bind(trip_id)
        .bind(registered_at)
        .execute(conn)
        .await;

    match inserted {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(false),
        Err(err) => Err(CoreError::storage(err)),
    }
}

#[async_trait]
impl TravelRepository for PostgresTravelRepository {
    async fn list_trips(&self) -> CoreResult<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(LIST_TRIPS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn list_client_trips(&self, client_id: i32) -> CoreResult<Vec<ClientTrip>> {
        let rows: Vec<ClientTripRow> = sqlx::query_as(LIST_CLIENT_TRIPS_SQL)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        Ok(rows.into_iter().map(ClientTrip::from).collect())
    }

    async fn create_client(&self, client: &NewClient) -> CoreResult<i32> {
        let id: i32 = sqlx::query_scalar(INSERT_CLIENT_SQL)
            .bind(client.first_name.expose())
            .bind(client.last_name.expose())
            .bind(client.email.expose())
            .bind(client.telephone.expose())
            .bind(client.pesel.expose())
            .fetch_one(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        info!(client_id = id, "Client created");
        Ok(id)
    }

    async fn register_client_for_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<RegistrationOutcome> {
        // Every early return drops `tx`, which rolls it back.
        let mut tx = self.pool.begin().await.map_err(CoreError::storage)?;

        let clients: i64 = sqlx::query_scalar(COUNT_CLIENT_SQL)
            .bind(client_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        if clients == 0 {
            debug!(client_id, trip_id, "Registration rejected: unknown client");
            return Ok(RegistrationOutcome::ClientNotFound);
        }

        let max_people: Option<i32> = sqlx::query_scalar(LOCK_TRIP_SQL)
            .bind(trip_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        let Some(max_people) = max_people else {
            debug!(client_id, trip_id, "Registration rejected: unknown trip");
            return Ok(RegistrationOutcome::TripNotFound);
        };

        let registered: i64 = sqlx::query_scalar(COUNT_TRIP_REGISTRATIONS_SQL)
            .bind(trip_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        if !registration::has_capacity(registered, max_people) {
            debug!(client_id, trip_id, registered, max_people, "Registration rejected: trip full");
            return Ok(RegistrationOutcome::CapacityReached);
        }

        let existing: i64 = sqlx::query_scalar(COUNT_REGISTRATION_SQL)
            .bind(client_id)
            .bind(trip_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        if existing > 0 {
            debug!(client_id, trip_id, "Registration rejected: already registered");
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        let registered_at = registration::today();
        if !insert_registration(&mut *tx, client_id, trip_id, registered_at).await? {
            debug!(client_id, trip_id, "Registration rejected by primary key");
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        tx.commit().await.map_err(CoreError::storage)?;

        info!(client_id, trip_id, registered_at, "Client registered for trip");
        Ok(RegistrationOutcome::Registered)
    }

    async fn unregister_client_from_trip(
        &self,
        client_id: i32,
        trip_id: i32,
    ) -> CoreResult<UnregistrationOutcome> {
        let mut tx = self.pool.begin().await.map_err(CoreError::storage)?;

        let existing: i64 = sqlx::query_scalar(COUNT_REGISTRATION_SQL)
            .bind(client_id)
            .bind(trip_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        if existing == 0 {
            debug!(client_id, trip_id, "Unregistration rejected: no such registration");
            return Ok(UnregistrationOutcome::RegistrationNotFound);
        }

        sqlx::query(DELETE_REGISTRATION_SQL)
            .bind(client_id)
            .bind(trip_id)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::storage)?;

        tx.commit().await.map_err(CoreError::storage)?;

        info!(client_id, trip_id, "Client unregistered from trip");
        Ok(UnregistrationOutcome::Unregistered)
    }
}
