pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod travel_repo;

pub use database::DbClient;
pub use memory_repo::MemoryTravelRepository;
pub use travel_repo::PostgresTravelRepository;
