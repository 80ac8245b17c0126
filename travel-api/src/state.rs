use std::sync::Arc;
use travel_core::TravelRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TravelRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TravelRepository>) -> Self {
        Self { repo }
    }
}
