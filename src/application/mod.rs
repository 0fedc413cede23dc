// Application layer - Use cases over the fleet backend
pub mod dashboard_service;
pub mod fleet_api;
pub mod refresh;
pub mod result_cache;
pub mod session;
