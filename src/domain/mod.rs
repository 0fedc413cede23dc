// Domain layer - Fleet models and pure dashboard logic
pub mod fleet;
pub mod map;
pub mod selection;
pub mod view;
