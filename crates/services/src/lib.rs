pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod progress_store;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressServiceError};
pub use progress_core::time::Clock;
pub use progress_service::ProgressService;
pub use progress_store::{ProgressStore, StudentProgress};
