//! Client for the Helios metrics backend polled by the dashboard.

pub mod client;
pub mod kpis;

pub use self::client::{
    ApiResponse, BackendClient, DemoSession, LiveStats, AVAILABLE_ENDPOINTS, DEFAULT_BACKEND_URL,
};
pub use self::kpis::{extract_kpis, format_api_error, KpiSource, Kpis};
