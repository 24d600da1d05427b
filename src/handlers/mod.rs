pub mod production_orders;
pub mod settings;
pub mod work_orders;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
