pub mod app;
pub mod daterange;
pub mod errors;
pub mod export;
pub mod graph;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod session;
pub mod state;
pub mod ui;

pub use app::router;
pub use state::AppState;
pub use session::{load_session, resolve_session_path};
