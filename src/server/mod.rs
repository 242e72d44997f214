mod app;
mod state;

pub use app::create_app;
pub use state::{AppState, DEFAULT_PROBE_TIMEOUT};
