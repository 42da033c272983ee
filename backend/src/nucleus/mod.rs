//! Pure rules of the shared activity space: no storage, no I/O.

pub mod chat_gate;
pub mod games;
pub mod lifecycle;
pub mod media;
pub mod missions;
pub mod progress;
pub mod questions;
pub mod temperature;

pub use chat_gate::chat_level;
pub use lifecycle::{LifecycleAction, next_status};
pub use progress::compute_progress;
