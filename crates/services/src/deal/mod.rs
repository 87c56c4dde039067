mod filter;
mod picker;
mod progress;
mod service;
mod workflow;

// Public API of the deal subsystem.
pub use crate::error::DealError;
pub use filter::{filter_available, matches_criteria};
pub use picker::{Draw, NoCardReason, draw_card, pick_card};
pub use progress::DealProgress;
pub use service::Deal;
pub use workflow::DealService;
