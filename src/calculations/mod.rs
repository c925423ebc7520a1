pub mod constraint;
pub mod forward_pass;

pub use constraint::compute_constraint;
pub use forward_pass::{ForwardPass, SchedulingResult, run_automatic_scheduling};
