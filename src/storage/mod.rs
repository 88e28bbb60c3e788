pub mod feedback;
pub mod usage_log;
