//! Static passes over contract graphs and compiled programs.
pub mod schedule;
pub mod telemetry;
pub mod topology;

pub use schedule::{build_schedule, Bucket, Schedule};
pub use telemetry::TelemetryReport;
