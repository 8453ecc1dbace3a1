//! Synchronous, single-threaded shift-scheduling engine: resolves coverage
//! demand, checks availability and labor constraints, distributes shifts
//! fairly, generates a schedule over a date range, and validates the result.
//!
//! The engine owns no I/O. Persistence, transport, and configuration
//! sources are the embedding application's concern; this crate consumes an
//! in-memory [`resources::ResourceSnapshot`] and returns a
//! [`generator::ScheduleResult`].

pub mod availability;
pub mod config;
pub mod constraints;
pub mod coverage;
pub mod diagnostics;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod models;
pub mod resources;
pub mod schedule_state;
pub mod time_math;
pub mod validator;
pub mod weekday;

pub use config::EngineConfig;
pub use error::{EngineError, LoadError};
pub use generator::{CancellationToken, Generator, NeverCancelled, ScheduleResult};
pub use resources::{ResourceSnapshot, Resources};
