//! A small Rust client for the Water Quality Portal (WQP) telemetry service.
//!
//! A [`Connection`] selects a database (`test` or `production`) and a
//! program (`marsh` or `emp`), then queries result sets:
//! list them, fetch their reading dates, or fetch their data over a time
//! window. Responses are delimited text and come back as [`ResultTable`]s.
//! Multi-ID calls fan out concurrently and keep the order of the IDs.
//!
//! ## Quick start
//! - Pass the database and program to [`Connection::new`], or configure them
//!   via `WQP_DATABASE` / `WQP_PROGRAM` or a `.wqprc` file and call
//!   [`Connection::from_env`].
//!
//! ```no_run
//! use wqp::{Connection, DEFAULT_VERSION};
//!
//! fn main() -> wqp::Result<()> {
//!     let wqp = Connection::new("production", "marsh")?;
//!     let details = wqp.result_details()?;
//!     println!("{} result sets", details.len());
//!
//!     let data = wqp.result_data(
//!         36289,
//!         "2019-10-01 00:00:00",
//!         "2020-08-30 23:59:59",
//!         DEFAULT_VERSION,
//!     )?;
//!     println!("{} table(s)", data.len());
//!     Ok(())
//! }
//! ```
//!
//! The client is blocking. From async code, call it inside
//! `tokio::task::spawn_blocking`.

#![forbid(unsafe_code)]

mod concurrent;
mod config;
mod connection;
mod endpoints;
mod error;
mod params;
mod query;
mod table;
mod transport;

pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionBuilder, DEFAULT_VERSION, ResultBatch};
pub use endpoints::{Database, Program, Service};
pub use error::{Result, WqpError};
pub use params::{
    INPUT_TIME_FORMAT, OneOrMany, QueryParams, ResultId, SERVICE_TIME_FORMAT, service_time,
};
pub use table::{DEFAULT_DELIMITER, ResultTable};
pub use transport::{HttpTransport, Transport, TransportConfig};
