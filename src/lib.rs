//! `resilient-probe` runs a managed background service that calls an HTTP
//! endpoint once on startup and logs the result.
//!
//! The pieces compose bottom-up:
//! - [`RetryPolicy`] decides between stopping and waiting `2^k` seconds;
//! - [`HttpInvoker`] performs a single classified GET;
//! - [`ResilientClient::invoke`] loops the two until a terminal [`Completion`];
//! - [`ManagedService`] wires configuration, logging and the Start/Stop lifecycle;
//! - [`host::run_until`] drives a [`HostedService`] between process start and shutdown.

mod client;
mod error;
mod invoker;
mod options;
mod policy;
mod service;
mod types;

pub mod config;
pub mod host;
pub mod logging;

pub use client::ResilientClient;
pub use config::{ConfigSource, EnvConfig, Layered, MapConfig};
pub use error::ProbeError;
pub use invoker::{
    classify_status, parse_base_address, Attempt, HttpInvoker, InvocationRequest, StatusClass,
};
pub use options::ClientOptions;
pub use policy::{Decision, RetryPolicy};
pub use service::{HostedService, ManagedService, ServiceState};
pub use types::{AttemptOutcome, Completion};

pub type Result<T> = std::result::Result<T, ProbeError>;
