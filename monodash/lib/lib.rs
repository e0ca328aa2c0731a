//! `monodash` is a dashboard service for the virtual machines and containers of a hypervisor host.
//!
//! # Overview
//!
//! monodash keeps a record of every instance on the host together with periodic host telemetry
//! and per-instance metric samples, and drives instances through a small lifecycle state machine:
//!
//! - **Lifecycle**: start, stop, reboot, pause and resume, with the resource usage each
//!   transition implies
//! - **Dashboard**: the latest host snapshot, instance counts by kind and status, and the most
//!   recently created instances
//! - **Metrics**: point-in-time samples of running instances, queried over a lookback window
//!
//! # Architecture
//!
//! - [`models`] - Instances, telemetry and request types
//! - [`management`] - SQLite store and migrations
//! - [`lifecycle`] - The transition table and the action operation
//! - [`dashboard`] - The overview read model
//! - [`telemetry`] - Host telemetry sources and instance I/O samplers
//! - [`service`] - The [`Monodash`](service::Monodash) facade over all operations
//! - [`server`] - JSON over HTTP
//! - [`cli`] - Command-line arguments
//! - [`config`] - The YAML configuration
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use monodash::{
//!     config::MonodashConfig,
//!     models::{ActionRequest, CreateInstanceRequest, InstanceKind, LifecycleAction},
//!     service::Monodash,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = Monodash::from_config(&MonodashConfig::default()).await?;
//!
//!     service
//!         .create_instance(&CreateInstanceRequest {
//!             handle: 100,
//!             name: "web-01".to_string(),
//!             kind: InstanceKind::VirtualMachine,
//!             cpu_cores: Some(2),
//!             memory_allocated: 2048,
//!             disk_size: 20,
//!         })
//!         .await?;
//!
//!     let running = service
//!         .perform_action(&ActionRequest {
//!             handle: 100,
//!             action: LifecycleAction::Start,
//!         })
//!         .await?;
//!     println!("{} is {}", running.name, running.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod error;
mod log;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod lifecycle;
pub mod management;
pub mod models;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod utils;

pub use error::*;
pub use log::*;
