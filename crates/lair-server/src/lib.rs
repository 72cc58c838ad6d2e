//! Lair server.
//!
//! Hosts the [`lair_app`] page state machine on real terminals: the local
//! terminal for single-user runs, and any number of concurrent SSH clients
//! for the hosted mode.
//!
//! # Architecture
//!
//! [`lair_app`] is pure: pages return [`lair_app::Effect`] values instead of
//! performing I/O. This crate supplies the I/O around it. A
//! [`SessionHost`] runs one [`lair_app::Router`] against one [`Driver`],
//! interpreting effects with the collaborators in [`Services`]. [`Server`]
//! accepts SSH connections and runs one session host per connection.
//!
//! # Components
//!
//! - [`SessionHost`]: per-connection event loop
//! - [`Driver`]: transport boundary ([`LocalTerminal`], [`ssh::SshTerminal`])
//! - [`Server`] and [`serve_connections`]: accept loop and graceful shutdown
//! - [`SessionRegistry`]: live sessions, drained on shutdown
//! - [`Services`]: weather, mail and document collaborators
//! - [`Store`]: local persistence

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod host;
mod local;
mod registry;
mod server;
pub mod services;
pub mod ssh;
pub mod storage;

pub use driver::Driver;
pub use error::{ServerError, SshError};
pub use host::{SessionEnd, SessionHost, SessionId};
pub use local::{LocalError, LocalTerminal};
pub use registry::{SessionInfo, SessionRegistry, ShutdownReport};
pub use server::{Acceptor, Connection, Server, ServerConfig, serve_connections};
pub use services::{DocumentSource, Mailer, ServiceError, Services, ServicesConfig, WeatherClient};
pub use storage::{Health, HealthStatus, Store, StoreError, UserRecord};
