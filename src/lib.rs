//! # NetSim - Educational network simulator core
//!
//! This library provides the engine behind an interactive network-building
//! course: learners place routers, switches, PCs and servers on a canvas,
//! cable their interfaces together, configure addressing, and have their
//! work graded against exercise rules.
//!
//! ## Overview
//!
//! Everything is in memory and synchronous. A [`session::NetworkSession`]
//! owns one topology and narrates every change on a timestamped console.
//! Ping, DHCP and DNS are simulated by inspecting the topology rather than
//! by moving packets, and each returns a structured outcome alongside its
//! console trace.
//!
//! ## Key Features
//!
//! - **Address Arithmetic**: dotted-decimal conversion, subnet membership, CIDR and classful masks
//! - **Topology Editing**: device templates, two-step cable connection, referential integrity
//! - **Simulated Services**: ping, DHCP DISCOVER/OFFER/REQUEST/ACK, DNS lookup
//! - **Reachability**: breadth-first search over the cable graph
//! - **Grading**: twelve rule kinds, 70% pass threshold, per-user progress and unlocks
//! - **Reproducible**: seeded id and MAC generation for deterministic sessions
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `ip`: IPv4 address arithmetic and DHCP pool scanning
//! - `topology`: data model, device templates, path finding and packet animation
//! - `session`: the mutation engine and network simulations
//! - `exercise`: exercise catalog, rule validation and progress tracking
//! - `store`: persistence of topologies and progress
//! - `config`: type-safe configuration structures
//! - `config_loader`: configuration file loading
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netsim::exercise::{validate, ExerciseCatalog};
//! use netsim::session::NetworkSession;
//! use netsim::topology::DeviceType;
//! use std::path::Path;
//!
//! let mut session = NetworkSession::new();
//! let switch = session.add_device(DeviceType::Switch, 200.0, 100.0);
//! let pc = session.add_device(DeviceType::Pc, 80.0, 250.0);
//! session.connect(&switch, "port0", &pc, "eth0");
//!
//! let catalog = ExerciseCatalog::load(Path::new("catalog/exercises.yaml"))?;
//! if let Some(exercise) = catalog.get("ex1-basic-network") {
//!     let result = validate(exercise, session.topology());
//!     println!("{}/{}", result.score, result.max_score);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   log_level: info
//!
//! session:
//!   seed: 42
//!   max_console_lines: 500
//!   lease_time: "24h"
//!
//! storage:
//!   path: "netsim_data"
//!
//! catalog:
//!   path: "catalog/exercises.yaml"
//! ```
//!
//! ## Error Handling
//!
//! Expected network conditions (an unreachable host, an exhausted pool, an
//! unknown rule) are never errors: they come back as outcome values and
//! console lines. Library errors are `thiserror` enums; the file loaders and
//! the binary use `color_eyre` for reporting with context.

pub mod config;
pub mod config_loader;

pub mod exercise;
pub mod ip;
pub mod session;
pub mod store;
pub mod topology;
