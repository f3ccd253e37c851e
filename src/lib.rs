//! TaskJuggler bridge.
//!
//! Converts task records from issue trackers or spreadsheets into a
//! TaskJuggler 3 project description, runs the external `tj3` scheduler over
//! it, and merges the computed bookings back onto the original tasks.
//! No scheduling happens in this crate.
//!
//! # Modules
//!
//! - **`ident`**: Lossless key ↔ identifier codec
//! - **`models`**: Node tree: `project`, `resource`, `task`, `booking`
//!   nodes and their typed properties
//! - **`render`**: Tree → `.tjp` text
//! - **`loader`**: Records → task nodes, driven by a `SourceProfile` table
//! - **`validation`**: Dependency pruning, effort checks, cycle detection
//! - **`scheduler`**: `tj3` invocation and calendar result merge
//! - **`writeback`**: Scheduled start times → record source
//! - **`juggler`**: The whole pipeline
//! - **`config`**: TOML run configuration
//!
//! # Example
//!
//! ```
//! use schedule_juggler::juggler::Juggler;
//! use serde_json::json;
//!
//! let records = [json!({"id": 1, "effort": 3, "summary": "test"})];
//! let plan = Juggler::default().plan(&records).unwrap();
//! assert!(plan.tree.to_string().contains("task _n_1 \"test\""));
//! ```
//!
//! # References
//!
//! - TaskJuggler 3 manual, <https://taskjuggler.org/tj3/manual/>

pub mod config;
pub mod error;
pub mod ident;
pub mod juggler;
pub mod loader;
pub mod models;
pub mod render;
pub mod scheduler;
pub mod validation;
pub mod writeback;

pub use error::{Error, Result};
pub use juggler::{Juggler, Plan};
pub use models::Node;
