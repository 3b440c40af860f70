//! Attendance and presence verification.
//!
//! Every operation takes the acting user, the current instant and a database
//! handle explicitly. Concurrency guarantees come from unique indexes in the
//! store, so any number of server instances may share one database.

pub mod attendance_ledger;
pub mod capability;
pub mod error;
pub mod geo;
pub mod geofence_admin;
pub mod policy;
pub mod presence_engine;
pub mod schedule_catalog;
pub mod session_registry;
pub mod shift_admin;

pub use capability::{Actor, Capability, Role};
pub use error::{ErrorKind, PresenceError};
pub use geo::Coordinates;
pub use policy::PresencePolicy;
pub use presence_engine::PresenceEngine;
