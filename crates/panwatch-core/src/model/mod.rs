// ── Domain model ──
//
// Canonical types produced by a refresh and consumed by the CLI and the
// entity layer. None of these carry API-specific XML details.

pub mod device;
pub mod rule;
pub mod snapshot;

pub use device::DeviceIdentity;
pub use rule::{RuleAction, SecurityRule};
pub use snapshot::{FetchError, Metric, Snapshot};
