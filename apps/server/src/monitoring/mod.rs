/// Monitoring engine - runs the independent per-device check loops.
///
/// This module is responsible for:
/// - Probing device reachability (ping or TCP connect)
/// - Scheduling one check loop per configured device
/// - Recording every probe result in the status log
pub mod probe;
pub mod scheduler;
pub mod types;

pub use probe::{ProbeKind, Prober, build_prober};
pub use scheduler::{Device, MonitorScheduler};
pub use types::{DeviceStatus, Observation};
