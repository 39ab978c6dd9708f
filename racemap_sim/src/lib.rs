//! RaceMap Simulation Harness
//!
//! Drives simulated vehicles around a finalized track and keeps the latest
//! state of every vehicle, simulated or live, in a shared registry.
//!
//! # Threading Model
//!
//! ```text
//! ┌──────────────────────────┐      Arc<FinalizedTrack>      ┌──────────────┐
//! │ TrackSession (core)      │ ─────── finalize ───────────► │ Vehicle #1   │──┐
//! │ points: Arc<Mutex<Vec>>  │                               │ (std thread) │  │
//! └──────────────────────────┘                               └──────────────┘  │
//!                                                            ┌──────────────┐  │ update
//!                                                            │ Vehicle #N   │──┤
//!                                                            └──────────────┘  ▼
//!                                                         ┌─────────────────────────┐
//!                                 live telemetry ───────► │ VehicleRegistry         │
//!                                                         │ Arc<Mutex<HashMap>>     │
//!                                                         └─────────────────────────┘
//! ```
//!
//! Each vehicle thread owns a [`CancelToken`]; removing the vehicle from the
//! registry cancels it.
//!
//! # Usage
//!
//! ```ignore
//! use racemap_core::PipelineConfig;
//! use racemap_sim::{SimConfig, Simulation};
//!
//! let (sim, _report) = Simulation::from_payload(payload, &PipelineConfig::default(), SimConfig::default())?;
//! let report = sim.run_stepped(300)?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod fleet;
pub mod registry;
pub mod runner;
pub mod vehicle;

pub use clock::{SimClock, SystemClock, VirtualClock};
pub use config::SimConfig;
pub use error::SimError;
pub use fleet::{spawn_fleet, vehicle_id};
pub use registry::{VehicleRegistry, VehicleState};
pub use runner::{SimReport, Simulation};
pub use vehicle::{CancelToken, SimHandle, SimulatedVehicle};
