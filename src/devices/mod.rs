//! Circuit devices and the synthetic profile generators that feed them.

/// Synthetic loadshape generators.
pub mod baseload;
/// Constant-power loads driven by loadshapes.
pub mod load;
/// PV array with a smart inverter.
pub mod pv_system;
/// Synthetic irradiance and temperature generators.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use baseload::LoadProfile;
pub use load::{Load, LoadClass};
pub use pv_system::PvSystem;
pub use solar::{SolarProfile, TemperatureProfile};
pub use types::{BusPower, Device, DeviceContext};
