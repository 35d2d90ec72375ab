//! Time-series profiles and piecewise-linear device curves.

/// Piecewise-linear XY curves (PV efficiency, power-temperature).
pub mod curve;
/// Timestamped value series loaded from CSV and resampled onto a fixed grid.
pub mod series;
pub mod set;

pub use curve::XyCurve;
pub use series::TimeSeries;
pub use set::ProfileSet;
