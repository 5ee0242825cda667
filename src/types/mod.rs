//! Public types for the huginn API.

mod mode;
mod weather;

pub use mode::Mode;
pub use weather::{Condition, SunTimes, Temperature, WeatherData, Wind};
