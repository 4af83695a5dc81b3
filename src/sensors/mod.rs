pub mod store;

pub use store::{NewReading, SensorStore};
