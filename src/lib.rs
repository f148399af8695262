pub mod dataset;
pub mod error;
pub mod fetch;
pub mod fuel;
pub mod intensity;
pub mod modes;
pub mod output;
pub mod spatial;
pub mod store;
pub mod temporal;

pub use error::{Error, Result};
pub use intensity::TransitIntensities;
