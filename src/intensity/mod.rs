//! Weighted energy intensity estimation.
//!
//! [`aggregate`](aggregate::aggregate) turns a year's records into per-fuel and
//! overall UPT-weighted intensities, [`fallback`] relaxes the query when
//! nothing matches, and [`TransitIntensities`] ties both to a dataset store.

pub mod aggregate;
pub mod estimator;
pub mod fallback;
pub mod types;
pub mod utility;

pub use estimator::TransitIntensities;
pub use types::{Estimate, FuelTypeAggregate, IntensityTable, QueryMetadata};
