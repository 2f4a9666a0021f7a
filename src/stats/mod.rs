//! Statistic Reducers
//!
//! Reduces a sample series to a single summary statistic.
//!
//! ## Components
//!
//! - [`StatOperation`]: the tag a catalog row uses to pick a reducer
//! - [`ReducerRegistry`]: explicit operation → reducer mapping, built at startup
//! - [`reducers`]: the pure numeric functions behind the built-in operations
//!
//! Rounding to two decimals is applied once by [`ReducerRegistry::reduce`],
//! never inside an individual reducer.

mod error;
mod operation;
pub mod reducers;
mod registry;

pub use error::{StatsError, StatsResult};
pub use operation::StatOperation;
pub use registry::{round_to_cents, Reducer, ReducerRegistry};
