//! # Stockcast
//!
//! Inventory demand forecasting and replenishment planning.
//!
//! - [`stock_math`]: statistics, scalers and regression trees, no I/O
//! - [`demand_forecast`]: the planning engine and the `replenish` binary
//!
//! ```
//! use stockcast::demand_forecast::policy::{Priority, Recommendation};
//!
//! assert_eq!(Priority::classify(10.0, 0.0), Priority::Alta);
//! assert_eq!(
//!     Recommendation::classify(0, 10.0, 1000.0).label(),
//!     "NO COMPRAR - Exceso de stock"
//! );
//! ```

pub use demand_forecast;
pub use stock_math;
