// Application layer - consolidation of statements and cash-flow reporting.
// The domain types know nothing about how many statements went in;
// everything multi-statement lives here.

pub mod consolidation;
pub mod error;
pub mod reporting;

pub use consolidation::*;
pub use error::*;
pub use reporting::*;
