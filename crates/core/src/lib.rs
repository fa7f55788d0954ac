pub mod charge;
pub mod config;
pub mod error;
pub mod normalize;

pub use charge::{Charge, FlightDetails, StatementParseResult};
pub use config::ParseConfig;
pub use error::ParseError;
