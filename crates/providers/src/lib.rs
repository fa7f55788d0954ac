pub mod chase;
pub mod provider;
pub mod registry;
pub(crate) mod scan;
pub mod wells_fargo;

pub use chase::ChaseParser;
pub use provider::{BillingCycle, CardInfo, ProviderParser};
pub use registry::ParserRegistry;
pub use wells_fargo::WellsFargoParser;
