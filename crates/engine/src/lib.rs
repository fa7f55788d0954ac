pub mod classifier;
pub mod dispatch;
pub mod generic;
pub mod http;

pub use classifier::{ChargeClassifier, ClassifyError, MockClassifier};
pub use dispatch::{EngineError, StatementEngine};
pub use generic::GenericParser;
pub use http::HttpClassifier;
