mod domain;
pub use domain::*;

mod kind;
pub use kind::*;

mod plan;
pub use plan::*;

mod error;
pub use error::ModelError;
