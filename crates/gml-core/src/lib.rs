pub mod error;
pub mod types;
pub mod value;

pub use error::{ErrorKind, GmlError};
pub use types::*;
pub use value::*;
