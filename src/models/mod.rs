pub mod batch;
pub mod request;
pub mod result;

pub use batch::*;
pub use request::*;
pub use result::*;
