//! Data model
//!
//! Requests entering the subsystem, results leaving it, and the
//! canonicalized cache keys that link the two.

mod place;
mod request;
mod route;

pub use place::*;
pub use request::*;
pub use route::*;
