//! Dynamic functions and converter-chain argument resolution.
//!
//! Operations exposed by plugin components are not called directly. They are
//! normalized into [`DynFunc`] values carrying their declared input types,
//! output type, and output capabilities; the engine then resolves every
//! declared input from a pool of known values plus a chain of converters
//! before dispatching the call.

mod func;
mod resolve;

pub use func::{DynFunc, DynValue, IntoDynFunc, Param};
pub use resolve::{ArgPool, ResolutionError, ResolveFailure, resolve_args};
