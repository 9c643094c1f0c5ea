//! Stream sources: the factory boundary and line readers.
//!
//! ## Contents
//! - [`StreamFactory`] opens a stream for a [`ConnectionRequest`]
//! - [`FactoryFn`] closure-backed factory
//! - [`LineSource`] / [`ReaderLineSource`] one line per call from a byte stream
//! - `HttpStreamFactory` (feature `http`) factory over `reqwest`

mod factory;
#[cfg(feature = "http")]
mod http;
mod line;

pub use factory::{ConnectionRequest, FactoryFn, FactoryRef, Method, StreamFactory};
#[cfg(feature = "http")]
pub use http::HttpStreamFactory;
pub use line::{BoxLineSource, LineSource, LineSourceCloser, ReaderLineSource};
