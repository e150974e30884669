//! Request execution and bounded-concurrency dispatch.
mod budget;
mod client;
mod dispatcher;
mod execution;
mod transport;


pub use client::{ReqwestTransport, build_client};
pub use dispatcher::setup_dispatcher;
pub use execution::execute_unit;
pub use transport::{Exchange, RequestTarget, Transport};
