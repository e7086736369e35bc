//! Graceful shutdown: a signal type plus traits for components that
//! need synchronous or asynchronous teardown, matching the teacher
//! ecosystem's `tucano_core::shutdown` pattern. `spec.md` §4.3's Module
//! Runtime shutdown sequence ("drain in-flight subscriptions, publish
//! `stopped`, release leases, exit") is implemented per-module by
//! `titan_runtime::ModuleHost`; this type is the cross-cutting signal
//! that triggers it.

use serde::{Deserialize, Serialize};
use std::future::Future;

/// A component that can tear down immediately, without awaiting
/// anything.
pub trait SyncShutdown {
    type Result;
    fn shutdown(&mut self) -> Self::Result;
}

/// A component whose teardown needs to await something (flushing a
/// buffer, closing a connection, waiting out in-flight work).
pub trait AsyncShutdown {
    type Result;
    fn shutdown(&mut self) -> impl Future<Output = Self::Result>;
}

/// Broadcast on the process-wide shutdown watch channel to signal every
/// running `ModuleHost` to begin its shutdown sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
pub struct Shutdown;
