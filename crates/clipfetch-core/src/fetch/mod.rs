//! Clip fetcher: resolve a direct media URL through a proxy, then cut and
//! encode the requested range with the same proxy.
//!
//! Only URL resolution is retried; an encode failure ends the clip. A proxy
//! that reports HTTP 429 at either stage is evicted from the pool.

mod error;
mod event;
mod fetcher;

pub use error::{FailureKind, FetchError, Stage};
pub use event::{EventSink, FetchEvent};
pub use fetcher::{ClipFetcher, FetchReport, FetchSettings, DOWNLOADED};
