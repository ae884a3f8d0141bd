//! # modgate Core Library
//!
//! This crate contains the core logic of `modgate` – a caching Go module proxy that
//! serves modules from the local module download cache and fetches missing ones
//! with the `go` command.
//!
//! Replace rules let the proxy publish a module under a *private* path while
//! fetching it from its *canonical* path. The fetched artifacts are mirrored to
//! the private path and their archives rewritten, so clients can't tell the two
//! apart.
//!
//! ## Modules Overview
//! - [`escape`] – Case escaping of module paths and versions
//! - [`rules`] – Replace rules mapping private paths to canonical ones
//! - [`resolve`] – Running the resolution engine and reading its output
//! - [`archive`] – Mirroring cached modules and rewriting their archives
//! - [`dirhash`] – `h1:` checksums for module archives
//! - [`cache`] – Locating request paths in the module download cache
//! - [`request`] – Splitting and decoding `/@v/` request paths
//! - [`inflight`] – One cache fill per module version at a time
//! - [`router`] – Per-request cache/fill/redirect decisions
//! - [`server`] – The HTTP front end
//! - [`config`] – Startup configuration


pub mod escape;
pub mod rules;
pub mod resolve;
pub mod archive;
pub mod dirhash;
pub mod cache;
pub mod request;
pub mod inflight;
pub mod router;
pub mod server;
pub mod config;
pub mod error;

pub use escape::*;
pub use rules::*;
pub use resolve::*;
pub use archive::*;
pub use dirhash::*;
pub use cache::*;
pub use request::*;
pub use inflight::*;
pub use router::*;
pub use config::*;
pub use error::*;
