//! veil-bridge — runtime bridge to the veil envelope-encryption engine.
//!
//! The engine ships as a shared module with a C surface; nothing links it at
//! build time. This crate locates and opens the module at runtime, binds its
//! ten entry points, and wraps the engine's opaque handles in owned Rust
//! types:
//!
//! - [`load`] / [`unload`] manage the process-wide module singleton.
//! - [`Factory`] produces [`Session`]s scoped to a partition identifier.
//! - [`Session::encrypt`] / [`Session::decrypt`] return [`CipherBuffer`]s —
//!   engine-allocated memory released back through the engine, never through
//!   Rust's allocator.
//! - [`last_error`] reads the most specific failure description available,
//!   preferring the engine's own diagnostic over the bridge's.
//!
//! The [`raw`] module exposes the same operations at the token level for
//! callers that need to carry handles across another boundary themselves.
//!
//! # Example
//!
//! ```no_run
//! use veil_bridge::{load, unload, Config, Factory};
//!
//! load("/opt/veil/libveil_engine.so")?;
//! let factory = Factory::from_config(&Config::new("checkout", "billing").to_json()?)?;
//! let session = factory.session("customer-42")?;
//! let sealed = session.encrypt(b"card token")?;
//! let opened = session.decrypt(&sealed)?;
//! assert_eq!(&*opened, b"card token");
//! drop(session);
//! drop(factory);
//! unload();
//! # Ok::<(), veil_bridge::BridgeError>(())
//! ```
//!
//! # Concurrency
//!
//! Operations on distinct sessions may run concurrently; [`load`] and
//! [`unload`] serialize against in-flight calls. [`last_error`] reflects the
//! most recent failure process-wide, so read it before issuing calls that
//! might race with other failing threads.

pub mod buffer;
pub mod config;
pub mod error;
pub mod factory;
pub mod loader;
pub mod raw;
pub mod session;
pub mod symbols;

pub use buffer::{CipherBuffer, RawBuffer};
pub use config::Config;
pub use error::{last_error, BridgeError, BridgeResult};
pub use factory::Factory;
pub use loader::{is_loaded, load, unload};
pub use session::Session;

/// Bridge crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
