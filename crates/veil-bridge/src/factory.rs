//! Owning factory handle.

use std::mem;

use crate::error::BridgeResult;
use crate::raw::{self, RawFactory};
use crate::session::Session;

/// A live engine factory.
///
/// Move-only: a `Factory` always holds a non-null token, and retirement runs
/// exactly once, on drop or through [`Factory::free`]. Sessions derived from
/// it are independently owned; nothing ties their lifetime to the factory's,
/// and the engine expects sessions to be retired first — keep the factory
/// alive while its sessions are in use.
#[derive(Debug)]
pub struct Factory {
    token: RawFactory,
}

impl Factory {
    /// Builds a factory from a configuration document (see
    /// [`Config`](crate::Config) for a typed way to produce one).
    pub fn from_config(config_json: &str) -> BridgeResult<Self> {
        raw::factory_new_with_config(config_json).map(|token| Self { token })
    }

    /// Builds a factory from the engine's ambient environment configuration.
    pub fn from_env() -> BridgeResult<Self> {
        raw::factory_new_from_env().map(|token| Self { token })
    }

    /// Derives a session scoped to `partition_id`.
    pub fn session(&self, partition_id: &str) -> BridgeResult<Session> {
        raw::factory_get_session(self.token, partition_id).map(Session::from_raw)
    }

    /// The underlying token. Stays owned by `self`.
    pub fn as_raw(&self) -> RawFactory {
        self.token
    }

    /// Releases ownership of the token without retiring it. The caller takes
    /// over the free obligation at the raw layer.
    pub fn into_raw(self) -> RawFactory {
        let token = self.token;
        mem::forget(self);
        token
    }

    /// Retires the factory now instead of at end of scope.
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Factory {
    fn drop(&mut self) {
        raw::factory_free(self.token);
    }
}
