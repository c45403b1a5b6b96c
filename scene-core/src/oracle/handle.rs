use std::sync::Mutex;

use super::OracleError;

/// Long-lived, exclusively accessed oracle slot.
///
/// Constructed once by the composition root and shared by reference. The
/// inner mutex serializes every call, so at most one request drives the
/// oracle at a time. Loading and unloading stay with the owner.
#[derive(Debug)]
pub struct OracleHandle<T> {
    name: String,
    slot: Mutex<Option<T>>,
}

impl<T> OracleHandle<T> {
    pub fn new(name: impl Into<String>, oracle: T) -> Self {
        Self {
            name: name.into(),
            slot: Mutex::new(Some(oracle)),
        }
    }

    /// A handle whose oracle has not been loaded yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install `oracle`, returning the one it replaces.
    pub fn load(&self, oracle: T) -> Result<Option<T>, OracleError> {
        log::info!("loading oracle `{}`", self.name);
        let mut slot = self.slot.lock().map_err(|_| self.poisoned())?;
        Ok(slot.replace(oracle))
    }

    pub fn unload(&self) -> Result<Option<T>, OracleError> {
        log::info!("unloading oracle `{}`", self.name);
        let mut slot = self.slot.lock().map_err(|_| self.poisoned())?;
        Ok(slot.take())
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Run `f` with exclusive access to the oracle.
    ///
    /// Blocks while another caller holds the oracle. Fails with
    /// [`OracleError::Unavailable`] when nothing is loaded.
    pub fn with<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<OracleError>,
    {
        let mut slot = self.slot.lock().map_err(|_| self.poisoned())?;
        let oracle = slot
            .as_mut()
            .ok_or_else(|| OracleError::Unavailable(self.name.clone()))?;
        f(oracle)
    }

    fn poisoned(&self) -> OracleError {
        OracleError::Poisoned(self.name.clone())
    }
}
