//! Builder for store locators.

use crate::config::Config;
use crate::error::{ClusterError, Result};
use crate::locator::{NoopRecorder, SearchRecorder, StoreDirectory, StoreLocator};
use crate::storage::TreeStore;

/// Builder for a [`StoreLocator`] with custom configuration and analytics.
pub struct LocatorBuilder<S, D> {
    store: S,
    directory: D,
    config: Config,
    recorder: Box<dyn SearchRecorder>,
}

impl<S: TreeStore, D: StoreDirectory> LocatorBuilder<S, D> {
    /// Start from a snapshot store and a detail directory.
    pub fn new(store: S, directory: D) -> Self {
        Self {
            store,
            directory,
            config: Config::default(),
            recorder: Box::new(NoopRecorder),
        }
    }

    /// Set the locator configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the index precision used for new and loaded trees.
    pub fn precision(mut self, precision: usize) -> Self {
        self.config.precision = precision;
        self
    }

    /// Route search terms to an analytics recorder.
    pub fn recorder<R: SearchRecorder + 'static>(mut self, recorder: R) -> Self {
        self.recorder = Box::new(recorder);
        self
    }

    /// Build the locator.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidInput` if the configuration is invalid.
    pub fn build(self) -> Result<StoreLocator<S, D>> {
        self.config.validate().map_err(ClusterError::InvalidInput)?;
        Ok(StoreLocator::from_parts(
            self.config,
            self.store,
            self.directory,
            self.recorder,
        ))
    }
}
