//! Everything one engine run needs.
//!
//! A [`Configuration`] is assembled once per run through
//! [`ConfigurationBuilder`], which validates it: storage, converter and error
//! factory are required, feature names must be unique. The cleaner defaults to
//! [`KeepAll`] and the equality to [`NeverEqual`].

use crate::error::ConfigurationError;
use crate::retry::RetryPolicy;
use statefold_core::{
    ErrorReducerFactory, Feature, KeepAll, NeverEqual, StateConverter, StateEquality, Storage,
    TransientCleaner,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Default run name used to tag logs.
pub const DEFAULT_NAME: &str = "engine";

/// Validated bundle of features and policies for one engine run.
///
/// Cloning is cheap: every component is shared.
pub struct Configuration<S, M> {
    pub(crate) name: String,
    pub(crate) features: Vec<Arc<dyn Feature<S>>>,
    pub(crate) storage: Arc<dyn Storage<S>>,
    pub(crate) converter: Arc<dyn StateConverter<S, M>>,
    pub(crate) cleaner: Arc<dyn TransientCleaner<S>>,
    pub(crate) equality: Arc<dyn StateEquality<S>>,
    pub(crate) error_factory: Arc<dyn ErrorReducerFactory<S>>,
    pub(crate) storage_retry: RetryPolicy,
}

impl<S, M> Configuration<S, M> {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ConfigurationBuilder<S, M> {
        ConfigurationBuilder::default()
    }

    /// Run name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the configured features, in registration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.iter().map(|feature| feature.name())
    }

    /// Retry policy wrapped around every storage operation.
    #[must_use]
    pub const fn storage_retry(&self) -> &RetryPolicy {
        &self.storage_retry
    }
}

impl<S, M> Clone for Configuration<S, M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            features: self.features.clone(),
            storage: Arc::clone(&self.storage),
            converter: Arc::clone(&self.converter),
            cleaner: Arc::clone(&self.cleaner),
            equality: Arc::clone(&self.equality),
            error_factory: Arc::clone(&self.error_factory),
            storage_retry: self.storage_retry.clone(),
        }
    }
}

impl<S, M> fmt::Debug for Configuration<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.name)
            .field("features", &self.feature_names().collect::<Vec<_>>())
            .field("storage_retry", &self.storage_retry)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Configuration`].
///
/// # Example
///
/// ```rust
/// use statefold_core::{FeatureError, Reducer, Structural};
/// use statefold_runtime::{Configuration, MemoryStorage, RetryPolicy};
///
/// let configuration = Configuration::<u32, String>::builder()
///     .name("counter")
///     .storage(MemoryStorage::new(0_u32))
///     .converter(|count: &u32| count.to_string())
///     .equality(Structural)
///     .on_error(|_: &FeatureError| Reducer::identity())
///     .storage_retry(RetryPolicy::none())
///     .build()
///     .expect("all required parts are set");
///
/// assert_eq!(configuration.name(), "counter");
/// ```
pub struct ConfigurationBuilder<S, M> {
    name: Option<String>,
    features: Vec<Arc<dyn Feature<S>>>,
    storage: Option<Arc<dyn Storage<S>>>,
    converter: Option<Arc<dyn StateConverter<S, M>>>,
    cleaner: Option<Arc<dyn TransientCleaner<S>>>,
    equality: Option<Arc<dyn StateEquality<S>>>,
    error_factory: Option<Arc<dyn ErrorReducerFactory<S>>>,
    storage_retry: RetryPolicy,
}

impl<S, M> Default for ConfigurationBuilder<S, M> {
    fn default() -> Self {
        Self {
            name: None,
            features: Vec::new(),
            storage: None,
            converter: None,
            cleaner: None,
            equality: None,
            error_factory: None,
            storage_retry: RetryPolicy::default(),
        }
    }
}

impl<S, M> ConfigurationBuilder<S, M>
where
    S: 'static,
    M: 'static,
{
    /// Set the run name used to tag logs (default `"engine"`).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a feature.
    ///
    /// Features are shared: keep a clone of the `Arc` to trigger events.
    #[must_use]
    pub fn feature(mut self, feature: Arc<dyn Feature<S>>) -> Self {
        self.features.push(feature);
        self
    }

    /// Add several features.
    #[must_use]
    pub fn features(mut self, features: impl IntoIterator<Item = Arc<dyn Feature<S>>>) -> Self {
        self.features.extend(features);
        self
    }

    /// Set the storage providing the initial state and receiving every
    /// emitted state.
    #[must_use]
    pub fn storage(mut self, storage: impl Storage<S> + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Set the state-to-model converter.
    #[must_use]
    pub fn converter(mut self, converter: impl StateConverter<S, M> + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Set the transient cleaner (default [`KeepAll`]).
    #[must_use]
    pub fn cleaner(mut self, cleaner: impl TransientCleaner<S> + 'static) -> Self {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    /// Set the state equality (default [`NeverEqual`]).
    #[must_use]
    pub fn equality(mut self, equality: impl StateEquality<S> + 'static) -> Self {
        self.equality = Some(Arc::new(equality));
        self
    }

    /// Set the factory turning dead feature streams into reducers.
    #[must_use]
    pub fn on_error(mut self, factory: impl ErrorReducerFactory<S> + 'static) -> Self {
        self.error_factory = Some(Arc::new(factory));
        self
    }

    /// Set the retry policy for storage operations.
    #[must_use]
    pub fn storage_retry(mut self, policy: RetryPolicy) -> Self {
        self.storage_retry = policy;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::Missing`] if storage, converter or error
    ///   factory was never set
    /// - [`ConfigurationError::DuplicateFeature`] if two features share a name
    pub fn build(self) -> Result<Configuration<S, M>, ConfigurationError> {
        let storage = self.storage.ok_or(ConfigurationError::Missing("storage"))?;
        let converter = self
            .converter
            .ok_or(ConfigurationError::Missing("state converter"))?;
        let error_factory = self
            .error_factory
            .ok_or(ConfigurationError::Missing("error reducer factory"))?;

        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.name()) {
                return Err(ConfigurationError::DuplicateFeature(
                    feature.name().to_string(),
                ));
            }
        }

        Ok(Configuration {
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            features: self.features,
            storage,
            converter,
            cleaner: self.cleaner.unwrap_or_else(|| Arc::new(KeepAll)),
            equality: self.equality.unwrap_or_else(|| Arc::new(NeverEqual)),
            error_factory,
            storage_retry: self.storage_retry,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::feature::SingleResultFeature;
    use crate::storage::MemoryStorage;
    use statefold_core::{FeatureError, Reducer};

    fn named(name: &str) -> Arc<dyn Feature<i32>> {
        Arc::new(SingleResultFeature::new(name, |_: ()| {
            Reducer::<i32>::identity()
        }))
    }

    fn complete() -> ConfigurationBuilder<i32, i32> {
        Configuration::builder()
            .storage(MemoryStorage::new(0))
            .converter(|state: &i32| *state)
            .on_error(|_: &FeatureError| Reducer::identity())
    }

    #[test]
    fn complete_builder_uses_defaults() {
        let configuration = complete().build().unwrap();

        assert_eq!(configuration.name(), DEFAULT_NAME);
        assert_eq!(configuration.feature_names().count(), 0);
        assert_eq!(configuration.storage_retry(), &RetryPolicy::default());
    }

    #[test]
    fn missing_storage_is_rejected() {
        let result = Configuration::<i32, i32>::builder()
            .converter(|state: &i32| *state)
            .on_error(|_: &FeatureError| Reducer::identity())
            .build();

        assert_eq!(result.unwrap_err(), ConfigurationError::Missing("storage"));
    }

    #[test]
    fn missing_converter_is_rejected() {
        let result = Configuration::<i32, i32>::builder()
            .storage(MemoryStorage::new(0))
            .on_error(|_: &FeatureError| Reducer::identity())
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::Missing("state converter")
        );
    }

    #[test]
    fn missing_error_factory_is_rejected() {
        let result = Configuration::<i32, i32>::builder()
            .storage(MemoryStorage::new(0))
            .converter(|state: &i32| *state)
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::Missing("error reducer factory")
        );
    }

    #[test]
    fn duplicate_feature_names_are_rejected() {
        let result = complete()
            .feature(named("load"))
            .feature(named("open"))
            .feature(named("load"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateFeature("load".to_string())
        );
    }

    #[test]
    fn features_keep_registration_order() {
        let configuration = complete()
            .name("tasks")
            .features([named("b"), named("a")])
            .build()
            .unwrap();

        assert_eq!(configuration.name(), "tasks");
        assert_eq!(configuration.feature_names().collect::<Vec<_>>(), ["b", "a"]);
        assert!(format!("{configuration:?}").contains("\"b\""));
    }
}
