//! Dialect registry
//!
//! Maps product-identity prefixes to dialect descriptors. Two layers are kept:
//! the built-in vendors, fixed at construction, and custom overrides that an
//! embedding tool registers at runtime. Custom entries always win.
//!
//! Within one layer the longest matching key wins. Two distinct keys of the
//! same length cannot both be prefixes of one identity, so the result never
//! depends on map ordering.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::connection::Connection;
use crate::dialect::{ConstructError, Dialect, DialectError, Vendor};

/// Property prefix accepted by [`DialectRegistry::add_custom_property`].
pub const CUSTOM_DIALECT_PROPERTY_PREFIX: &str = "migration.dialect.";

/// Builds a dialect handler bound to a borrowed connection.
pub type DialectConstructor =
    for<'c> fn(&'c dyn Connection) -> Result<Box<dyn Dialect + 'c>, ConstructError>;

/// A dialect's availability in the registry.
#[derive(Clone)]
pub struct DialectDescriptor {
    match_key: String,
    type_name: String,
    constructor: DialectConstructor,
}

impl DialectDescriptor {
    pub fn new(
        match_key: impl Into<String>,
        type_name: impl Into<String>,
        constructor: DialectConstructor,
    ) -> Self {
        Self {
            match_key: match_key.into(),
            type_name: type_name.into(),
            constructor,
        }
    }

    /// Descriptor for a built-in vendor under its own key.
    pub fn builtin(vendor: Vendor) -> Self {
        Self::new(vendor.match_key(), vendor.type_name(), vendor.constructor())
    }

    pub fn match_key(&self) -> &str {
        &self.match_key
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn constructor(&self) -> DialectConstructor {
        self.constructor
    }

    /// Instantiate the handler bound to `connection`.
    pub fn construct<'c>(
        &self,
        connection: &'c dyn Connection,
    ) -> Result<Box<dyn Dialect + 'c>, DialectError> {
        (self.constructor)(connection).map_err(|source| DialectError::DialectConstruction {
            type_name: self.type_name.clone(),
            source,
        })
    }

    fn with_match_key(mut self, match_key: String) -> Self {
        self.match_key = match_key;
        self
    }
}

impl fmt::Debug for DialectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectDescriptor")
            .field("match_key", &self.match_key)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DialectDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.match_key == other.match_key && self.type_name == other.type_name
    }
}

impl Eq for DialectDescriptor {}

/// What a custom override is registered from.
#[derive(Debug, Clone)]
pub enum DescriptorSource {
    /// An already-built descriptor. Its match key is replaced by the
    /// registration key.
    Descriptor(DialectDescriptor),
    /// A handler name resolved through the registry's named handlers.
    Identifier(String),
}

impl From<DialectDescriptor> for DescriptorSource {
    fn from(descriptor: DialectDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<&str> for DescriptorSource {
    fn from(identifier: &str) -> Self {
        Self::Identifier(identifier.to_string())
    }
}

impl From<String> for DescriptorSource {
    fn from(identifier: String) -> Self {
        Self::Identifier(identifier)
    }
}

/// No handler is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no dialect handler named '{0}'")]
pub struct HandlerNotFound(pub String);

#[derive(Default)]
struct CustomState {
    custom: BTreeMap<String, DialectDescriptor>,
    named: BTreeMap<String, DialectConstructor>,
}

/// Registry of built-in and custom dialects.
///
/// All methods take `&self`; custom state sits behind a lock so one registry
/// can be shared between threads.
pub struct DialectRegistry {
    builtin: BTreeMap<String, DialectDescriptor>,
    state: RwLock<CustomState>,
}

impl DialectRegistry {
    /// Create a registry holding every built-in vendor.
    ///
    /// Built-in handlers are also available by type name (e.g. `H2Dialect`)
    /// for identifier-based overrides.
    pub fn new() -> Self {
        let mut registry = Self {
            builtin: BTreeMap::new(),
            state: RwLock::new(CustomState::default()),
        };
        for vendor in Vendor::iter() {
            registry.register_builtin(vendor.match_key(), DialectDescriptor::builtin(vendor));
            registry.register_named(vendor.type_name(), vendor.constructor());
        }
        registry
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> &'static DialectRegistry {
        static GLOBAL: OnceLock<DialectRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DialectRegistry::new)
    }

    pub(crate) fn register_builtin(&mut self, key: &str, descriptor: DialectDescriptor) {
        self.builtin.insert(key.to_string(), descriptor);
    }

    /// Make a handler available to identifier-based overrides.
    pub fn register_named(&self, identifier: impl Into<String>, constructor: DialectConstructor) {
        self.write().named.insert(identifier.into(), constructor);
    }

    /// Register or replace the custom override for `key`.
    ///
    /// An identifier that names no registered handler fails with
    /// [`DialectError::CustomDialectResolution`]; the registry is left
    /// unchanged in that case.
    pub fn add_custom(
        &self,
        key: impl Into<String>,
        source: impl Into<DescriptorSource>,
    ) -> Result<(), DialectError> {
        let key = key.into();
        let mut state = self.write();
        let descriptor = match source.into() {
            DescriptorSource::Descriptor(descriptor) => descriptor.with_match_key(key.clone()),
            DescriptorSource::Identifier(identifier) => match state.named.get(&identifier) {
                Some(constructor) => DialectDescriptor::new(key.clone(), &identifier, *constructor),
                None => {
                    return Err(DialectError::CustomDialectResolution {
                        source: HandlerNotFound(identifier.clone()),
                        key,
                        identifier,
                    });
                }
            },
        };

        tracing::info!(
            database = %key,
            handler = descriptor.type_name(),
            "registered custom dialect"
        );
        state.custom.insert(key, descriptor);
        Ok(())
    }

    /// Register an override from a property such as `migration.dialect.H2`.
    ///
    /// The prefix is stripped to obtain the database key; a property without
    /// it is used as the key directly.
    pub fn add_custom_property(&self, property: &str, identifier: &str) -> Result<(), DialectError> {
        let key = property
            .strip_prefix(CUSTOM_DIALECT_PROPERTY_PREFIX)
            .unwrap_or(property);
        self.add_custom(key, identifier)
    }

    /// Remove every custom override. Safe to call when there are none.
    pub fn clear_custom(&self) {
        let mut state = self.write();
        if !state.custom.is_empty() {
            tracing::info!(count = state.custom.len(), "cleared custom dialects");
            state.custom.clear();
        }
    }

    pub fn get_custom(&self, key: &str) -> Option<DialectDescriptor> {
        self.read().custom.get(key).cloned()
    }

    /// Resolve the descriptor for a product identity such as `"H2 1.4"`.
    pub fn lookup(&self, product_identity: &str) -> Result<DialectDescriptor, DialectError> {
        let state = self.read();
        longest_match(&state.custom, product_identity)
            .or_else(|| longest_match(&self.builtin, product_identity))
            .cloned()
            .ok_or_else(|| DialectError::UnsupportedDatabase {
                identity: product_identity.to_string(),
            })
    }

    /// Keys of the built-in vendors, in lexicographic order.
    pub fn builtin_keys(&self) -> impl Iterator<Item = &str> {
        self.builtin.keys().map(String::as_str)
    }

    fn read(&self) -> RwLockReadGuard<'_, CustomState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CustomState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("DialectRegistry")
            .field("builtin", &self.builtin.keys().collect::<Vec<_>>())
            .field("custom", &state.custom)
            .field("named", &state.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn longest_match<'m>(
    entries: &'m BTreeMap<String, DialectDescriptor>,
    product_identity: &str,
) -> Option<&'m DialectDescriptor> {
    entries
        .iter()
        .filter(|(key, _)| product_identity.starts_with(key.as_str()))
        .min_by_key(|(key, _)| Reverse(key.len()))
        .map(|(_, descriptor)| descriptor)
}
