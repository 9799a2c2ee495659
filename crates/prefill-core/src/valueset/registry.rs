//! Value set registry
//!
//! Registration happens on a [`ValueRegistryBuilder`]; `freeze` turns it into
//! a read-only [`ValueRegistry`] that is shared behind an `Arc` and never
//! mutated again.

use super::definition::{ValueSetBundle, ValueSetDefinition};
use super::set::ValueSet;
use crate::error::{CoreError, Result};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Mutable registry used during the one-time load
#[derive(Debug, Clone, Default)]
pub struct ValueRegistryBuilder {
    /// Sets indexed by code, in registration order
    sets: IndexMap<String, ValueSet>,
    /// name -> code
    names: HashMap<String, String>,
    /// Bundle sources already applied
    loaded_sources: HashSet<String>,
}

impl ValueRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty value set.
    ///
    /// Fails with `DuplicateKey` when either the code or the name is taken.
    pub fn register(
        &mut self,
        code: &str,
        name: &str,
        oid: &str,
        description: &str,
        version: &str,
    ) -> Result<()> {
        if code.trim().is_empty() || name.trim().is_empty() {
            return Err(CoreError::InvalidEntry(
                "value set code and name must not be blank".to_string(),
            ));
        }
        if self.sets.contains_key(code) {
            return Err(CoreError::DuplicateKey(format!("value set code '{}'", code)));
        }
        if self.names.contains_key(name) {
            return Err(CoreError::DuplicateKey(format!("value set name '{}'", name)));
        }

        self.names.insert(name.to_string(), code.to_string());
        self.sets.insert(
            code.to_string(),
            ValueSet::new(code, name, oid, description, version),
        );
        Ok(())
    }

    /// Add a code to a registered set
    pub fn add_code(
        &mut self,
        value_set_code: &str,
        code: &str,
        display_name: &str,
        code_system: &str,
    ) -> Result<()> {
        if value_set_code.trim().is_empty() {
            return Err(CoreError::InvalidEntry(
                "value set code must not be blank".to_string(),
            ));
        }
        let set = self
            .sets
            .get_mut(value_set_code)
            .ok_or_else(|| CoreError::NotFound(format!("value set code '{}'", value_set_code)))?;
        set.add_code(code, display_name, code_system)
    }

    /// Apply one definition.
    ///
    /// A definition whose code and name both match an existing set is merged:
    /// codes already present are skipped, so re-applying the same data adds
    /// nothing. A partial collision (same code, other name or the reverse) is
    /// a `DuplicateKey`. Returns the number of codes added.
    pub fn load_definition(&mut self, definition: &ValueSetDefinition) -> Result<usize> {
        let same_set = self
            .sets
            .get(&definition.code)
            .map(|existing| existing.name == definition.name)
            .unwrap_or(false);

        if !same_set {
            self.register(
                &definition.code,
                &definition.name,
                &definition.oid,
                &definition.description,
                &definition.version,
            )?;
        }

        let mut added = 0;
        for code in &definition.codes {
            match self.add_code(
                &definition.code,
                &code.code,
                &code.display_name,
                &code.code_system,
            ) {
                Ok(()) => added += 1,
                Err(CoreError::DuplicateCode { .. }) => {
                    log::debug!(
                        "Code '{}' already present in value set '{}', skipping",
                        code.code,
                        definition.code
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Apply a whole bundle once, all or nothing.
    ///
    /// Returns `Ok(false)` without touching the registry when the bundle's
    /// source has already been applied. On error the registry is left as it
    /// was before the call.
    pub fn load_bundle(&mut self, bundle: &ValueSetBundle) -> Result<bool> {
        if self.loaded_sources.contains(&bundle.source) {
            log::debug!("Value set source '{}' already loaded", bundle.source);
            return Ok(false);
        }

        let mut staged = self.clone();
        let mut codes = 0;
        for definition in &bundle.value_sets {
            codes += staged.load_definition(definition)?;
        }
        staged.loaded_sources.insert(bundle.source.clone());
        *self = staged;

        log::info!(
            "Loaded {} value sets ({} codes) from '{}'",
            bundle.value_sets.len(),
            codes,
            bundle.source
        );
        Ok(true)
    }

    pub fn is_loaded(&self, source: &str) -> bool {
        self.loaded_sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Finish loading and produce the immutable registry
    pub fn freeze(self) -> Arc<ValueRegistry> {
        let mut by_code = IndexMap::with_capacity(self.sets.len());
        let mut by_name = HashMap::with_capacity(self.sets.len());

        for (code, set) in self.sets {
            let set = Arc::new(set);
            by_name.insert(set.name.clone(), Arc::clone(&set));
            by_code.insert(code, set);
        }

        Arc::new(ValueRegistry { by_code, by_name })
    }
}

/// Immutable registry of value sets, looked up by code or by name
#[derive(Debug, Default)]
pub struct ValueRegistry {
    by_code: IndexMap<String, Arc<ValueSet>>,
    by_name: HashMap<String, Arc<ValueSet>>,
}

impl ValueRegistry {
    /// Registry without any value set
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn by_code(&self, code: &str) -> Result<Arc<ValueSet>> {
        self.by_code
            .get(code)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("value set code '{}'", code)))
    }

    pub fn by_name(&self, name: &str) -> Result<Arc<ValueSet>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("value set name '{}'", name)))
    }

    /// Look a set up by name first, then by code
    pub fn lookup(&self, key: &str) -> Result<Arc<ValueSet>> {
        self.by_name
            .get(key)
            .or_else(|| self.by_code.get(key))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("value set '{}'", key)))
    }

    /// Membership test against a set identified by name or code.
    ///
    /// Unknown sets and unknown codes both answer `false`.
    pub fn is_member(&self, key: &str, code: &str, code_system: Option<&str>) -> bool {
        self.lookup(key)
            .map(|set| set.is_member(code, code_system))
            .unwrap_or(false)
    }

    /// All sets in registration order
    pub fn value_sets(&self) -> impl Iterator<Item = &Arc<ValueSet>> {
        self.by_code.values()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
