//! Filter Registry: name-to-filter lookup plus the default filter list.

use super::camelcase::CamelCaseFilter;
use super::esm::EsmFilter;
use super::functions::FunctionsFilter;
use super::returns::ReturnFilter;
use super::{Filter, FilterFactory};
use crate::error::{ConvertError, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Filters used when the options name none, outermost first.
pub const DEFAULT_FILTERS: &[&str] = &["functions", "esm", "return"];

static BUILTIN: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::builtin()));

pub struct Registry {
    factories: FxHashMap<&'static str, FilterFactory>,
    defaults: Vec<&'static str>,
}

impl Registry {
    /// A registry with no filters and an empty default list.
    pub fn empty() -> Self {
        Registry {
            factories: FxHashMap::default(),
            defaults: Vec::new(),
        }
    }

    /// A registry holding the built-in filters.
    pub fn builtin() -> Self {
        let mut registry = Registry::empty();
        registry.register("functions", || Box::new(FunctionsFilter::new()));
        registry.register("esm", || Box::new(EsmFilter::new()));
        registry.register("return", || Box::new(ReturnFilter::new()));
        registry.register("camelcase", || Box::new(CamelCaseFilter::new()));
        registry.defaults = DEFAULT_FILTERS.to_vec();
        registry
    }

    /// The process-wide registry of built-in filters. Initialized on first use
    /// and read-only afterwards.
    pub fn global() -> Arc<Registry> {
        Arc::clone(&BUILTIN)
    }

    pub fn register<F>(&mut self, name: &'static str, factory: F)
    where
        F: Fn() -> Box<dyn Filter> + Send + Sync + 'static,
    {
        self.factories.insert(name, Arc::new(factory));
    }

    /// Replace the default list. Unknown names surface when the defaults are
    /// instantiated.
    pub fn set_defaults(&mut self, names: &[&'static str]) {
        self.defaults = names.to_vec();
    }

    pub fn defaults(&self) -> &[&'static str] {
        &self.defaults
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Filter>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConvertError::UnknownFilter {
                name: name.to_string(),
            })
    }

    pub fn create_defaults(&self) -> Result<Vec<Box<dyn Filter>>> {
        self.defaults.iter().map(|name| self.create(name)).collect()
    }
}
