//! The module loader boundary.
//!
//! The engine never touches the filesystem; everything behind this trait is
//! the host's concern. Addresses carry the phase the module is loaded for,
//! and specifiers must embed it (`path:phase`).

use rustc_hash::FxHashMap;

use crate::error::SyntaxError;
use crate::scope::Phase;
use crate::transforms::{Context, CtValue};

/// A normalized module address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAddress {
    pub path: String,
    pub phase: Phase,
}

pub trait ModuleLoader {
    /// Normalize a specifier relative to the importing module. The specifier
    /// must carry phase information.
    fn normalize(
        &self,
        name: &str,
        referer_name: Option<&str>,
        referer_address: Option<&str>,
    ) -> Result<ModuleAddress, SyntaxError>;

    /// Fetch the source text at `address`, caching by path.
    fn fetch(&mut self, address: &ModuleAddress) -> Result<String, SyntaxError>;

    /// Evaluate compiled source for its compile-time value, with the store
    /// available for registration.
    fn eval(&mut self, source: &str, store: &mut Context) -> Result<CtValue, SyntaxError>;
}

/// Split a `path:phase` specifier.
pub fn split_phase(name: &str) -> Result<(&str, Phase), SyntaxError> {
    if let Some((path, phase)) = name.rsplit_once(':') {
        if !path.is_empty() {
            if let Ok(phase) = phase.parse::<Phase>() {
                return Ok((path, phase));
            }
        }
    }
    Err(SyntaxError::MissingPhase {
        name: name.to_string(),
    })
}

/// An in-memory loader backed by a path → source map. Tests and embedders
/// that preload their module graph use this directly.
#[derive(Default)]
pub struct MapLoader {
    sources: FxHashMap<String, String>,
    cache: FxHashMap<String, String>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }
}

impl ModuleLoader for MapLoader {
    fn normalize(
        &self,
        name: &str,
        _referer_name: Option<&str>,
        _referer_address: Option<&str>,
    ) -> Result<ModuleAddress, SyntaxError> {
        let (path, phase) = split_phase(name)?;
        Ok(ModuleAddress {
            path: path.to_string(),
            phase,
        })
    }

    fn fetch(&mut self, address: &ModuleAddress) -> Result<String, SyntaxError> {
        if let Some(src) = self.cache.get(&address.path) {
            return Ok(src.clone());
        }
        match self.sources.get(&address.path) {
            Some(src) => {
                self.cache.insert(address.path.clone(), src.clone());
                Ok(src.clone())
            }
            None => Err(SyntaxError::Fetch {
                address: address.path.clone(),
                message: "not in the preloaded module map".to_string(),
            }),
        }
    }

    fn eval(&mut self, _source: &str, _store: &mut Context) -> Result<CtValue, SyntaxError> {
        // In-memory modules carry no host evaluator.
        Ok(CtValue::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specifier_without_phase_is_rejected() {
        let loader = MapLoader::new();
        let err = loader.normalize("./macros", None, None);
        assert_eq!(
            err,
            Err(SyntaxError::MissingPhase {
                name: "./macros".to_string()
            })
        );
    }

    #[test]
    fn specifier_with_phase_normalizes() {
        let loader = MapLoader::new();
        let addr = loader.normalize("./macros:1", None, None).unwrap();
        assert_eq!(addr.path, "./macros");
        assert_eq!(addr.phase, 1);
    }

    #[test]
    fn fetch_is_cached() {
        let mut loader = MapLoader::new();
        loader.insert("./m", "syntax x = f");
        let addr = ModuleAddress {
            path: "./m".to_string(),
            phase: 1,
        };
        assert_eq!(loader.fetch(&addr).unwrap(), "syntax x = f");
        // A later removal does not invalidate the cache.
        loader.sources.clear();
        assert_eq!(loader.fetch(&addr).unwrap(), "syntax x = f");
    }

    #[test]
    fn missing_module_reports_fetch_error() {
        let mut loader = MapLoader::new();
        let addr = ModuleAddress {
            path: "./absent".to_string(),
            phase: 0,
        };
        assert!(matches!(
            loader.fetch(&addr),
            Err(SyntaxError::Fetch { .. })
        ));
    }
}
