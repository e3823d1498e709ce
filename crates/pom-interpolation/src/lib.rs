//! Placeholder interpolation for project models.
//!
//! Replaces `${key}` tokens with values looked up across an ordered list of
//! sources. Values may themselves contain placeholders; resolution recurses
//! with a key stack so that self-referencing chains are reported as cycles
//! instead of looping.

mod config;
mod parser;
mod result;

pub use config::{InterpolationMode, InterpolatorConfig, DEFAULT_MAX_DEPTH};
pub use parser::{has_placeholders, parse_template, referenced_keys, Segment};
pub use result::{InterpolationError, UnresolvedPlaceholder};

use indexmap::IndexMap;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// A read-only key/value lookup consulted during interpolation
pub trait ValueSource {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl ValueSource for IndexMap<String, String> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl ValueSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

/// Resolves placeholders against its sources, first match wins.
///
/// One interpolator is meant for one resolution pass: resolved keys are
/// cached and lenient-mode misses are accumulated for the caller.
pub struct Interpolator<'a> {
    sources: Vec<&'a dyn ValueSource>,
    config: InterpolatorConfig,
    cache: HashMap<String, String>,
    unresolved: Vec<UnresolvedPlaceholder>,
    reported: HashSet<UnresolvedPlaceholder>,
}

impl<'a> Interpolator<'a> {
    pub fn new(config: InterpolatorConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
            cache: HashMap::new(),
            unresolved: Vec::new(),
            reported: HashSet::new(),
        }
    }

    /// Append a source; earlier sources take precedence
    pub fn with_source(mut self, source: &'a dyn ValueSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    /// Placeholders left unresolved so far (lenient mode)
    pub fn unresolved(&self) -> &[UnresolvedPlaceholder] {
        &self.unresolved
    }

    pub fn take_unresolved(&mut self) -> Vec<UnresolvedPlaceholder> {
        self.reported.clear();
        std::mem::take(&mut self.unresolved)
    }

    /// Interpolate one string; `location` labels diagnostics.
    pub fn interpolate(&mut self, input: &str, location: &str) -> Result<String, InterpolationError> {
        let mut stack = Vec::new();
        self.render(input, location, &mut stack)
    }

    /// Interpolate every string inside a JSON tree in place.
    ///
    /// Object keys are never interpolated. Returns the number of strings
    /// that changed.
    pub fn interpolate_value(&mut self, value: &mut Value) -> Result<usize, InterpolationError> {
        let mut changed = 0;
        self.walk(value, String::new(), &mut changed)?;
        Ok(changed)
    }

    fn walk(&mut self, value: &mut Value, path: String, changed: &mut usize) -> Result<(), InterpolationError> {
        match value {
            Value::String(s) => {
                let rendered = self.interpolate(s, &path)?;
                if rendered != *s {
                    *s = rendered;
                    *changed += 1;
                }
            }
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.walk(val, current_path, changed)?;
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    self.walk(val, format!("{}[{}]", path, i), changed)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Substitute until the text is stable. Literal text next to a
    /// substituted value can form a new token (`$` + `{key}`), so every
    /// changed result is scanned again.
    fn render(
        &mut self,
        input: &str,
        location: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, InterpolationError> {
        let mut current = input.to_string();
        let mut passes = 0;
        while has_placeholders(&current) {
            let next = self.render_once(&current, location, stack)?;
            if next == current {
                break;
            }
            passes += 1;
            if passes > self.config.max_depth {
                return Err(InterpolationError::TooDeep {
                    expression: input.to_string(),
                    max_depth: self.config.max_depth,
                });
            }
            current = next;
        }
        Ok(current)
    }

    fn render_once(
        &mut self,
        input: &str,
        location: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, InterpolationError> {
        let mut out = String::with_capacity(input.len());
        for segment in parse_template(input) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { expression, raw } => {
                    match self.resolve_key(expression, location, stack)? {
                        Some(value) => out.push_str(&value),
                        None => match self.config.mode {
                            InterpolationMode::Strict => {
                                return Err(InterpolationError::UnresolvedReference {
                                    expression: expression.to_string(),
                                    location: location.to_string(),
                                });
                            }
                            InterpolationMode::Lenient => {
                                self.report(expression, location);
                                out.push_str(raw);
                            }
                        },
                    }
                }
            }
        }
        Ok(out)
    }

    fn resolve_key(
        &mut self,
        key: &str,
        location: &str,
        stack: &mut Vec<String>,
    ) -> Result<Option<String>, InterpolationError> {
        if let Some(cached) = self.cache.get(key).cloned() {
            // Lenient leftovers are reported again for every new location
            for expression in referenced_keys(&cached) {
                self.report(expression, location);
            }
            return Ok(Some(cached));
        }

        if let Some(pos) = stack.iter().position(|k| k == key) {
            let mut path = stack[pos..].to_vec();
            path.push(key.to_string());
            return Err(InterpolationError::CyclicReference { path });
        }

        if stack.len() >= self.config.max_depth {
            return Err(InterpolationError::TooDeep {
                expression: key.to_string(),
                max_depth: self.config.max_depth,
            });
        }

        let Some(raw) = self.lookup(key) else {
            return Ok(None);
        };

        stack.push(key.to_string());
        let resolved = self.render(&raw, location, stack);
        stack.pop();

        let resolved = resolved?;
        self.cache.insert(key.to_string(), resolved.clone());
        Ok(Some(resolved))
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.lookup(key).map(Cow::into_owned))
    }

    fn report(&mut self, expression: &str, location: &str) {
        let entry = UnresolvedPlaceholder {
            expression: expression.to_string(),
            location: location.to_string(),
        };
        if self.reported.insert(entry.clone()) {
            self.unresolved.push(entry);
        }
    }
}
