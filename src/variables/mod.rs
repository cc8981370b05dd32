//! Shared variable store
//!
//! Values extracted from responses are saved here and substituted into later
//! requests through `{{name}}` placeholders.

mod directive;

pub use directive::SaveDirective;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Variable holding the authorization token
pub const TOKEN_VARIABLE: &str = "token";

/// Build the `{{name}}` placeholder for a variable
pub fn placeholder(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Name/value mapping shared by every concurrently running routine
#[derive(Debug, Default)]
pub struct VariableStore {
    known: Vec<String>,
    values: RwLock<HashMap<String, Value>>,
}

impl VariableStore {
    /// Create a store that recognizes the given variable names
    pub fn new(known: Vec<String>) -> Self {
        Self {
            known,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn known_keys(&self) -> &[String] {
        &self.known
    }

    /// Save a value. Empty names and `null` values are ignored.
    pub fn save(&self, name: &str, value: Value) -> bool {
        if name.is_empty() || value.is_null() {
            return false;
        }
        debug!("Saving variable {}", name);
        self.values.write().insert(name.to_string(), value);
        true
    }

    /// Whether `{{name}}` would be replaced when rendering known keys
    pub fn is_substitutable(&self, name: &str) -> bool {
        self.known.iter().any(|k| k == name)
            && matches!(self.values.read().get(name), Some(Value::String(_)))
    }

    /// Replace placeholders with stored string values.
    ///
    /// With `only_known_keys` only the recognized names are candidates,
    /// otherwise every stored name is. Placeholders for absent names or
    /// non-string values are left as they are.
    pub fn render(&self, template: &str, only_known_keys: bool) -> String {
        if !template.contains("{{") {
            return template.to_string();
        }

        let values = self.values.read();
        let mut rendered = template.to_string();

        let mut substitute = |name: &str| {
            if let Some(Value::String(value)) = values.get(name) {
                rendered = rendered.replace(&placeholder(name), value);
            }
        };

        if only_known_keys {
            self.known.iter().for_each(|name| substitute(name.as_str()));
        } else {
            values.keys().for_each(|name| substitute(name.as_str()));
        }

        rendered
    }

    /// Copy of every saved variable
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
impl VariableStore {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> VariableStore {
        VariableStore::new(vec!["token".into(), "user_id".into(), "count".into()])
    }

    #[test]
    fn test_save_ignores_empty_name_and_null() {
        let store = store();
        assert!(!store.save("", json!("x")));
        assert!(!store.save("token", Value::Null));
        assert!(store.is_empty());

        assert!(store.save("token", json!("abc")));
        assert!(store.save("token", json!("def")));
        assert_eq!(store.get("token"), Some(json!("def")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_render_unset_placeholder_untouched() {
        let store = store();
        assert_eq!(store.render(&placeholder(TOKEN_VARIABLE), true), "{{token}}");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let store = store();
        store.save("user_id", json!("42"));
        assert_eq!(
            store.render("/users/{{user_id}}/friends/{{user_id}}", true),
            "/users/42/friends/42"
        );
    }

    #[test]
    fn test_render_skips_non_string_values() {
        let store = store();
        store.save("count", json!(3));
        assert_eq!(store.render("n={{count}}", true), "n={{count}}");
        assert!(!store.is_substitutable("count"));
    }

    #[test]
    fn test_render_only_known_keys() {
        let store = store();
        store.save("session", json!("s-1"));

        assert_eq!(store.render("{{session}}", true), "{{session}}");
        assert_eq!(store.render("{{session}}", false), "s-1");
    }

    #[test]
    fn test_is_substitutable() {
        let store = store();
        assert!(!store.is_substitutable("token"));
        store.save("token", json!("abc"));
        assert!(store.is_substitutable("token"));
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        store.save(&format!("var_{i}_{j}"), json!(j));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
        assert_eq!(store.snapshot().len(), 800);
    }
}
