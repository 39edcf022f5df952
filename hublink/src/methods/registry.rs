//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use super::{MethodHandler, UserContext};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A handler and the context registered with it.
#[derive(Clone)]
pub struct Registration {
    /// The callback
    pub handler: Arc<dyn MethodHandler>,
    /// Caller-supplied context, passed through unmodified
    pub context: Option<UserContext>,
}

impl Registration {
    /// Creates a registration.
    pub fn new(handler: Arc<dyn MethodHandler>, context: Option<UserContext>) -> Self {
        Self { handler, context }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Method-name to handler table plus the optional default handler.
///
/// Plain data: the dispatcher provides the locking.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    named: HashMap<String, Registration>,
    default: Option<Registration>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `registration` under `name`, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, registration: Registration) -> Option<Registration> {
        self.named.insert(name.into(), registration)
    }

    /// Removes the handler registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Registration> {
        self.named.remove(name)
    }

    /// Sets or clears the default handler, returning the previous one.
    pub fn set_default(&mut self, registration: Option<Registration>) -> Option<Registration> {
        std::mem::replace(&mut self.default, registration)
    }

    /// Named handler for `name`, falling back to the default handler.
    pub fn lookup(&self, name: &str) -> Option<Registration> {
        self.named.get(name).or(self.default.as_ref()).cloned()
    }

    /// Returns `true` if `name` has a named registration.
    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Returns `true` if a default handler is set.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Active registrations, the default handler included.
    pub fn len(&self) -> usize {
        self.named.len() + usize::from(self.default.is_some())
    }

    /// Returns `true` when neither named nor default handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.default.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{MethodResponse, method_handler};

    fn registration(status: i32) -> Registration {
        Registration::new(
            method_handler(move |_, _| async move { Ok(MethodResponse::new(status)) }),
            None,
        )
    }

    #[test]
    fn test_named_and_default_share_count() {
        let mut registry = MethodRegistry::new();
        assert!(registry.is_empty());

        registry.insert("reboot", registration(200));
        registry.set_default(Some(registration(404)));
        assert_eq!(registry.len(), 2);

        registry.remove("reboot");
        assert!(!registry.is_empty());
        registry.set_default(None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = MethodRegistry::new();
        assert!(registry.insert("reboot", registration(200)).is_none());
        assert!(registry.insert("reboot", registration(201)).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive_and_falls_back() {
        let mut registry = MethodRegistry::new();
        registry.insert("Reboot", registration(200));
        assert!(registry.lookup("Reboot").is_some());
        assert!(registry.lookup("reboot").is_none());

        registry.set_default(Some(registration(404)));
        assert!(registry.lookup("reboot").is_some());
        assert!(registry.contains("Reboot"));
        assert!(registry.has_default());
    }
}
