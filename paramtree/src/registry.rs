//! Registry of editors keyed by binding type id.
//!
//! The registry is generic over the editor specification, so the same lookup serves any
//! front end. This is the only place where bindings are looked up by their type id string.

use std::rc::Rc;

/// No editor is registered for a type id.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no editor registered for type {0:?}")]
pub struct EditorNotFound(pub String);

/// Answers whether a type id has an editor.
pub trait EditorLookup {
    fn has_editor(&self, type_id: &str) -> bool;
}

/// Maps binding type ids to editor specifications. Several type ids may share one specification.
pub struct EditorRegistry<E> {
    editors: hashbrown::HashMap<String, Rc<E>>,
}

impl<E> Default for EditorRegistry<E> {
    fn default() -> Self {
        Self {
            editors: Default::default(),
        }
    }
}

impl<E> EditorRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `spec` for `type_id`, replacing any earlier registration. Returns the shared
    /// specification so that it can be registered for other type ids too.
    pub fn register(&mut self, type_id: impl Into<String>, spec: E) -> Rc<E> {
        let spec = Rc::new(spec);
        self.register_shared(type_id, spec.clone());
        spec
    }

    /// Registers an already shared specification for `type_id`.
    pub fn register_shared(&mut self, type_id: impl Into<String>, spec: Rc<E>) {
        let type_id = type_id.into();
        if self.editors.insert(type_id.clone(), spec).is_some() {
            log::debug!("Replaced editor for type {type_id:?}.");
        }
    }

    /// Makes `type_id` use the same editor as `existing`.
    pub fn alias(
        &mut self,
        type_id: impl Into<String>,
        existing: &str,
    ) -> Result<Rc<E>, EditorNotFound> {
        let spec = self.resolve(existing)?;
        self.register_shared(type_id, spec.clone());
        Ok(spec)
    }

    pub fn resolve(&self, type_id: &str) -> Result<Rc<E>, EditorNotFound> {
        self.editors
            .get(type_id)
            .cloned()
            .ok_or_else(|| EditorNotFound(type_id.to_owned()))
    }

    pub fn has_editor(&self, type_id: &str) -> bool {
        self.editors.contains_key(type_id)
    }

    /// Registered type ids, in no particular order.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.editors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}

impl<E> EditorLookup for EditorRegistry<E> {
    fn has_editor(&self, type_id: &str) -> bool {
        EditorRegistry::has_editor(self, type_id)
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[derive(Debug, Eq, PartialEq)]
    struct FakeEditor(&'static str);

    #[gtest]
    fn test_register_and_resolve() -> Result<()> {
        let mut registry = EditorRegistry::new();
        registry.register("java.lang.Integer", FakeEditor("number"));

        let editor = registry.resolve("java.lang.Integer")?;
        expect_that!(editor.as_ref(), eq(&FakeEditor("number")));
        expect_that!(registry.has_editor("java.lang.Integer"), is_true());
        expect_that!(registry.has_editor("int"), is_false());
        expect_that!(
            registry.resolve("int"),
            err(eq(&EditorNotFound("int".into())))
        );
        Ok(())
    }

    #[gtest]
    fn test_alias_shares_editor() -> Result<()> {
        let mut registry = EditorRegistry::new();
        let number = registry.register("java.lang.Integer", FakeEditor("number"));
        registry.alias("int", "java.lang.Integer")?;

        expect_that!(Rc::ptr_eq(&registry.resolve("int")?, &number), is_true());
        expect_that!(registry.len(), eq(2));
        Ok(())
    }

    #[gtest]
    fn test_alias_to_unknown_type_fails() {
        let mut registry = EditorRegistry::<FakeEditor>::new();
        expect_that!(
            registry.alias("int", "java.lang.Integer"),
            err(eq(&EditorNotFound("java.lang.Integer".into())))
        );
        expect_that!(registry.is_empty(), is_true());
    }
}
