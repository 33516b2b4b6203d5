use std::{cell::RefCell, rc::Rc};

use paramtree::{ParamId, Parameter};

use super::{Choices, EditorSpec};
use crate::{
    reference::{ReferenceCaches, ReferenceItem},
    services::ServiceError,
};

/// The editor of one value slot of a simple parameter.
///
/// The reference list is resolved once and kept until [EditorInstance::refresh].
pub struct EditorInstance {
    pub id: ParamId,
    pub index: usize,
    pub spec: Rc<EditorSpec>,
    memo: RefCell<Option<Rc<Vec<ReferenceItem>>>>,
}

impl EditorInstance {
    pub fn new(id: ParamId, index: usize, spec: Rc<EditorSpec>) -> Self {
        Self {
            id,
            index,
            spec,
            memo: RefCell::new(None),
        }
    }

    /// The full reference list of this editor, or `None` for editors without one.
    pub async fn items(
        &self,
        caches: &ReferenceCaches,
    ) -> Result<Option<Rc<Vec<ReferenceItem>>>, ServiceError> {
        let Some(source) = self.spec.source else {
            return Ok(None);
        };
        if let Some(items) = self.memo.borrow().clone() {
            return Ok(Some(items));
        }
        let items = caches.get(source.list()).await?;
        *self.memo.borrow_mut() = Some(items.clone());
        Ok(Some(items))
    }

    /// Choices for `param` derived from `items`, as returned by [EditorInstance::items].
    pub fn choices(&self, items: &[ReferenceItem], param: &Parameter) -> Option<Choices> {
        self.spec
            .source
            .map(|source| Choices::build(source, items, param))
    }

    /// Forgets the resolved list and invalidates the shared cache, so the next access fetches
    /// again.
    pub fn refresh(&self, caches: &ReferenceCaches) {
        self.memo.borrow_mut().take();
        if let Some(source) = self.spec.source {
            caches.invalidate(source.list());
        }
    }
}
