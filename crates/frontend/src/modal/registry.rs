use super::controller::{FullscreenModal, ModalError};
use super::handlers::ModalOptions;
use crate::shared::dom::{DomError, DomHost};
use modal_contracts::markup::OPEN_CLASS;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// State shared between a registry and the modals it created.
pub(crate) struct RegistryShared<H: DomHost> {
    instances: RefCell<Vec<(H::Node, FullscreenModal<H>)>>,
    next_container: Cell<u64>,
    /// Shown modals; the document root keeps its open class while non-zero.
    shown: Cell<usize>,
}

impl<H: DomHost> RegistryShared<H> {
    pub(crate) fn acquire_root(&self, host: &H) -> Result<(), DomError> {
        let shown = self.shown.get();
        self.shown.set(shown + 1);
        if shown == 0 {
            host.add_class(&host.root()?, OPEN_CLASS)?;
        }
        Ok(())
    }

    pub(crate) fn release_root(&self, host: &H) -> Result<(), DomError> {
        let shown = self.shown.get().saturating_sub(1);
        self.shown.set(shown);
        if shown == 0 {
            host.remove_class(&host.root()?, OPEN_CLASS)?;
        }
        Ok(())
    }

    pub(crate) fn unregister(&self, modal: &FullscreenModal<H>) {
        let removed: Vec<_> = {
            let mut instances = self.instances.borrow_mut();
            let (gone, kept): (Vec<_>, Vec<_>) = instances
                .drain(..)
                .partition(|(_, m)| m.same_instance(modal));
            *instances = kept;
            gone
        };
        drop(removed);
    }
}

/// Binds content nodes to modals, at most one modal per node.
///
/// Also owns what the modals of one document share: container numbering and
/// the open class on the document root.
pub struct ModalRegistry<H: DomHost> {
    host: H,
    shared: Rc<RegistryShared<H>>,
}

impl<H: DomHost> ModalRegistry<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            shared: Rc::new(RegistryShared {
                instances: RefCell::new(Vec::new()),
                next_container: Cell::new(0),
                shown: Cell::new(0),
            }),
        }
    }

    /// Turns `content` into a fullscreen modal.
    ///
    /// Binding an already bound node returns its modal and ignores `options`.
    pub fn bind(
        &self,
        content: &H::Node,
        options: impl Into<ModalOptions>,
    ) -> Result<FullscreenModal<H>, ModalError> {
        if let Some(existing) = self.get(content) {
            log::debug!("{}: already bound", existing.container_id());
            return Ok(existing);
        }

        let index = self.shared.next_container.get();
        self.shared.next_container.set(index + 1);

        let modal = FullscreenModal::build(
            self.host.clone(),
            Rc::downgrade(&self.shared),
            content,
            options.into(),
            index,
        )?;
        self.shared
            .instances
            .borrow_mut()
            .push((content.clone(), modal.clone()));

        if let Err(e) = modal.start() {
            log::warn!("{}: setup failed: {}", modal.container_id(), e);
            if !modal.is_destroyed() {
                if let Err(cleanup) = modal.destroy() {
                    log::warn!(
                        "{}: cleanup after failed setup: {}",
                        modal.container_id(),
                        cleanup
                    );
                }
            }
            return Err(e);
        }
        Ok(modal)
    }

    pub fn get(&self, content: &H::Node) -> Option<FullscreenModal<H>> {
        self.shared
            .instances
            .borrow()
            .iter()
            .find(|(node, _)| node == content)
            .map(|(_, modal)| modal.clone())
    }

    pub fn len(&self) -> usize {
        self.shared.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Modals currently holding the document root open class.
    pub fn shown(&self) -> usize {
        self.shared.shown.get()
    }
}
