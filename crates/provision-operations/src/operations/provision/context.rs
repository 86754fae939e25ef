use std::rc::Rc;

use crate::traits::{Notifier, ObjectStore, RecordStore};

/// Collaborators shared by every provisioning step.
pub struct ProvisionContext<R, O, N> {
    records: Rc<R>,
    objects: Rc<O>,
    notifier: Rc<N>,
}

impl<R, O, N> Clone for ProvisionContext<R, O, N> {
    fn clone(&self) -> Self {
        Self {
            records: Rc::clone(&self.records),
            objects: Rc::clone(&self.objects),
            notifier: Rc::clone(&self.notifier),
        }
    }
}

impl<R, O, N> ProvisionContext<R, O, N>
where
    R: RecordStore,
    O: ObjectStore,
    N: Notifier,
{
    pub fn new(records: Rc<R>, objects: Rc<O>, notifier: Rc<N>) -> Self {
        Self {
            records,
            objects,
            notifier,
        }
    }

    #[must_use]
    pub fn records(&self) -> &R {
        &self.records
    }

    #[must_use]
    pub fn objects(&self) -> &O {
        &self.objects
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}
