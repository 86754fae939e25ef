use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::error::ProvisionFault;
use crate::traits::{Notifier, ObjectStore, RecordStore};
use crate::types::{
    Container, Notification, ObjectPayload, Released, StoredObject, UserData, UserRecord,
};

/// A collaborator call that can be journaled or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateRecord,
    DeleteRecord,
    CreateContainer,
    DeleteContainer,
    UploadObject,
    DeleteObject,
    Publish,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateRecord => "create_record",
            Self::DeleteRecord => "delete_record",
            Self::CreateContainer => "create_container",
            Self::DeleteContainer => "delete_container",
            Self::UploadObject => "upload_object",
            Self::DeleteObject => "delete_object",
            Self::Publish => "publish",
        }
    }

    /// True for calls that undo an earlier call.
    #[must_use]
    pub const fn is_compensation(self) -> bool {
        matches!(
            self,
            Self::DeleteRecord | Self::DeleteContainer | Self::DeleteObject
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an injected failure manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    /// The call returns a modeled error.
    #[default]
    Error,
    /// The call panics, breaking the total-result contract.
    Panic,
}

/// One collaborator call and the resource it addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub target: String,
}

impl Call {
    fn new(operation: Operation, target: impl Into<String>) -> Self {
        Self {
            operation,
            target: target.into(),
        }
    }
}

/// Ordered record of every call made to the in-memory collaborators.
///
/// Calls are recorded when they start, so a call that fails or panics
/// still shows up.
#[derive(Debug, Clone, Default)]
pub struct CallJournal(Rc<RefCell<Vec<Call>>>);

impl CallJournal {
    fn record(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.0.borrow().iter().map(|call| call.operation).collect()
    }

    /// Only the calls that undo earlier calls, in call order.
    #[must_use]
    pub fn compensations(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|call| call.operation.is_compensation())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
struct Simulation {
    faults: Rc<HashMap<Operation, FaultKind>>,
    latency: Duration,
    journal: CallJournal,
}

impl Simulation {
    /// Journal the call and apply latency. Returns true when the call must
    /// report a modeled failure.
    async fn enter(&self, operation: Operation, target: &str) -> bool {
        self.journal.record(Call::new(operation, target));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.faults.get(&operation) {
            Some(FaultKind::Panic) => panic!("injected defect in {operation} for '{target}'"),
            Some(FaultKind::Error) => {
                debug!(%operation, resource = target, "injecting failure");
                true
            }
            None => false,
        }
    }
}

/// Factory for in-memory collaborators sharing one fault plan and journal.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    faults: HashMap<Operation, FaultKind>,
    latency: Duration,
    journal: CallJournal,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every call to `operation` fail with `kind`.
    #[must_use]
    pub fn with_fault(mut self, operation: Operation, kind: FaultKind) -> Self {
        self.faults.insert(operation, kind);
        self
    }

    #[must_use]
    pub fn journal(&self) -> CallJournal {
        self.journal.clone()
    }

    #[must_use]
    pub fn record_store(&self) -> InMemoryRecordStore {
        InMemoryRecordStore::new(self.simulation())
    }

    #[must_use]
    pub fn object_store(&self) -> InMemoryObjectStore {
        InMemoryObjectStore::new(self.simulation())
    }

    #[must_use]
    pub fn notifier(&self) -> InMemoryNotifier {
        InMemoryNotifier::new(self.simulation())
    }

    fn simulation(&self) -> Simulation {
        Simulation {
            faults: Rc::new(self.faults.clone()),
            latency: self.latency,
            journal: self.journal.clone(),
        }
    }
}

#[derive(Debug)]
pub struct InMemoryRecordStore {
    simulation: Simulation,
    records: RefCell<BTreeMap<String, UserRecord>>,
    next_id: Cell<u32>,
}

impl InMemoryRecordStore {
    fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            records: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }

    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<UserRecord> {
        self.records.borrow().get(user_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn create_record(&self, user: &UserData) -> Result<UserRecord> {
        if self
            .simulation
            .enter(Operation::CreateRecord, &user.email)
            .await
        {
            return Err(ProvisionFault::RecordRejected {
                email: user.email.clone(),
            });
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let record = UserRecord {
            user_id: format!("u{id:04}"),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        debug!(user_id = %record.user_id, email = %record.email, "stored user record");
        self.records
            .borrow_mut()
            .insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    async fn delete_record(&self, user_id: &str) -> Result<Released> {
        if self.simulation.enter(Operation::DeleteRecord, user_id).await {
            return Err(ProvisionFault::ReleaseRejected {
                kind: "record",
                id: user_id.to_string(),
            });
        }

        self.records
            .borrow_mut()
            .remove(user_id)
            .ok_or_else(|| ProvisionFault::NotFound {
                kind: "record",
                id: user_id.to_string(),
            })?;
        debug!(user_id, "deleted user record");
        Ok(Released::new("user record deleted"))
    }
}

type Objects = BTreeMap<String, Vec<u8>>;

#[derive(Debug)]
pub struct InMemoryObjectStore {
    simulation: Simulation,
    containers: RefCell<BTreeMap<String, Objects>>,
    next_object: Cell<u32>,
}

impl InMemoryObjectStore {
    fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            containers: RefCell::new(BTreeMap::new()),
            next_object: Cell::new(1),
        }
    }

    #[must_use]
    pub fn container_names(&self) -> Vec<String> {
        self.containers.borrow().keys().cloned().collect()
    }

    /// Stored body of an object.
    #[must_use]
    pub fn object(&self, container: &str, object_id: &str) -> Option<Vec<u8>> {
        self.containers
            .borrow()
            .get(container)
            .and_then(|objects| objects.get(object_id))
            .cloned()
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.containers.borrow().values().map(BTreeMap::len).sum()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn create_container(&self, name: &str) -> Result<Container> {
        let unavailable = || ProvisionFault::ContainerUnavailable {
            container: name.to_string(),
        };
        if self.simulation.enter(Operation::CreateContainer, name).await {
            return Err(unavailable());
        }

        let mut containers = self.containers.borrow_mut();
        if containers.contains_key(name) {
            return Err(unavailable());
        }
        containers.insert(name.to_string(), Objects::new());
        debug!(container = name, "created container");
        Ok(Container {
            name: name.to_string(),
        })
    }

    async fn delete_container(&self, name: &str) -> Result<Released> {
        if self.simulation.enter(Operation::DeleteContainer, name).await {
            return Err(ProvisionFault::ReleaseRejected {
                kind: "container",
                id: name.to_string(),
            });
        }

        self.containers
            .borrow_mut()
            .remove(name)
            .ok_or_else(|| ProvisionFault::NotFound {
                kind: "container",
                id: name.to_string(),
            })?;
        debug!(container = name, "deleted container");
        Ok(Released::new("container deleted"))
    }

    async fn upload_object(
        &self,
        container: &str,
        payload: &ObjectPayload,
    ) -> Result<StoredObject> {
        if self.simulation.enter(Operation::UploadObject, container).await {
            return Err(ProvisionFault::UploadRejected {
                container: container.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let body = serde_json::to_vec(payload).map_err(|source| ProvisionFault::UploadRejected {
            container: container.to_string(),
            reason: source.to_string(),
        })?;

        let mut containers = self.containers.borrow_mut();
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| ProvisionFault::NotFound {
                kind: "container",
                id: container.to_string(),
            })?;

        let id = self.next_object.get();
        self.next_object.set(id + 1);
        let object_id = format!("obj-{id:04}");
        debug!(container, object_id = %object_id, bytes = body.len(), "uploaded object");
        objects.insert(object_id.clone(), body);
        Ok(StoredObject { object_id })
    }

    async fn delete_object(&self, container: &str, object_id: &str) -> Result<Released> {
        let target = format!("{container}/{object_id}");
        if self.simulation.enter(Operation::DeleteObject, &target).await {
            return Err(ProvisionFault::ReleaseRejected {
                kind: "object",
                id: target,
            });
        }

        self.containers
            .borrow_mut()
            .get_mut(container)
            .and_then(|objects| objects.remove(object_id))
            .ok_or(ProvisionFault::NotFound {
                kind: "object",
                id: target,
            })?;
        debug!(container, object_id, "deleted object");
        Ok(Released::new("object deleted"))
    }
}

#[derive(Debug)]
pub struct InMemoryNotifier {
    simulation: Simulation,
    published: RefCell<Vec<Notification>>,
}

impl InMemoryNotifier {
    fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            published: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn published(&self) -> Vec<Notification> {
        self.published.borrow().clone()
    }
}

impl Notifier for InMemoryNotifier {
    async fn publish(&self, notification: &Notification) -> Result<Released> {
        if self
            .simulation
            .enter(Operation::Publish, &notification.user_id)
            .await
        {
            return Err(ProvisionFault::PublishRejected {
                user_id: notification.user_id.clone(),
            });
        }

        self.published.borrow_mut().push(notification.clone());
        debug!(
            user_id = %notification.user_id,
            object_id = %notification.object_id,
            "published notification"
        );
        Ok(Released::new("notification published"))
    }
}
