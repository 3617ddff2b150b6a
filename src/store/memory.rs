/*!
 * In-Memory Repositories
 * DashMap-backed implementations of the store traits
 *
 * Used by tests, the `abac` binary and embedders without their own
 * persistence. Name uniqueness is enforced through the name map's entry lock,
 * so concurrent saves of one name cannot both succeed.
 */

use super::traits::{
    ConditionRepository, CurrentSubjectProvider, EffectRepository, PolicyRepository,
    SubjectDirectory,
};
use crate::authz::Owned;
use crate::condition::Condition;
use crate::core::{
    AccessType, ConditionId, EffectId, PolicyId, StoreError, StoreResult, SubjectId,
};
use crate::effect::Effect;
use crate::policy::Policy;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::hash::Hash;

/// A named, owned row
pub trait Record: Owned + Clone + Send + Sync {
    type Id: Clone + Eq + Ord + Hash + Display + Send + Sync;

    fn id(&self) -> &Self::Id;
    fn name(&self) -> &str;
}

impl Record for Policy {
    type Id = PolicyId;

    fn id(&self) -> &PolicyId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Condition {
    type Id = ConditionId;

    fn id(&self) -> &ConditionId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Effect {
    type Id = EffectId;

    fn id(&self) -> &EffectId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Rows keyed by id with a unique name index
struct MemoryTable<R: Record> {
    rows: DashMap<R::Id, R, RandomState>,
    names: DashMap<String, R::Id, RandomState>,
}

impl<R: Record> MemoryTable<R> {
    fn new() -> Self {
        Self {
            rows: DashMap::with_hasher(RandomState::new()),
            names: DashMap::with_hasher(RandomState::new()),
        }
    }

    fn get(&self, id: &R::Id) -> Option<R> {
        self.rows.get(id).map(|row| row.value().clone())
    }

    /// All rows, ordered by id
    fn all(&self) -> Vec<R> {
        let mut rows: Vec<R> = self.rows.iter().map(|row| row.value().clone()).collect();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }

    fn by_owner(&self, owner: &SubjectId) -> Vec<R> {
        let mut rows: Vec<R> = self
            .rows
            .iter()
            .filter(|row| row.value().owner() == owner)
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }

    fn name_taken(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    fn insert(&self, row: R) -> StoreResult<R> {
        match self.names.entry(row.name().to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateName(row.name().to_string())),
            Entry::Vacant(slot) => {
                if self.rows.contains_key(row.id()) {
                    return Err(StoreError::Backend(format!("id '{}' already stored", row.id())));
                }
                slot.insert(row.id().clone());
                self.rows.insert(row.id().clone(), row.clone());
                Ok(row)
            }
        }
    }

    fn replace(&self, row: R) -> StoreResult<R> {
        let id = row.id().clone();
        let previous = self
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if previous.name() != row.name() {
            match self.names.entry(row.name().to_string()) {
                Entry::Occupied(holder) if holder.get() != &id => {
                    return Err(StoreError::DuplicateName(row.name().to_string()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id.clone());
                }
            }
            self.names.remove_if(previous.name(), |_, holder| holder == &id);
        }

        self.rows.insert(id, row.clone());
        Ok(row)
    }

    fn remove(&self, id: &R::Id) -> Option<R> {
        let (_, row) = self.rows.remove(id)?;
        self.names.remove_if(row.name(), |_, holder| holder == id);
        Some(row)
    }
}

/// In-memory policy repository with owner and access-type indexes
pub struct MemoryPolicyRepository {
    table: MemoryTable<Policy>,
    by_access: DashMap<AccessType, BTreeSet<PolicyId>, RandomState>,
    by_owner: DashMap<SubjectId, BTreeSet<PolicyId>, RandomState>,
}

impl MemoryPolicyRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new(),
            by_access: DashMap::with_hasher(RandomState::new()),
            by_owner: DashMap::with_hasher(RandomState::new()),
        }
    }

    fn index(&self, policy: &Policy) {
        for access in &policy.access_types {
            self.by_access
                .entry(*access)
                .or_default()
                .insert(policy.id.clone());
        }
        self.by_owner
            .entry(policy.owner.clone())
            .or_default()
            .insert(policy.id.clone());
    }

    fn unindex(&self, policy: &Policy) {
        for access in &policy.access_types {
            if let Some(mut ids) = self.by_access.get_mut(access) {
                ids.remove(&policy.id);
            }
        }
        if let Some(mut ids) = self.by_owner.get_mut(&policy.owner) {
            ids.remove(&policy.id);
        }
    }

    fn resolve(&self, ids: Option<BTreeSet<PolicyId>>) -> Vec<Policy> {
        ids.unwrap_or_default()
            .iter()
            .filter_map(|id| self.table.get(id))
            .collect()
    }
}

impl Default for MemoryPolicyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRepository for MemoryPolicyRepository {
    fn find_by_id(&self, id: &PolicyId) -> StoreResult<Option<Policy>> {
        Ok(self.table.get(id))
    }

    fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<Policy>> {
        let ids = self.by_owner.get(owner).map(|ids| ids.clone());
        Ok(self
            .resolve(ids)
            .into_iter()
            .filter(|policy| &policy.owner == owner)
            .collect())
    }

    fn find_all(&self) -> StoreResult<Vec<Policy>> {
        Ok(self.table.all())
    }

    fn find_by_access_type(&self, access_type: AccessType) -> StoreResult<Vec<Policy>> {
        let ids = self.by_access.get(&access_type).map(|ids| ids.clone());
        Ok(self
            .resolve(ids)
            .into_iter()
            .filter(|policy| policy.governs(access_type))
            .collect())
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        Ok(self.table.name_taken(name))
    }

    fn save(&self, policy: Policy) -> StoreResult<Policy> {
        let policy = self.table.insert(policy)?;
        self.index(&policy);
        Ok(policy)
    }

    fn replace(&self, policy: Policy) -> StoreResult<Policy> {
        let previous = self
            .table
            .get(&policy.id)
            .ok_or_else(|| StoreError::NotFound(policy.id.to_string()))?;
        let policy = self.table.replace(policy)?;
        self.unindex(&previous);
        self.index(&policy);
        Ok(policy)
    }

    fn delete(&self, id: &PolicyId) -> StoreResult<Option<Policy>> {
        let removed = self.table.remove(id);
        if let Some(policy) = &removed {
            self.unindex(policy);
        }
        Ok(removed)
    }
}

macro_rules! memory_repository {
    ($(#[$meta:meta])* $name:ident, $trait:ident, $record:ty, $id:ty) => {
        $(#[$meta])*
        pub struct $name {
            table: MemoryTable<$record>,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    table: MemoryTable::new(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $trait for $name {
            fn find_by_id(&self, id: &$id) -> StoreResult<Option<$record>> {
                Ok(self.table.get(id))
            }

            fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<$record>> {
                Ok(self.table.by_owner(owner))
            }

            fn find_all(&self) -> StoreResult<Vec<$record>> {
                Ok(self.table.all())
            }

            fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
                Ok(self.table.name_taken(name))
            }

            fn save(&self, row: $record) -> StoreResult<$record> {
                self.table.insert(row)
            }

            fn replace(&self, row: $record) -> StoreResult<$record> {
                self.table.replace(row)
            }

            fn delete(&self, id: &$id) -> StoreResult<Option<$record>> {
                Ok(self.table.remove(id))
            }
        }
    };
}

memory_repository!(
    /// In-memory condition repository
    MemoryConditionRepository,
    ConditionRepository,
    Condition,
    ConditionId
);
memory_repository!(
    /// In-memory effect repository
    MemoryEffectRepository,
    EffectRepository,
    Effect,
    EffectId
);

/// In-memory set of known subjects
#[derive(Default)]
pub struct MemorySubjectDirectory {
    subjects: DashSet<SubjectId, RandomState>,
}

impl MemorySubjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(subjects: impl IntoIterator<Item = SubjectId>) -> Self {
        let directory = Self::new();
        for subject in subjects {
            directory.add(subject);
        }
        directory
    }

    pub fn add(&self, subject: SubjectId) {
        self.subjects.insert(subject);
    }

    pub fn remove(&self, subject: &SubjectId) -> bool {
        self.subjects.remove(subject).is_some()
    }
}

impl SubjectDirectory for MemorySubjectDirectory {
    fn exists(&self, subject: &SubjectId) -> StoreResult<bool> {
        Ok(self.subjects.contains(subject))
    }
}

/// Session-style current subject that can be switched at runtime
#[derive(Default)]
pub struct SessionSubject {
    current: RwLock<Option<SubjectId>>,
}

impl SessionSubject {
    pub fn new(subject: Option<SubjectId>) -> Self {
        Self {
            current: RwLock::new(subject),
        }
    }

    pub fn set(&self, subject: SubjectId) {
        *self.current.write() = Some(subject);
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }
}

impl CurrentSubjectProvider for SessionSubject {
    fn current_subject(&self) -> Option<SubjectId> {
        self.current.read().clone()
    }
}
