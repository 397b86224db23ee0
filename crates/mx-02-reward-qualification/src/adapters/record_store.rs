//! In-memory reward record store
//!
//! One write lock covers the uniqueness check and the insert, and the status
//! comparison and the replace, so both are atomic.

use crate::domain::entities::RewardRecord;
use crate::domain::errors::RecordStoreError;
use crate::ports::outbound::{InsertOutcome, RewardRecordStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{MemberId, RewardRecordId, RewardStatus};
use std::collections::HashMap;

#[derive(Default)]
struct RecordState {
    records: HashMap<RewardRecordId, RewardRecord>,
    by_member_type: HashMap<(MemberId, String), RewardRecordId>,
    by_member: HashMap<MemberId, Vec<RewardRecordId>>,
}

#[derive(Default)]
pub struct InMemoryRewardRecordStore {
    state: RwLock<RecordState>,
}

impl InMemoryRewardRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Every record, for audits.
    pub fn all(&self) -> Vec<RewardRecord> {
        self.state.read().records.values().cloned().collect()
    }
}

#[async_trait]
impl RewardRecordStore for InMemoryRewardRecordStore {
    async fn insert_if_absent(
        &self,
        record: RewardRecord,
    ) -> Result<InsertOutcome, RecordStoreError> {
        let mut state = self.state.write();
        let key = (record.member_id, record.reward_type.clone());

        if let Some(existing) = state
            .by_member_type
            .get(&key)
            .and_then(|id| state.records.get(id))
        {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }

        state.by_member_type.insert(key, record.id);
        state
            .by_member
            .entry(record.member_id)
            .or_default()
            .push(record.id);
        state.records.insert(record.id, record);
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, id: RewardRecordId) -> Result<Option<RewardRecord>, RecordStoreError> {
        Ok(self.state.read().records.get(&id).cloned())
    }

    async fn find(
        &self,
        member_id: MemberId,
        reward_type: &str,
    ) -> Result<Option<RewardRecord>, RecordStoreError> {
        let state = self.state.read();
        Ok(state
            .by_member_type
            .get(&(member_id, reward_type.to_string()))
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn list_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<RewardRecord>, RecordStoreError> {
        let state = self.state.read();
        let mut records: Vec<RewardRecord> = state
            .by_member
            .get(&member_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.records.get(id).cloned())
            .collect();
        records.sort_by_key(|r| r.qualification_date);
        Ok(records)
    }

    async fn compare_and_set(
        &self,
        record: RewardRecord,
        expected: RewardStatus,
    ) -> Result<(), RecordStoreError> {
        let mut state = self.state.write();
        let stored = state
            .records
            .get_mut(&record.id)
            .ok_or(RecordStoreError::NotFound(record.id))?;

        if stored.status != expected {
            return Err(RecordStoreError::StatusMismatch {
                actual: stored.status,
            });
        }
        *stored = record;
        Ok(())
    }
}
