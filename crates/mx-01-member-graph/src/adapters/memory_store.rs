//! In-memory member store
//!
//! All writes happen under one `parking_lot::RwLock` write guard, so a slot
//! claim and every uniqueness check commit together or not at all.

use crate::domain::entities::Member;
use crate::domain::errors::StoreError;
use crate::ports::outbound::{CodeDirectory, MemberStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Amount, MemberId};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct StoreState {
    members: HashMap<MemberId, Member>,
    /// Join order, for snapshots.
    order: Vec<MemberId>,
    /// placement parent -> slot -> child
    children: HashMap<MemberId, BTreeMap<u32, MemberId>>,
    /// sponsor -> referrals in join order
    referrals: HashMap<MemberId, Vec<MemberId>>,
    /// lowercased username -> member
    usernames: HashMap<String, MemberId>,
    sponsor_codes: HashMap<String, MemberId>,
    trace_codes: HashMap<String, MemberId>,
    root: Option<MemberId>,
}

impl StoreState {
    fn member_mut(&mut self, id: MemberId) -> Result<&mut Member, StoreError> {
        self.members.get_mut(&id).ok_or(StoreError::NotFound(id))
    }

    fn code_taken(&self, code: &str) -> bool {
        self.sponsor_codes.contains_key(code) || self.trace_codes.contains_key(code)
    }

    fn check_unique(&self, member: &Member) -> Result<(), StoreError> {
        if self.usernames.contains_key(&member.username.to_lowercase()) {
            return Err(StoreError::DuplicateUsername(member.username.clone()));
        }
        for code in [&member.sponsor_code, &member.trace_code] {
            if self.code_taken(code) {
                return Err(StoreError::DuplicateCode(code.clone()));
            }
        }
        if member.sponsor_code == member.trace_code {
            return Err(StoreError::DuplicateCode(member.trace_code.clone()));
        }
        Ok(())
    }

    fn check_claim(&self, member: &Member, matrix_width: u32) -> Result<MemberId, StoreError> {
        let parent_id = member
            .placement_parent_id
            .ok_or_else(|| StoreError::Backend("non-root member without placement parent".into()))?;
        if !self.members.contains_key(&parent_id) {
            return Err(StoreError::NotFound(parent_id));
        }
        if let Some(sponsor_id) = member.sponsor_id {
            if !self.members.contains_key(&sponsor_id) {
                return Err(StoreError::NotFound(sponsor_id));
            }
        } else {
            return Err(StoreError::Backend("non-root member without sponsor".into()));
        }

        let slot = member.placement_slot;
        if slot >= matrix_width {
            return Err(StoreError::SlotOutOfRange { slot, matrix_width });
        }

        if let Some(taken) = self.children.get(&parent_id) {
            if taken.contains_key(&slot) {
                return Err(StoreError::SlotTaken { parent_id, slot });
            }
            if taken.len() >= matrix_width as usize {
                return Err(StoreError::ParentFull { parent_id });
            }
        }
        Ok(parent_id)
    }
}

/// In-memory member store.
///
/// Production deployments put the same contract in front of a database with
/// a unique index on `(placement_parent_id, placement_slot)`.
#[derive(Default)]
pub struct InMemoryMemberStore {
    state: RwLock<StoreState>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CodeDirectory for InMemoryMemberStore {
    async fn code_in_use(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().code_taken(code))
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn get(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        Ok(self.state.read().members.get(&id).cloned())
    }

    async fn find_by_sponsor_code(&self, code: &str) -> Result<Option<Member>, StoreError> {
        let state = self.state.read();
        Ok(state
            .sponsor_codes
            .get(code)
            .and_then(|id| state.members.get(id))
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>, StoreError> {
        let state = self.state.read();
        Ok(state
            .usernames
            .get(&username.to_lowercase())
            .and_then(|id| state.members.get(id))
            .cloned())
    }

    async fn root(&self) -> Result<Option<Member>, StoreError> {
        let state = self.state.read();
        Ok(state.root.and_then(|id| state.members.get(&id)).cloned())
    }

    async fn children_of(&self, parents: &[MemberId]) -> Result<Vec<Member>, StoreError> {
        let state = self.state.read();
        let children = parents
            .iter()
            .filter_map(|parent| state.children.get(parent))
            .flat_map(|slots| slots.values())
            .filter_map(|id| state.members.get(id))
            .cloned()
            .collect();
        Ok(children)
    }

    async fn referrals_of(&self, sponsors: &[MemberId]) -> Result<Vec<Member>, StoreError> {
        let state = self.state.read();
        let referrals = sponsors
            .iter()
            .filter_map(|sponsor| state.referrals.get(sponsor))
            .flatten()
            .filter_map(|id| state.members.get(id))
            .cloned()
            .collect();
        Ok(referrals)
    }

    async fn insert_member(&self, member: Member, matrix_width: u32) -> Result<(), StoreError> {
        let mut state = self.state.write();

        if state.members.contains_key(&member.id) {
            return Err(StoreError::Backend(format!("member {} already stored", member.id)));
        }
        state.check_unique(&member)?;

        if member.is_root {
            if state.root.is_some() {
                return Err(StoreError::RootExists);
            }
            state.root = Some(member.id);
        } else {
            let parent_id = state.check_claim(&member, matrix_width)?;
            state
                .children
                .entry(parent_id)
                .or_default()
                .insert(member.placement_slot, member.id);
            if let Some(sponsor_id) = member.sponsor_id {
                state.referrals.entry(sponsor_id).or_default().push(member.id);
            }
        }

        let id = member.id;
        state.usernames.insert(member.username.to_lowercase(), id);
        state.sponsor_codes.insert(member.sponsor_code.clone(), id);
        state.trace_codes.insert(member.trace_code.clone(), id);
        state.order.push(id);
        state.members.insert(id, member);
        Ok(())
    }

    async fn update_self_investment(&self, id: MemberId, total: Amount) -> Result<(), StoreError> {
        self.state.write().member_mut(id)?.self_investment_total = total;
        Ok(())
    }

    async fn recompute_direct_business(&self, id: MemberId) -> Result<Amount, StoreError> {
        let mut state = self.state.write();
        let total: Amount = state
            .referrals
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|referral| state.members.get(referral))
            .map(|m| m.self_investment_total)
            .sum();
        state.member_mut(id)?.direct_business_total = total;
        Ok(total)
    }

    async fn set_active(&self, id: MemberId, active: bool) -> Result<(), StoreError> {
        self.state.write().member_mut(id)?.active = active;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<Member>, StoreError> {
        let state = self.state.read();
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.members.get(id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{IssuedCodes, PlacementDecision};
    use rust_decimal_macros::dec;

    fn root() -> Member {
        Member::root("Root", "HS10000".into(), "TR10000".into(), 0)
    }

    fn member(name: &str, sponsor: MemberId, parent: MemberId, slot: u32, n: u32) -> Member {
        let decision = PlacementDecision {
            parent_id: parent,
            slot,
            depth: 0,
        };
        let codes = IssuedCodes {
            sponsor_code: format!("HS{}", 20000 + n),
            trace_code: format!("TR{}", 20000 + n),
        };
        Member::placed(name, sponsor, &decision, codes, 0)
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 2).await.unwrap();

        let a = member("Alice", rid, rid, 0, 1);
        let aid = a.id;
        store.insert_member(a, 2).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.root().await.unwrap().unwrap().id, rid);
        assert_eq!(store.find_by_username("alice").await.unwrap().unwrap().id, aid);
        assert_eq!(
            store.find_by_sponsor_code("HS20001").await.unwrap().unwrap().id,
            aid
        );
        // Trace codes are not sponsor references
        assert!(store.find_by_sponsor_code("TR20001").await.unwrap().is_none());
        assert!(store.code_in_use("TR20001").await.unwrap());
    }

    #[tokio::test]
    async fn test_slot_claim_is_exclusive() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 2).await.unwrap();

        store.insert_member(member("a", rid, rid, 0, 1), 2).await.unwrap();
        let err = store
            .insert_member(member("b", rid, rid, 0, 2), 2)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::SlotTaken { parent_id: rid, slot: 0 });

        let err = store
            .insert_member(member("c", rid, rid, 2, 3), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotOutOfRange { slot: 2, .. }));

        // Rejected inserts leave no trace
        assert_eq!(store.len(), 2);
        assert!(store.find_by_username("b").await.unwrap().is_none());
        assert!(!store.code_in_use("HS20002").await.unwrap());
    }

    #[tokio::test]
    async fn test_parent_full_rejected() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 3).await.unwrap();
        store.insert_member(member("a", rid, rid, 0, 1), 3).await.unwrap();
        store.insert_member(member("b", rid, rid, 2, 2), 3).await.unwrap();

        // Width shrank between resolution and claim
        let err = store
            .insert_member(member("c", rid, rid, 1, 3), 2)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ParentFull { parent_id: rid });
    }

    #[tokio::test]
    async fn test_uniqueness() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 3).await.unwrap();

        assert_eq!(store.insert_member(root(), 3).await, Err(StoreError::DuplicateUsername("Root".into())));

        let mut second_root = root();
        second_root.username = "other".into();
        second_root.sponsor_code = "HS19999".into();
        second_root.trace_code = "TR19999".into();
        assert_eq!(store.insert_member(second_root, 3).await, Err(StoreError::RootExists));

        let mut dup = member("dup", rid, rid, 0, 1);
        dup.sponsor_code = "HS10000".into();
        assert_eq!(
            store.insert_member(dup, 3).await,
            Err(StoreError::DuplicateCode("HS10000".into()))
        );
    }

    #[tokio::test]
    async fn test_children_and_referrals_order() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 3).await.unwrap();

        let late = member("late", rid, rid, 2, 1);
        let early = member("early", rid, rid, 0, 2);
        let (late_id, early_id) = (late.id, early.id);
        store.insert_member(late, 3).await.unwrap();
        store.insert_member(early, 3).await.unwrap();

        let children: Vec<_> = store.children_of(&[rid]).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(children, vec![early_id, late_id]);

        let referrals: Vec<_> = store.referrals_of(&[rid]).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(referrals, vec![late_id, early_id]);
    }

    #[tokio::test]
    async fn test_projection_updates() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 3).await.unwrap();

        store.update_self_investment(rid, dec!(12.50)).await.unwrap();
        store.set_active(rid, false).await.unwrap();

        let stored = store.get(rid).await.unwrap().unwrap();
        assert_eq!(stored.self_investment_total, dec!(12.50));
        assert!(!stored.active);

        let missing = MemberId::new();
        assert_eq!(
            store.set_active(missing, false).await,
            Err(StoreError::NotFound(missing))
        );
    }

    #[tokio::test]
    async fn test_recompute_direct_business() {
        let store = InMemoryMemberStore::new();
        let r = root();
        let rid = r.id;
        store.insert_member(r, 3).await.unwrap();

        let a = member("a", rid, rid, 0, 1);
        let b = member("b", rid, rid, 1, 2);
        let (aid, bid) = (a.id, b.id);
        store.insert_member(a, 3).await.unwrap();
        store.insert_member(b, 3).await.unwrap();

        assert_eq!(store.recompute_direct_business(rid).await.unwrap(), dec!(0));

        store.update_self_investment(aid, dec!(100)).await.unwrap();
        store.update_self_investment(bid, dec!(25.5)).await.unwrap();
        assert_eq!(
            store.recompute_direct_business(rid).await.unwrap(),
            dec!(125.5)
        );
        let cached = store.get(rid).await.unwrap().unwrap();
        assert_eq!(cached.direct_business_total, dec!(125.5));

        // Leaf with no referrals
        assert_eq!(store.recompute_direct_business(aid).await.unwrap(), dec!(0));

        let missing = MemberId::new();
        assert_eq!(
            store.recompute_direct_business(missing).await,
            Err(StoreError::NotFound(missing))
        );
    }
}
