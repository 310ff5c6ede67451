//! Single owner of the in-session petition list.
//!
//! [`PetitionBoard`] applies every mutation to its in-memory list first,
//! then mirrors it to the [`LocalCache`] and to the remote
//! [`PetitionGateway`]. The two mirrors are independent: either may fail
//! without undoing the in-memory change or the other mirror, and each
//! mutation reports both outcomes in a [`MutationReport`]. There is no
//! reconciliation of a failed remote write.

use std::sync::Arc;

use wishwall_core::clock::{new_entity_id, MonotonicClock};
use wishwall_core::error::CoreError;
use wishwall_core::gateway::{GatewayError, PetitionGateway};
use wishwall_core::petition::{
    check_timestamp, sort_petitions, Petition, PetitionDraft, Signature, SignerDetails, SortOrder,
};
use wishwall_core::types::{now_millis, EntityId};

use crate::cache::{CacheOutcome, LocalCache, SlotStore};

/// Result of a mutation, with the outcome of each mirror.
#[derive(Debug)]
pub struct MutationReport<T> {
    /// The entity as it now exists in memory.
    pub value: T,
    pub cache: CacheOutcome,
    pub remote: Result<(), GatewayError>,
}

impl<T> MutationReport<T> {
    /// Both mirrors accepted the change.
    pub fn fully_mirrored(&self) -> bool {
        self.cache.is_saved() && self.remote.is_ok()
    }
}

pub struct PetitionBoard<S> {
    petitions: Vec<Petition>,
    cache: LocalCache<S>,
    gateway: Arc<dyn PetitionGateway>,
    clock: MonotonicClock,
}

impl<S: SlotStore> PetitionBoard<S> {
    /// Start a session from whatever the cache holds.
    pub fn open(cache: LocalCache<S>, gateway: Arc<dyn PetitionGateway>) -> Self {
        let petitions = cache.load().unwrap_or_default();
        tracing::debug!(count = petitions.len(), "Opened petition board from cache");
        let board = Self {
            petitions,
            cache,
            gateway,
            clock: MonotonicClock::new(),
        };
        board.observe_timestamps();
        board
    }

    // ---- queries ----

    /// Petitions in board order (newest created first unless synced).
    pub fn petitions(&self) -> &[Petition] {
        &self.petitions
    }

    pub fn get(&self, id: &str) -> Option<&Petition> {
        self.petitions.iter().find(|p| p.id == id)
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<&Petition> {
        sort_petitions(&self.petitions, order)
    }

    /// Signatures across every petition.
    pub fn total_signatures(&self) -> usize {
        self.petitions.iter().map(Petition::support_count).sum()
    }

    /// The last `n` signatures of a petition, newest first.
    pub fn recent_signatures(&self, id: &str, n: usize) -> Option<Vec<&Signature>> {
        self.get(id).map(|p| p.recent_signatures(n).collect())
    }

    pub fn cache(&self) -> &LocalCache<S> {
        &self.cache
    }

    // ---- mutations ----

    /// Validate and prepend a new petition.
    ///
    /// Rejected drafts (blocked content, missing fields) leave the board
    /// untouched and reach neither mirror.
    pub async fn create(
        &mut self,
        draft: PetitionDraft,
    ) -> Result<MutationReport<Petition>, CoreError> {
        let id = self.fresh_id();
        let petition = draft.into_petition(id, self.clock.tick()?)?;
        self.petitions.insert(0, petition.clone());

        let cache = self.cache.save(&self.petitions);
        let remote = self.gateway.create_petition(&petition).await;
        match &remote {
            Ok(()) => tracing::info!(petition_id = %petition.id, "Petition created"),
            Err(e) => tracing::error!(petition_id = %petition.id, error = %e, "Failed to store petition remotely"),
        }

        Ok(MutationReport {
            value: petition,
            cache,
            remote,
        })
    }

    /// Append a signature to an existing petition.
    pub async fn sign(
        &mut self,
        petition_id: &str,
        signer: SignerDetails,
    ) -> Result<MutationReport<Signature>, CoreError> {
        let index = self
            .petitions
            .iter()
            .position(|p| p.id == petition_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "petition",
                id: petition_id.to_string(),
            })?;

        let signature = signer.into_signature(new_entity_id(), self.clock.tick()?)?;
        self.petitions[index].append_signature(signature.clone());

        let cache = self.cache.save(&self.petitions);
        let remote = self.gateway.add_signature(petition_id, &signature).await;
        match &remote {
            Ok(()) => tracing::info!(petition_id, signature_id = %signature.id, "Petition signed"),
            Err(e) => tracing::error!(petition_id, error = %e, "Failed to store signature remotely"),
        }

        Ok(MutationReport {
            value: signature,
            cache,
            remote,
        })
    }

    /// Replace the in-memory list with the remote one and mirror it locally.
    ///
    /// On failure the board keeps its current list.
    pub async fn sync_from_remote(&mut self) -> Result<CacheOutcome, GatewayError> {
        let petitions = self.gateway.list_petitions().await?;
        tracing::info!(count = petitions.len(), "Synced petitions from remote store");
        self.petitions = petitions;
        self.observe_timestamps();
        Ok(self.cache.save(&self.petitions))
    }

    // ---- private helpers ----

    /// Keep future ticks above every plausible known timestamp so new
    /// `createdAt` values never collide with existing ones. Values far
    /// ahead of the wall clock are skipped; they cannot collide with a
    /// fresh tick and would otherwise pin the clock at the far end.
    fn observe_timestamps(&self) {
        let now = now_millis();
        let stamps = self.petitions.iter().flat_map(|p| {
            std::iter::once(p.created_at).chain(p.signatures.iter().map(|s| s.timestamp))
        });
        for stamp in stamps {
            if check_timestamp("timestamp", stamp, now).is_ok() {
                self.clock.observe(stamp);
            }
        }
    }

    fn fresh_id(&self) -> EntityId {
        loop {
            let id = new_entity_id();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
