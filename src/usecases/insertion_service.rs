//! Insertion workflow: validate -> capacity check -> await confirmation -> commit -> notify.
//!
//! - Validation and the propose-time capacity check take no locks and write nothing
//! - Proposals live only in this service's memory, keyed by a single-use token
//! - Confirm re-checks capacity and saves under a per-entity commit lock
//! - Notification runs after the lock is released; its failure never undoes the commit

use crate::domain::{
    CapacityPolicy, ContentDraft, ContentItem, DomainError, ImageDescriptor, ImagePayload,
    ImageValidator, Outcome, PointOfInterest, ProposalToken, WorkflowState,
};
use crate::ports::{
    ContentRepository, InsertionPort, NotificationGateway, PoiDirectory, SaveOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How long a proposal stays confirmable.
pub const DEFAULT_PROPOSAL_TTL: Duration = Duration::from_secs(900);

/// A validated insertion waiting for confirm or cancel. Never persisted.
#[derive(Debug, Clone)]
struct PendingProposal {
    poi_id: String,
    descriptor: ImageDescriptor,
    /// Count seen at propose time. Informational; confirm reads the live count.
    count_snapshot: u32,
    created: Instant,
}

/// Workflow orchestrator. Every public call ends in an `Outcome`.
pub struct InsertionService {
    validator: ImageValidator,
    policy: CapacityPolicy,
    directory: Arc<dyn PoiDirectory>,
    repo: Arc<dyn ContentRepository>,
    notifier: Arc<dyn NotificationGateway>,
    proposals: Mutex<HashMap<ProposalToken, PendingProposal>>,
    /// One lock per point-of-interest id, created on first commit.
    commit_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    proposal_ttl: Duration,
}

impl InsertionService {
    pub fn new(
        validator: ImageValidator,
        directory: Arc<dyn PoiDirectory>,
        repo: Arc<dyn ContentRepository>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            validator,
            policy: CapacityPolicy,
            directory,
            repo,
            notifier,
            proposals: Mutex::new(HashMap::new()),
            commit_locks: Mutex::new(HashMap::new()),
            proposal_ttl: DEFAULT_PROPOSAL_TTL,
        }
    }

    pub fn with_proposal_ttl(mut self, ttl: Duration) -> Self {
        self.proposal_ttl = ttl;
        self
    }

    /// Number of proposals currently awaiting confirmation (expired ones included until purged).
    pub async fn pending_count(&self) -> usize {
        self.proposals.lock().await.len()
    }

    /// Validate the image and check capacity. On success the proposal is kept and
    /// `AwaitingConfirmation` carries its token. Nothing is written.
    pub async fn propose(&self, poi_id: &str, payload: ImagePayload) -> Outcome {
        debug!(poi_id, state = %WorkflowState::Initiated, bytes = payload.bytes.len(), "insertion requested");
        self.purge_expired().await;

        debug!(poi_id, state = %WorkflowState::Validating, "validating image");
        let descriptor = match self.validator.validate(&payload) {
            Ok(d) => d,
            Err(reason) => {
                warn!(poi_id, reason = %reason, "image rejected");
                return Outcome::InvalidImage(reason);
            }
        };

        // Advisory only: confirm checks again under the commit lock.
        debug!(poi_id, state = %WorkflowState::CapacityCheck, "checking capacity");
        let poi = match self.lookup(poi_id).await {
            Ok(p) => p,
            Err(outcome) => return outcome,
        };
        if !self.policy.evaluate(&poi) {
            warn!(poi_id, limit = poi.max_content_count, "capacity reached at propose");
            return Outcome::CapacityExceeded {
                limit: poi.max_content_count,
            };
        }

        let token = ProposalToken::generate();
        self.proposals.lock().await.insert(
            token,
            PendingProposal {
                poi_id: poi_id.to_string(),
                descriptor,
                count_snapshot: poi.current_content_count,
                created: Instant::now(),
            },
        );
        info!(
            poi_id,
            token = %token,
            state = %WorkflowState::AwaitingConfirmation,
            remaining = self.policy.remaining(&poi),
            "proposal awaiting confirmation"
        );
        Outcome::AwaitingConfirmation(token)
    }

    /// Commit a proposal, then notify the agency.
    ///
    /// The token is consumed before anything else happens, so it is spent whatever
    /// the outcome.
    pub async fn confirm(&self, token: ProposalToken) -> Outcome {
        let Some(proposal) = self.take_live(token).await else {
            warn!(token = %token, "confirm with unknown, expired or used token");
            return Outcome::InvalidProposalReference;
        };

        let lock = self.commit_lock(&proposal.poi_id).await;
        let committed = {
            let _guard = lock.lock().await;
            self.commit(token, &proposal).await
        };

        match committed {
            Ok((item, point)) => self.notify(item, point).await,
            Err(outcome) => outcome,
        }
    }

    /// Discard a proposal. No store mutation.
    pub async fn cancel(&self, token: ProposalToken) -> Outcome {
        match self.take_live(token).await {
            Some(proposal) => {
                info!(
                    poi_id = %proposal.poi_id,
                    token = %token,
                    state = %WorkflowState::Cancelled,
                    "proposal cancelled"
                );
                Outcome::Cancelled
            }
            None => {
                warn!(token = %token, "cancel with unknown, expired or used token");
                Outcome::InvalidProposalReference
            }
        }
    }

    /// Authoritative capacity check plus save. Caller holds the entity's commit lock.
    async fn commit(
        &self,
        token: ProposalToken,
        proposal: &PendingProposal,
    ) -> Result<(ContentItem, PointOfInterest), Outcome> {
        let poi = self.lookup(&proposal.poi_id).await?;
        if !self.policy.evaluate(&poi) {
            warn!(
                poi_id = %poi.id,
                token = %token,
                snapshot = proposal.count_snapshot,
                current = poi.current_content_count,
                "capacity exhausted since propose"
            );
            return Err(Outcome::CapacityExceeded {
                limit: poi.max_content_count,
            });
        }

        debug!(poi_id = %poi.id, token = %token, state = %WorkflowState::Committing, "committing");
        let draft = ContentDraft {
            draft_id: token.as_uuid(),
            point_of_interest_id: proposal.poi_id.clone(),
            descriptor: proposal.descriptor,
        };
        match self.repo.save(&draft).await {
            Ok(SaveOutcome::Saved { item, point }) => Ok((item, point)),
            Ok(SaveOutcome::CapacityExceeded { limit }) => {
                warn!(poi_id = %poi.id, limit, "store refused commit: capacity reached");
                Err(Outcome::CapacityExceeded { limit })
            }
            Err(DomainError::PointNotFound(id)) => Err(Outcome::PointOfInterestNotFound(id)),
            Err(e) => {
                warn!(poi_id = %poi.id, token = %token, error = %e, "commit failed");
                Err(Outcome::PersistenceError(e.to_string()))
            }
        }
    }

    /// Best-effort agency call. The item is already durable.
    async fn notify(&self, item: ContentItem, point: PointOfInterest) -> Outcome {
        debug!(content_id = item.id, state = %WorkflowState::Notifying, "notifying agency");
        match self.notifier.notify(&item, &point).await {
            Ok(()) => {
                info!(
                    poi_id = %point.id,
                    content_id = item.id,
                    count = point.current_content_count,
                    state = %WorkflowState::Terminal,
                    "content inserted"
                );
                Outcome::Success(item)
            }
            Err(e) => {
                warn!(
                    poi_id = %point.id,
                    content_id = item.id,
                    error = %e,
                    state = %WorkflowState::Terminal,
                    "content committed but agency notification failed"
                );
                Outcome::ConnectivityError {
                    item,
                    detail: e.to_string(),
                }
            }
        }
    }

    async fn lookup(&self, poi_id: &str) -> Result<PointOfInterest, Outcome> {
        match self.directory.find_by_id(poi_id).await {
            Ok(Some(p)) => Ok(p),
            Ok(None) => {
                warn!(poi_id, "unknown point of interest");
                Err(Outcome::PointOfInterestNotFound(poi_id.to_string()))
            }
            Err(e) => {
                warn!(poi_id, error = %e, "directory lookup failed");
                Err(Outcome::PersistenceError(e.to_string()))
            }
        }
    }

    /// Remove the proposal for `token` and purge every other expired one.
    /// An expired proposal for `token` is removed but not returned.
    async fn take_live(&self, token: ProposalToken) -> Option<PendingProposal> {
        let mut proposals = self.proposals.lock().await;
        let proposal = proposals.remove(&token);
        Self::purge_locked(&mut proposals, self.proposal_ttl);
        drop(proposals);

        let proposal = proposal?;
        if proposal.created.elapsed() >= self.proposal_ttl {
            debug!(token = %token, "proposal expired");
            return None;
        }
        Some(proposal)
    }

    async fn purge_expired(&self) {
        let mut proposals = self.proposals.lock().await;
        Self::purge_locked(&mut proposals, self.proposal_ttl);
    }

    fn purge_locked(proposals: &mut HashMap<ProposalToken, PendingProposal>, ttl: Duration) {
        let before = proposals.len();
        proposals.retain(|_, p| p.created.elapsed() < ttl);
        let purged = before - proposals.len();
        if purged > 0 {
            debug!(purged, "expired proposals purged");
        }
    }

    /// Lock for `poi_id`. Entries nobody holds are dropped first, so the map only
    /// keeps points with a commit in flight.
    async fn commit_lock(&self, poi_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.commit_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(poi_id.to_string()).or_default())
    }

    /// Number of per-point commit locks currently tracked.
    #[cfg(test)]
    async fn commit_lock_count(&self) -> usize {
        self.commit_locks.lock().await.len()
    }
}

#[async_trait::async_trait]
impl InsertionPort for InsertionService {
    async fn request_insertion(&self, poi_id: &str, image: Vec<u8>, mime_type: &str) -> Outcome {
        self.propose(poi_id, ImagePayload::new(image, mime_type)).await
    }

    async fn confirm_insertion(&self, token: ProposalToken) -> Outcome {
        self.confirm(token).await
    }

    async fn cancel_insertion(&self, token: ProposalToken) -> Outcome {
        self.cancel(token).await
    }
}
