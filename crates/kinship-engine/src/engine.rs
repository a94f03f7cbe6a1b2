//! Core relationship engine

use crate::error::EngineError;
use crate::response::{Listing, Outcome};
use kinship_domain::traits::{RelationshipStore, UserDirectory};
use kinship_domain::transition::{self, AddPlan};
use kinship_domain::{
    FriendState, ListKind, Refusal, Relationship, RelationshipId, Role, StateUpdate, User, UserId,
};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Record-addressed verbs share one flow; this names them for logs and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordVerb {
    Reject,
    Block,
    Unblock,
}

impl RecordVerb {
    fn as_str(&self) -> &'static str {
        match self {
            RecordVerb::Reject => "reject",
            RecordVerb::Block => "block",
            RecordVerb::Unblock => "unblock",
        }
    }

    fn plan(&self, record: &Relationship, actor: UserId) -> Result<StateUpdate, Refusal> {
        match self {
            RecordVerb::Reject => transition::plan_reject(record, actor),
            RecordVerb::Block => transition::plan_block(record, actor),
            RecordVerb::Unblock => transition::plan_unblock(record, actor),
        }
    }

    fn message(&self, actor: &User, other: &User) -> String {
        match self {
            RecordVerb::Reject => format!(
                "{} rejected {}'s friend request",
                actor.display_name, other.display_name
            ),
            RecordVerb::Block => format!(
                "{} blocked {}",
                actor.display_name, other.display_name
            ),
            RecordVerb::Unblock => format!(
                "{} unblocked {}",
                actor.display_name, other.display_name
            ),
        }
    }
}

/// The relationship engine owns the friend state machine
///
/// Every verb runs its read-modify-write while holding the store lock, and
/// every write is a compare-and-swap on the state read at the start, so two
/// writers racing on the same pair cannot both win.
///
/// # Examples
///
/// ```no_run
/// use kinship_engine::RelationshipEngine;
/// use kinship_store::SqliteStore;
/// use kinship_domain::UserId;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = RelationshipEngine::new(SqliteStore::new("kinship.db")?);
/// let outcome = engine.add(UserId::new(), UserId::new())?;
/// println!("{}", outcome.message);
/// # Ok(())
/// # }
/// ```
pub struct RelationshipEngine<S> {
    store: Mutex<S>,
}

impl<S> RelationshipEngine<S>
where
    S: UserDirectory + RelationshipStore,
    <S as UserDirectory>::Error: Display,
    <S as RelationshipStore>::Error: Display,
{
    /// Create an engine over a store that is both directory and relationship store
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Run `f` with exclusive access to the underlying store
    ///
    /// Used for seeding, maintenance, and health checks.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, EngineError> {
        let mut store = self.lock()?;
        Ok(f(&mut store))
    }

    /// Send a friend request to `target`, or accept the one `target` sent
    pub fn add(&self, actor: UserId, target: UserId) -> Result<Outcome, EngineError> {
        info!("add: {} -> {}", actor, target);
        if actor == target {
            return Err(self.refused("add", EngineError::SelfReference("add")));
        }

        let mut store = self.lock()?;
        let actor_user = Self::require_user(&*store, actor)?;
        let target_user = Self::require_user(&*store, target)?;

        let current = RelationshipStore::find_active_by_pair(&*store, actor, target)
            .map_err(|e| Self::store_error("find relationship", e))?;

        let plan = transition::plan_add(current.as_ref(), actor)
            .map_err(|refusal| self.refused("add", refusal.into()))?;

        let (record, created) = match (plan, current) {
            (AddPlan::Create, _) => {
                let record = Self::create(&mut store, actor, target)?;
                (record, true)
            }
            (AddPlan::Update(update), Some(current)) => {
                Self::apply(&mut store, &update)?;
                (transition::apply(&current, &update), false)
            }
            (AddPlan::Update(_), None) => {
                return Err(EngineError::Conflict(
                    "relationship disappeared while planning".to_string(),
                ));
            }
        };

        let message = if record.state == FriendState::Mutual {
            format!(
                "{} accepted {}'s friend request; they are now friends",
                actor_user.display_name, target_user.display_name
            )
        } else {
            format!(
                "{} sent a friend request to {}",
                actor_user.display_name, target_user.display_name
            )
        };
        info!("add: record {} is now {}", record.id, record.state);

        Ok(Outcome {
            state: record.state,
            record: Some(record),
            counterpart: target_user,
            message,
            created,
        })
    }

    /// Look up the pair state between `actor` and the user with `contact`
    ///
    /// A contact that resolves to `actor` is a self-reference even when the
    /// actor's own profile cannot be loaded.
    pub fn search(&self, actor: UserId, contact: &str) -> Result<Outcome, EngineError> {
        info!("search: {} looks up {}", actor, contact);

        let store = self.lock()?;
        let target_user = store
            .find_by_contact(contact)
            .map_err(|e| Self::store_error("find user by contact", e))?
            .ok_or_else(|| {
                self.refused("search", EngineError::UserNotFound(contact.to_string()))
            })?;
        if target_user.id == actor {
            return Err(self.refused("search", EngineError::SelfReference("search for")));
        }
        Self::require_user(&*store, actor)?;

        let record = RelationshipStore::find_active_by_pair(&*store, actor, target_user.id)
            .map_err(|e| Self::store_error("find relationship", e))?;

        let (state, message) = match &record {
            None => (FriendState::None, "No friend request has been made with this user yet"),
            Some(record) => (record.state, Self::search_message(record, actor)),
        };
        debug!("search: {} sees {} as {}", actor, target_user.id, state);

        Ok(Outcome {
            state,
            record,
            counterpart: target_user,
            message: message.to_string(),
            created: false,
        })
    }

    /// Describe a record from `actor`'s side
    fn search_message(record: &Relationship, actor: UserId) -> &'static str {
        let role = record.role_of(actor).unwrap_or(Role::Recipient);
        match (record.state, role) {
            (FriendState::None, _) => "No friend request has been made with this user yet",
            (FriendState::PendingLeft, Role::Initiator) => "You sent a friend request to this user",
            (FriendState::PendingLeft, Role::Recipient) => "This user sent you a friend request",
            (FriendState::Rejected, Role::Initiator) => {
                "You sent a friend request to this user and it was declined"
            }
            (FriendState::Rejected, Role::Recipient) => {
                "This user sent you a friend request that you declined"
            }
            (FriendState::Mutual, _) => "Already registered as a friend",
            (FriendState::LeftBlocksRight, Role::Initiator)
            | (FriendState::RightBlocksLeft, Role::Recipient) => "You blocked this user",
            (FriendState::LeftBlocksRight, Role::Recipient)
            | (FriendState::RightBlocksLeft, Role::Initiator) => "This user blocked you",
            (FriendState::MutualBlock, _) => "You have blocked each other",
        }
    }

    /// List active relationships of `actor` that belong in `kind`
    pub fn list(&self, actor: UserId, kind: ListKind) -> Result<Listing, EngineError> {
        info!("list: {} requests {:?}", actor, kind);

        let store = self.lock()?;
        let entries = store
            .list_active(actor, kind)
            .map_err(|e| Self::store_error("list relationships", e))?;

        let message = if entries.is_empty() {
            format!("There are no {}s to show", kind.label())
        } else {
            format!("Fetched {} {}(s)", entries.len(), kind.label())
        };
        debug!("list: {} entries for {}", entries.len(), actor);

        Ok(Listing {
            kind,
            entries,
            message,
        })
    }

    /// Friends of `actor` (see [`ListKind::Friends`] for the blocked-by-other quirk)
    pub fn list_friends(&self, actor: UserId) -> Result<Listing, EngineError> {
        self.list(actor, ListKind::Friends)
    }

    /// Mutual friends of `actor`
    pub fn list_advisers(&self, actor: UserId) -> Result<Listing, EngineError> {
        self.list(actor, ListKind::Advisers)
    }

    /// Requests `actor` sent that were not accepted
    pub fn list_sent_requests(&self, actor: UserId) -> Result<Listing, EngineError> {
        self.list(actor, ListKind::SentRequests)
    }

    /// Requests waiting for `actor`'s answer
    pub fn list_received_requests(&self, actor: UserId) -> Result<Listing, EngineError> {
        self.list(actor, ListKind::ReceivedRequests)
    }

    /// Users `actor` blocks
    pub fn list_blocked(&self, actor: UserId) -> Result<Listing, EngineError> {
        self.list(actor, ListKind::Blocked)
    }

    /// Reject the pending request in `record_id` sent by `claimed_other`
    pub fn reject(
        &self,
        actor: UserId,
        record_id: RelationshipId,
        claimed_other: UserId,
    ) -> Result<Outcome, EngineError> {
        self.mutate_record(RecordVerb::Reject, actor, record_id, claimed_other)
    }

    /// Block `claimed_other` through `record_id`
    pub fn block(
        &self,
        actor: UserId,
        record_id: RelationshipId,
        claimed_other: UserId,
    ) -> Result<Outcome, EngineError> {
        self.mutate_record(RecordVerb::Block, actor, record_id, claimed_other)
    }

    /// Lift `actor`'s block on `claimed_other` through `record_id`
    pub fn unblock(
        &self,
        actor: UserId,
        record_id: RelationshipId,
        claimed_other: UserId,
    ) -> Result<Outcome, EngineError> {
        self.mutate_record(RecordVerb::Unblock, actor, record_id, claimed_other)
    }

    fn mutate_record(
        &self,
        verb: RecordVerb,
        actor: UserId,
        record_id: RelationshipId,
        claimed_other: UserId,
    ) -> Result<Outcome, EngineError> {
        info!("{}: {} on record {} (other: {})", verb.as_str(), actor, record_id, claimed_other);
        if actor == claimed_other {
            return Err(self.refused(verb.as_str(), EngineError::SelfReference(verb.as_str())));
        }

        let mut store = self.lock()?;
        let actor_user = Self::require_user(&*store, actor)?;
        let other_user = Self::require_user(&*store, claimed_other)
            .map_err(|e| self.refused(verb.as_str(), e))?;

        let record = store
            .find_active_by_id(record_id)
            .map_err(|e| Self::store_error("find relationship by id", e))?
            .filter(|record| record.connects(actor, claimed_other))
            .ok_or_else(|| self.refused(verb.as_str(), EngineError::RecordNotFound(record_id)))?;

        let update = verb
            .plan(&record, actor)
            .map_err(|refusal| self.refused(verb.as_str(), refusal.into()))?;
        Self::apply(&mut store, &update)?;

        let record = transition::apply(&record, &update);
        info!("{}: record {} is now {}", verb.as_str(), record.id, record.state);

        Ok(Outcome {
            state: record.state,
            message: verb.message(&actor_user, &other_user),
            record: Some(record),
            counterpart: other_user,
            created: false,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, EngineError> {
        self.store.lock().map_err(|_| {
            error!("relationship store lock poisoned");
            EngineError::Store("store lock poisoned".to_string())
        })
    }

    fn require_user(store: &S, id: UserId) -> Result<User, EngineError> {
        store
            .find_by_identity(id)
            .map_err(|e| Self::store_error("find user", e))?
            .ok_or_else(|| EngineError::UserNotFound(id.to_string()))
    }

    fn create(store: &mut S, actor: UserId, target: UserId) -> Result<Relationship, EngineError> {
        match store.insert_relationship(actor, target, FriendState::PendingLeft) {
            Ok(record) => Ok(record),
            Err(e) => {
                // A record that exists now was created by a concurrent writer
                let reread = RelationshipStore::find_active_by_pair(&*store, actor, target);
                let occupied = match reread {
                    Ok(found) => found.is_some(),
                    Err(lookup) => {
                        error!("failed to re-read pair {} / {}: {}", actor, target, lookup);
                        false
                    }
                };
                if occupied {
                    info!("add: lost creation race for {} / {}", actor, target);
                    Err(EngineError::Conflict(
                        "a relationship for this pair was created concurrently".to_string(),
                    ))
                } else {
                    Err(Self::store_error("insert relationship", e))
                }
            }
        }
    }

    fn apply(store: &mut S, update: &StateUpdate) -> Result<(), EngineError> {
        let applied = store
            .update_state(update)
            .map_err(|e| Self::store_error("update relationship", e))?;
        if !applied {
            info!("record {} changed since it was read (expected {})", update.id, update.expected);
            return Err(EngineError::Conflict(format!(
                "relationship {} was modified concurrently",
                update.id
            )));
        }
        Ok(())
    }

    fn refused(&self, verb: &str, err: EngineError) -> EngineError {
        info!("{} refused: {}", verb, err);
        err
    }

    fn store_error(operation: &str, e: impl Display) -> EngineError {
        error!("failed to {}: {}", operation, e);
        EngineError::Store(format!("failed to {}: {}", operation, e))
    }
}
