//! Optimistic vote state for a single post or comment.
//!
//! A click is applied locally first ([`VoteWidget::begin`]), the mutation is
//! sent, and the outcome is reconciled ([`VoteWidget::settle`]): success keeps
//! the local state, failure subtracts exactly the delta that click applied
//! and restores the vote held just before it.

use std::future::Future;
use uuid::Uuid;

use crate::{
    client::{ClientError, ClientResult, ForumClient, Notice, SIGN_IN_REDIRECT},
    models::{FeedPost, VoteSummary, VoteTarget, VoteType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteState {
    pub score: i64,
    pub current_vote: Option<VoteType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub previous: Option<VoteType>,
    pub next: Option<VoteType>,
    pub delta: i64,
}

impl VoteState {
    pub fn new(score: i64, current_vote: Option<VoteType>) -> Self {
        Self {
            score,
            current_vote,
        }
    }

    /// Same vote again withdraws it (∓1), a first vote counts ±1 and
    /// switching sides moves the score by 2 toward the new side.
    pub fn transition(&self, action: VoteType) -> VoteTransition {
        let (next, delta) = match self.current_vote {
            Some(current) if current == action => (None, -action.weight()),
            Some(_) => (Some(action), 2 * action.weight()),
            None => (Some(action), action.weight()),
        };

        VoteTransition {
            previous: self.current_vote,
            next,
            delta,
        }
    }

    pub fn apply(&mut self, transition: &VoteTransition) {
        self.score += transition.delta;
        self.current_vote = transition.next;
    }

    pub fn revert(&mut self, transition: &VoteTransition) {
        self.score -= transition.delta;
        self.current_vote = transition.previous;
    }
}

/// A vote that has been applied locally and awaits the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending vote has to be settled"]
pub struct PendingVote {
    pub target: VoteTarget,
    pub action: VoteType,
    pub transition: VoteTransition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteFeedback {
    Committed,
    RolledBack(Notice),
    SignInRequired { redirect: String },
}

#[derive(Debug, Clone)]
pub struct VoteWidget {
    target: VoteTarget,
    state: VoteState,
}

impl VoteWidget {
    pub fn new(target: VoteTarget, score: i64, current_vote: Option<VoteType>) -> Self {
        Self {
            target,
            state: VoteState::new(score, current_vote),
        }
    }

    /// Seeds a post widget from the server aggregate and the viewer's vote.
    pub fn from_feed_post(post: &FeedPost, viewer: Option<Uuid>) -> Self {
        Self::new(
            VoteTarget::Post(post.id()),
            post.votes_amount(),
            post.current_vote(viewer),
        )
    }

    pub fn target(&self) -> VoteTarget {
        self.target
    }

    pub fn state(&self) -> VoteState {
        self.state
    }

    pub fn begin(&mut self, action: VoteType) -> PendingVote {
        let transition = self.state.transition(action);
        self.state.apply(&transition);

        PendingVote {
            target: self.target,
            action,
            transition,
        }
    }

    pub fn settle(
        &mut self,
        pending: PendingVote,
        result: ClientResult<VoteSummary>,
    ) -> VoteFeedback {
        let error = match result {
            Ok(_) => return VoteFeedback::Committed,
            Err(error) => error,
        };

        self.state.revert(&pending.transition);
        tracing::debug!(
            target_id = %pending.target.id(),
            delta = pending.transition.delta,
            %error,
            "Vote rolled back"
        );

        match error {
            ClientError::Unauthorized(_) => VoteFeedback::SignInRequired {
                redirect: SIGN_IN_REDIRECT.to_string(),
            },
            _ => VoteFeedback::RolledBack(Notice::error(
                "Something went wrong",
                "Your vote was not registered, please try again",
            )),
        }
    }

    /// Begin, send `(target, action)` through `send`, settle.
    pub async fn vote<F, Fut>(&mut self, action: VoteType, send: F) -> VoteFeedback
    where
        F: FnOnce(VoteTarget, VoteType) -> Fut,
        Fut: Future<Output = ClientResult<VoteSummary>>,
    {
        let pending = self.begin(action);
        let result = send(pending.target, pending.action).await;
        self.settle(pending, result)
    }

    pub async fn vote_with(&mut self, client: &ForumClient, action: VoteType) -> VoteFeedback {
        self.vote(action, |target, vote_type| async move {
            match target {
                VoteTarget::Post(id) => client.vote_post(id, vote_type).await,
                VoteTarget::Comment(id) => client.vote_comment(id, vote_type).await,
            }
        })
        .await
    }

    /// Replaces local state with server truth after a refetch.
    pub fn resync(&mut self, score: i64, current_vote: Option<VoteType>) {
        self.state = VoteState::new(score, current_vote);
    }
}
