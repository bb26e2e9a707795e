//! Comments, polls and collaborators attached to a plan.
//!
//! Boards live in process memory only and are lost on restart.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use log::info;
use uuid::Uuid;

use crate::models::collaboration::{
    Board, Collaborator, CollaboratorRole, Comment, NewCollaborator, NewComment, NewPoll, Poll,
    VoteOption,
};

const ANONYMOUS_VOTER: &str = "anonymous";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CollaborationError {
    #[error("comment content is required")]
    EmptyComment,
    #[error("poll title is required")]
    MissingPollTitle,
    #[error("a poll needs at least two options")]
    NotEnoughOptions,
    #[error("poll '{0}' not found")]
    PollNotFound(String),
    #[error("option '{0}' not found")]
    OptionNotFound(String),
    #[error("poll is closed")]
    PollClosed,
    #[error("only the poll creator can close it")]
    NotPollCreator,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is already a collaborator")]
    AlreadyInvited(String),
}

/// The authenticated user acting on a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Poll {
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|o| o.votes.len()).sum()
    }

    /// Share of all votes for one option, rounded to a whole percent.
    pub fn percentage(&self, option_id: &str) -> u32 {
        let total = self.total_votes();
        if total == 0 {
            return 0;
        }
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map_or(0, |o| ((o.votes.len() as f64 / total as f64) * 100.0).round() as u32)
    }

    pub fn has_voted(&self, user_id: &str) -> bool {
        self.options
            .iter()
            .any(|o| o.votes.iter().any(|v| v == user_id))
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_time.map_or(true, |end| now < end)
    }

    /// Single choice moves the user's vote; multiple choice toggles it.
    pub fn vote(
        &mut self,
        user_id: &str,
        option_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollaborationError> {
        if !self.is_open(now) {
            return Err(CollaborationError::PollClosed);
        }
        if !self.options.iter().any(|o| o.id == option_id) {
            return Err(CollaborationError::OptionNotFound(option_id.to_string()));
        }

        let multiple = self.is_multiple_choice;
        for option in self.options.iter_mut() {
            let voted = option.votes.iter().position(|v| v == user_id);
            if option.id == option_id {
                match (voted, multiple) {
                    (Some(index), true) => {
                        option.votes.remove(index);
                    }
                    (None, _) => option.votes.push(user_id.to_string()),
                    (Some(_), false) => {}
                }
            } else if !multiple {
                if let Some(index) = voted {
                    option.votes.remove(index);
                }
            }
        }
        Ok(())
    }

    fn redact_votes(&mut self, viewer: Option<&str>) {
        if !self.is_anonymous {
            return;
        }
        for vote in self.options.iter_mut().flat_map(|o| o.votes.iter_mut()) {
            if Some(vote.as_str()) != viewer {
                *vote = ANONYMOUS_VOTER.to_string();
            }
        }
    }
}

#[derive(Default)]
pub struct CollaborationService {
    boards: RwLock<HashMap<String, Board>>,
}

impl CollaborationService {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_board<T>(&self, key: &str, f: impl FnOnce(&mut Board) -> T) -> T {
        let mut boards = self.boards.write().unwrap_or_else(|e| e.into_inner());
        f(boards.entry(key.to_string()).or_default())
    }

    /// Snapshot of a board. Voters on anonymous polls are hidden from
    /// everyone but themselves.
    pub fn board(&self, key: &str, viewer: Option<&str>) -> Board {
        let boards = self.boards.read().unwrap_or_else(|e| e.into_inner());
        let mut board = boards.get(key).cloned().unwrap_or_default();
        for poll in board.polls.iter_mut() {
            poll.redact_votes(viewer);
        }
        board
    }

    pub fn add_comment(
        &self,
        key: &str,
        author: &Participant,
        input: NewComment,
    ) -> Result<Comment, CollaborationError> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(CollaborationError::EmptyComment);
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author_id: author.id.clone(),
            author: author.name.clone(),
            content: content.to_string(),
            timestamp: Utc::now(),
            day_number: input.day_number,
            activity_id: input.activity_id,
        };

        self.with_board(key, |board| board.comments.insert(0, comment.clone()));
        Ok(comment)
    }

    pub fn create_poll(
        &self,
        key: &str,
        creator: &Participant,
        input: NewPoll,
    ) -> Result<Poll, CollaborationError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(CollaborationError::MissingPollTitle);
        }
        let options: Vec<VoteOption> = input
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|text| VoteOption {
                id: Uuid::new_v4().to_string(),
                text: text.to_string(),
                votes: Vec::new(),
            })
            .collect();
        if options.len() < 2 {
            return Err(CollaborationError::NotEnoughOptions);
        }

        let poll = Poll {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            creator_id: creator.id.clone(),
            creator: creator.name.clone(),
            options,
            is_multiple_choice: input.is_multiple_choice,
            is_anonymous: input.is_anonymous,
            end_time: input.end_time,
            is_active: true,
            created_at: Utc::now(),
        };

        self.with_board(key, |board| board.polls.insert(0, poll.clone()));
        info!("Poll '{}' created on plan '{}'", poll.title, key);
        Ok(poll)
    }

    pub fn vote(
        &self,
        key: &str,
        poll_id: &str,
        voter: &Participant,
        option_id: &str,
    ) -> Result<Poll, CollaborationError> {
        self.with_board(key, |board| {
            let poll = find_poll(board, poll_id)?;
            poll.vote(&voter.id, option_id, Utc::now())?;
            let mut snapshot = poll.clone();
            snapshot.redact_votes(Some(&voter.id));
            Ok(snapshot)
        })
    }

    pub fn close_poll(
        &self,
        key: &str,
        poll_id: &str,
        requester: &Participant,
    ) -> Result<Poll, CollaborationError> {
        self.with_board(key, |board| {
            let poll = find_poll(board, poll_id)?;
            if poll.creator_id != requester.id {
                return Err(CollaborationError::NotPollCreator);
            }
            poll.is_active = false;
            Ok(poll.clone())
        })
    }

    pub fn invite(
        &self,
        key: &str,
        inviter: &Participant,
        input: NewCollaborator,
    ) -> Result<Collaborator, CollaborationError> {
        let email = input.email.trim().to_string();
        let local_part = match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => local.to_string(),
            _ => return Err(CollaborationError::InvalidEmail(email)),
        };

        self.with_board(key, |board| {
            if board.collaborators.is_empty() {
                board.collaborators.push(Collaborator {
                    id: inviter.id.clone(),
                    name: inviter.name.clone(),
                    email: None,
                    role: CollaboratorRole::Owner,
                    invited_at: Utc::now(),
                });
            }
            if board
                .collaborators
                .iter()
                .any(|c| c.email.as_deref() == Some(email.as_str()))
            {
                return Err(CollaborationError::AlreadyInvited(email.clone()));
            }

            let collaborator = Collaborator {
                id: Uuid::new_v4().to_string(),
                name: input
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(local_part),
                email: Some(email.clone()),
                role: input.role.unwrap_or(CollaboratorRole::Editor),
                invited_at: Utc::now(),
            };
            board.collaborators.push(collaborator.clone());
            Ok(collaborator)
        })
    }
}

fn find_poll<'a>(board: &'a mut Board, poll_id: &str) -> Result<&'a mut Poll, CollaborationError> {
    board
        .polls
        .iter_mut()
        .find(|p| p.id == poll_id)
        .ok_or_else(|| CollaborationError::PollNotFound(poll_id.to_string()))
}
