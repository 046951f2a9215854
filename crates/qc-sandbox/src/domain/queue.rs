//! # Message Queue
//!
//! FIFO of messages awaiting delivery. The head is delivered next; messages a
//! transaction emits are appended to the tail, which yields breadth-first
//! causal ordering across one root message's closure.

use crate::domain::entities::{Message, MessageKind};
use crate::errors::SandboxError;
use std::collections::VecDeque;

/// Pending inbound messages.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    messages: VecDeque<Message>,
    limit: Option<usize>,
}

impl MessageQueue {
    /// Creates an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue that refuses to grow past `limit` messages.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit: Some(limit),
        }
    }

    /// Schedules a message for delivery.
    ///
    /// External-out messages are output only and are rejected here.
    pub fn push(&mut self, message: Message) -> Result<(), SandboxError> {
        if message.kind() == MessageKind::ExternalOut {
            return Err(SandboxError::InvalidMessageKind);
        }
        self.append(message)
    }

    /// Appends a message emitted by a transaction.
    ///
    /// Unlike [`MessageQueue::push`] this accepts external-out messages; they
    /// are dropped when they reach the head.
    pub fn append(&mut self, message: Message) -> Result<(), SandboxError> {
        if let Some(limit) = self.limit {
            if self.messages.len() >= limit {
                return Err(SandboxError::QueueFull { limit });
            }
        }
        self.messages.push_back(message);
        Ok(())
    }

    /// Appends every message a transaction emitted, or none of them.
    ///
    /// On `QueueFull` the queue is unchanged.
    pub fn append_all(&mut self, messages: &[Message]) -> Result<(), SandboxError> {
        if let Some(limit) = self.limit {
            if self.messages.len() + messages.len() > limit {
                return Err(SandboxError::QueueFull { limit });
            }
        }
        self.messages.extend(messages.iter().cloned());
        Ok(())
    }

    /// Head message, if any.
    #[must_use]
    pub fn front(&self) -> Option<&Message> {
        self.messages.front()
    }

    /// Removes the head message.
    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Copy of the pending messages, head first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Drops every pending message, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.messages.len();
        self.messages.clear();
        n
    }
}
