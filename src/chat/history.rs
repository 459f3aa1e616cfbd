//! The conversation store.
//!
//! An append-only ordered log of messages plus the running token totals.
//! All mutation goes through the operations here: append, patch by
//! identity, and clear-all. Patching is idempotent so that a generalization
//! to overlapping streams cannot double-count totals.

use crate::types::{Message, Role, TokenUsage};
use crate::utils::time::now_unix_millis;

/// An ordered, append-only conversation log with running token totals.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    totals: TokenUsage,
    last_id: u64,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new message and returns its id.
    ///
    /// Ids are derived from the unix-millisecond clock but strictly
    /// increase even when two messages land in the same millisecond.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> u64 {
        let id = now_unix_millis().max(self.last_id + 1);
        self.last_id = id;
        self.messages.push(Message::new(id, role, text));
        id
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Appends a chunk of text to the message with the given id.
    ///
    /// Returns false if no such message exists.
    pub fn append_text(&mut self, id: u64, chunk: &str) -> bool {
        match self.find_mut(id) {
            Some(message) => {
                message.text.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Replaces the text of the message with the given id.
    pub fn replace_text(&mut self, id: u64, text: impl Into<String>) -> bool {
        match self.find_mut(id) {
            Some(message) => {
                message.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Records a usage snapshot on the message and adds it to the totals.
    ///
    /// Idempotent: a message's usage can be attached once; later attaches
    /// to the same message are no-ops, so totals are never double-counted.
    pub fn attach_usage(&mut self, id: u64, usage: TokenUsage) -> bool {
        let Some(message) = self.find_mut(id) else {
            return false;
        };
        if message.usage.is_some() {
            return false;
        }
        message.usage = Some(usage);
        self.totals += usage;
        true
    }

    /// Empties the log and zeroes the totals.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.totals = TokenUsage::default();
    }

    /// Returns the messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the running token totals.
    pub fn totals(&self) -> TokenUsage {
        self.totals
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the conversation holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let mut conversation = Conversation::new();
        let a = conversation.push(Role::User, "one");
        let b = conversation.push(Role::Assistant, "");
        let c = conversation.push(Role::User, "two");
        assert!(a < b && b < c);
    }

    #[test]
    fn append_and_replace() {
        let mut conversation = Conversation::new();
        let id = conversation.push(Role::Assistant, "");
        assert!(conversation.append_text(id, "Hel"));
        assert!(conversation.append_text(id, "lo"));
        assert_eq!(conversation.messages()[0].text, "Hello");

        assert!(conversation.replace_text(id, "gone"));
        assert_eq!(conversation.messages()[0].text, "gone");

        assert!(!conversation.append_text(id + 1, "x"));
    }

    #[test]
    fn attach_usage_is_idempotent() {
        let mut conversation = Conversation::new();
        let id = conversation.push(Role::Assistant, "hi");
        assert!(conversation.attach_usage(id, TokenUsage::new(3, 5, 8)));
        assert!(!conversation.attach_usage(id, TokenUsage::new(3, 5, 8)));
        assert_eq!(conversation.totals(), TokenUsage::new(3, 5, 8));
        assert_eq!(
            conversation.messages()[0].usage,
            Some(TokenUsage::new(3, 5, 8))
        );
    }

    #[test]
    fn totals_accumulate_across_messages() {
        let mut conversation = Conversation::new();
        let a = conversation.push(Role::Assistant, "");
        let b = conversation.push(Role::Assistant, "");
        conversation.attach_usage(a, TokenUsage::new(3, 5, 8));
        conversation.attach_usage(b, TokenUsage::new(1, 2, 3));
        assert_eq!(conversation.totals(), TokenUsage::new(4, 7, 11));
    }

    #[test]
    fn clear_resets_messages_and_totals() {
        let mut conversation = Conversation::new();
        let id = conversation.push(Role::Assistant, "hi");
        conversation.attach_usage(id, TokenUsage::new(3, 5, 8));

        conversation.clear();
        assert!(conversation.is_empty());
        assert!(conversation.totals().is_zero());
    }
}
