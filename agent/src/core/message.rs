//! Ordered conversation buffer shared with the completion endpoint.

use serde::{Deserialize, Serialize};

/// Speaker tag for one conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged conversation entry. Never mutated after it enters the
/// log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only message log for one agent invocation.
///
/// Always begins with exactly one system message (enforced by
/// construction). Ordering is significant: the snapshot is exactly what
/// the completion endpoint sees, so entries are never reordered or
/// removed. The log is exclusively owned by the turn orchestrator; it is
/// not persisted across invocations (pre-seeded history arrives through
/// configuration instead).
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Create a log seeded with the system message.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append one entry in order.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append prior-history entries in their original order.
    pub fn extend(&mut self, history: impl IntoIterator<Item = Message>) {
        self.messages.extend(history);
    }

    /// The full ordered sequence, ready for transmission.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_begins_with_single_system_message() {
        let log = MessageLog::new("you are an agent");
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].role, Role::System);
        assert_eq!(log.snapshot()[0].content, "you are an agent");
    }

    #[test]
    fn append_preserves_order() {
        let mut log = MessageLog::new("system");
        log.append(Message::user("first"));
        log.append(Message::assistant("second"));
        log.append(Message::user("third"));

        let contents: Vec<&str> = log
            .snapshot()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["system", "first", "second", "third"]);
    }

    #[test]
    fn extend_inserts_history_in_original_order() {
        let mut log = MessageLog::new("system");
        log.extend(vec![Message::user("old question"), Message::assistant("old answer")]);
        log.append(Message::user("new question"));

        let roles: Vec<Role> = log.snapshot().iter().map(|message| message.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).expect("serialize");
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
