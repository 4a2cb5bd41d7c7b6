//! Append-only conversation history.
//!
//! ```rust
//! use tchat::Transcript;
//! use tprovider::{Message, Role};
//!
//! let mut transcript = Transcript::new();
//! transcript.append(Message::user("What year did WW2 start?"));
//! transcript.append(Message::assistant("1939"));
//!
//! assert_eq!(transcript.len(), 2);
//! assert_eq!(transcript.last().map(Message::role), Some(Role::Assistant));
//! ```

use tprovider::{Message, Role};

/// Messages in the order they were exchanged.
///
/// Entries are only ever appended; nothing reorders or removes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages
            .iter()
            .filter(|message| message.role() == role)
            .count()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;
    use tprovider::FunctionCall;

    use super::*;

    #[test]
    fn each_tool_round_trip_adds_two_entries() {
        let mut transcript = Transcript::from_messages([Message::user("convert this")]);

        for round in 0..3 {
            let before = transcript.len();
            transcript.append(Message::assistant_function_call(
                "",
                FunctionCall::new(format!("tool_{round}"), Map::new()),
            ));
            transcript.append(Message::function(format!("result {round}")));
            assert_eq!(transcript.len(), before + 2);
        }

        assert_eq!(transcript.count_role(Role::Function), 3);
        assert_eq!(transcript.messages()[0].content(), "convert this");
    }
}
