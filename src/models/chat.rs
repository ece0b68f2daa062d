use serde::{ Serialize, Deserialize };
use serde_json::{ Map, Value as JsonValue };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Role a turn must carry at `index` inside a record.
    pub fn for_index(index: usize) -> Role {
        if index == 0 {
            Role::System
        } else if index % 2 == 1 {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One training example: a system turn followed by alternating user/assistant turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub messages: Vec<Turn>,
    /// Keys other than `messages` found on a stored line, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ConversationRecord {
    pub fn new(messages: Vec<Turn>) -> Self {
        Self { messages, extra: Map::new() }
    }

    pub fn system_text(&self) -> &str {
        self.messages
            .first()
            .map(|t| t.content.as_str())
            .unwrap_or_default()
    }

    /// Turn 0 is system and the rest strictly alternate user, assistant.
    pub fn is_well_formed(&self) -> bool {
        !self.messages.is_empty() &&
            self.messages
                .iter()
                .enumerate()
                .all(|(i, turn)| turn.role == Role::for_index(i))
    }

    /// Number of complete user/assistant pairs with non-empty content on both sides.
    pub fn complete_pairs(&self) -> usize {
        self.messages
            .iter()
            .skip(1)
            .collect::<Vec<_>>()
            .chunks_exact(2)
            .filter(|pair| !pair[0].content.is_empty() && !pair[1].content.is_empty())
            .count()
    }

    pub fn is_append_eligible(&self) -> bool {
        self.messages.len() > 2 && self.is_well_formed() && self.complete_pairs() > 0
    }

    pub fn project(&self) -> RecordRow {
        let join_role = |role: Role| {
            self.messages
                .iter()
                .filter(|t| t.role == role)
                .map(|t| t.content.as_str())
                .collect::<Vec<_>>()
                .join(ROW_SEPARATOR)
        };

        RecordRow {
            system: self.system_text().to_string(),
            users: join_role(Role::User),
            assistants: join_role(Role::Assistant),
        }
    }
}

pub const ROW_SEPARATOR: &str = " | ";

/// Flattened, display-only view of a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub system: String,
    pub users: String,
    pub assistants: String,
}
