use crate::models::chat::{ ConversationRecord, Role, Turn };
use log::debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("pair {pair} cannot be filled before pair {expected}")]
    PairOutOfOrder {
        pair: usize,
        expected: usize,
    },

    #[error("turns of role '{0}' are not addressed by pair index")]
    NotAPairRole(Role),
}

/// Working copy of the conversation being authored.
///
/// Every real mutation bumps `revision`; writes that would leave the content
/// unchanged are skipped and leave it untouched.
#[derive(Clone, Debug)]
pub struct ConversationBuilder {
    messages: Vec<Turn>,
    revision: u64,
}

impl ConversationBuilder {
    pub fn new(system_message: impl Into<String>) -> Self {
        Self {
            messages: vec![Turn::system(system_message)],
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn system_message(&self) -> &str {
        &self.messages[0].content
    }

    pub fn pair_count(&self) -> usize {
        self.messages.len() / 2
    }

    pub fn turn(&self, pair: usize, role: Role) -> Option<&Turn> {
        Self::index_of(pair, role)
            .ok()
            .and_then(|i| self.messages.get(i))
    }

    pub fn set_system_message(&mut self, text: &str) -> bool {
        if self.messages[0].content == text {
            return false;
        }
        self.messages[0].content = text.to_string();
        self.revision += 1;
        true
    }

    /// Writes `text` into the user or assistant turn of pair `pair` (1-based).
    ///
    /// Empty text never writes. Opening a pair materializes both of its turns,
    /// so the record always holds whole pairs. Only the next unopened pair may
    /// be written.
    pub fn set_turn(&mut self, pair: usize, role: Role, text: &str) -> Result<bool, BuilderError> {
        let expected = self.pair_count() + 1;
        if pair > expected {
            return Err(BuilderError::PairOutOfOrder { pair, expected });
        }
        let index = Self::index_of(pair, role)?;
        if text.is_empty() {
            return Ok(false);
        }

        self.ensure_len(2 * pair + 1);
        let turn = &mut self.messages[index];
        if turn.content == text {
            return Ok(false);
        }
        turn.content = text.to_string();
        self.revision += 1;
        Ok(true)
    }

    pub fn add_pair(&mut self) {
        self.ensure_len(self.messages.len() + 2);
    }

    pub fn clear(&mut self) {
        if self.messages.len() == 1 {
            return;
        }
        self.messages.truncate(1);
        self.revision += 1;
    }

    pub fn snapshot(&self) -> ConversationRecord {
        ConversationRecord::new(self.messages.clone())
    }

    /// Starts a fresh record carrying `system_message`.
    pub fn reset(&mut self, system_message: &str) {
        self.messages = vec![Turn::system(system_message)];
        self.revision += 1;
    }

    fn ensure_len(&mut self, len: usize) {
        let before = self.messages.len();
        while self.messages.len() < len {
            let role = Role::for_index(self.messages.len());
            self.messages.push(Turn::new(role, ""));
        }
        if self.messages.len() != before {
            debug!("padded working record from {} to {} turns", before, len);
            self.revision += 1;
        }
    }

    fn index_of(pair: usize, role: Role) -> Result<usize, BuilderError> {
        if pair == 0 {
            return Err(BuilderError::PairOutOfOrder { pair, expected: 1 });
        }
        let assistant = pair
            .checked_mul(2)
            .ok_or(BuilderError::PairOutOfOrder { pair, expected: 1 })?;
        match role {
            Role::User => Ok(assistant - 1),
            Role::Assistant => Ok(assistant),
            Role::System => Err(BuilderError::NotAPairRole(role)),
        }
    }
}

/// Notice level shown to the operator after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

/// Per-operator state kept by the form renderer between interactions.
#[derive(Clone, Debug)]
pub struct Session {
    pub builder: ConversationBuilder,
    pub conversation_count: usize,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(default_system_message: &str) -> Self {
        Self {
            builder: ConversationBuilder::new(default_system_message),
            conversation_count: 1,
            notices: Vec::new(),
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Resets the builder after `record` was stored and advances the counter.
    pub fn advance(&mut self, record: &ConversationRecord) {
        self.builder.reset(record.system_text());
        self.conversation_count += 1;
    }
}
