use crate::builder::Session;
use crate::dataset::{ self, CodecError };
use crate::models::chat::{ ConversationRecord, RecordRow };
use crate::store::{ BlobKey, RemoteStore, StoreError };
use log::{ info, warn };
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("conversation needs at least one complete user/assistant exchange")]
    IneligibleRecord,

    #[error("row {index} is outside the displayed window of {window} rows")]
    IndexOutOfRange {
        index: usize,
        window: usize,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("error fetching dataset: {0}")]
    RemoteRead(#[source] StoreError),

    #[error("error updating dataset: {0}")]
    RemoteWrite(#[source] StoreError),
}

/// The tail of the dataset as shown in the management view.
#[derive(Debug, Clone, Default)]
pub struct RecentWindow {
    pub records: Vec<ConversationRecord>,
    pub rows: Vec<RecordRow>,
    /// Size of the whole dataset, not just the window.
    pub total: usize,
    /// Set when the dataset file does not exist yet.
    pub warning: Option<String>,
}

struct Fetched {
    records: Vec<ConversationRecord>,
    missing: bool,
}

/// Read-modify-write operations on the dataset blob.
///
/// Every operation downloads the whole file first and uploads the whole file
/// afterwards. There is no version check between the two, so the last writer
/// wins.
#[derive(Clone)]
pub struct DatasetEditor {
    store: Arc<dyn RemoteStore>,
    key: BlobKey,
}

impl DatasetEditor {
    pub fn new(store: Arc<dyn RemoteStore>, key: BlobKey) -> Self {
        Self { store, key }
    }

    pub fn key(&self) -> &BlobKey {
        &self.key
    }

    async fn fetch(&self) -> Result<Fetched, EditorError> {
        match self.store.get(&self.key).await {
            Ok(bytes) => {
                let records = dataset::decode(&bytes)?;
                Ok(Fetched { records, missing: false })
            }
            Err(e) if e.is_not_found() => {
                warn!("Dataset file '{}' not found, starting from an empty dataset", self.key);
                Ok(Fetched { records: Vec::new(), missing: true })
            }
            Err(e) => Err(EditorError::RemoteRead(e)),
        }
    }

    async fn write(&self, records: &[ConversationRecord]) -> Result<(), EditorError> {
        let bytes = dataset::encode(records)?;
        self.store.put(&self.key, bytes).await.map_err(EditorError::RemoteWrite)
    }

    /// Appends `record` and returns the new dataset size.
    pub async fn append(&self, record: &ConversationRecord) -> Result<usize, EditorError> {
        if !record.is_append_eligible() {
            return Err(EditorError::IneligibleRecord);
        }

        let mut records = self.fetch().await?.records;
        records.push(record.clone());
        self.write(&records).await?;

        info!("Appended conversation to '{}' ({} records)", self.key, records.len());
        Ok(records.len())
    }

    /// Appends the session's working record, then resets the session for the next one.
    /// On failure the session is left exactly as it was.
    pub async fn commit(&self, session: &mut Session) -> Result<usize, EditorError> {
        let record = session.builder.snapshot();
        let total = self.append(&record).await?;
        session.advance(&record);
        Ok(total)
    }

    pub async fn list_recent(&self, n: usize) -> Result<RecentWindow, EditorError> {
        let fetched = self.fetch().await?;
        let total = fetched.records.len();
        let start = total.saturating_sub(n);
        let records = fetched.records[start..].to_vec();
        let rows = records
            .iter()
            .map(|r| r.project())
            .collect();

        Ok(RecentWindow {
            records,
            rows,
            total,
            warning: fetched.missing.then(|| format!("Dataset file '{}' not found.", self.key.path)),
        })
    }

    /// Deletes rows of the last-`window` view. Index 0 is the oldest row shown.
    /// Returns how many records were removed.
    pub async fn delete(&self, indices: &[usize], window: usize) -> Result<usize, EditorError> {
        if indices.is_empty() {
            return Ok(0);
        }

        let mut records = self.fetch().await?.records;
        let len = records.len();
        let shown = window.min(len);

        let selected: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(&index) = selected.iter().find(|&&i| i >= shown) {
            return Err(EditorError::IndexOutOfRange { index, window: shown });
        }

        // Highest first, so earlier removals never shift a pending position.
        for &i in selected.iter().rev() {
            records.remove(len - shown + i);
        }
        self.write(&records).await?;

        info!("Deleted {} record(s) from '{}', {} remain", selected.len(), self.key, records.len());
        Ok(selected.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ Role, Turn };
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn key() -> BlobKey {
        BlobKey::new("owner/repo", "data.jsonl")
    }

    fn record(tag: &str) -> ConversationRecord {
        ConversationRecord::new(
            vec![
                Turn::system(format!("sys-{}", tag)),
                Turn::user(format!("q-{}", tag)),
                Turn::assistant(format!("a-{}", tag))
            ]
        )
    }

    fn seeded(records: &[ConversationRecord]) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_blob(key(), dataset::encode(records).unwrap()))
    }

    fn stored(store: &MemoryStore) -> Vec<ConversationRecord> {
        dataset::decode(&store.blob(&key()).unwrap()).unwrap()
    }

    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl RemoteStore for ReadOnlyStore {
        async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StoreError> {
            self.0.get(key).await
        }

        async fn put(&self, _key: &BlobKey, _bytes: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Status {
                status: reqwest::StatusCode::FORBIDDEN,
                body: "read-only".into(),
            })
        }
    }

    /// Every read fails with a gateway error; writes land in the inner store.
    struct UnreachableStore(MemoryStore);

    #[async_trait]
    impl RemoteStore for UnreachableStore {
        async fn get(&self, _key: &BlobKey) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream unavailable".into(),
            })
        }

        async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> Result<(), StoreError> {
            self.0.put(key, bytes).await
        }
    }

    #[tokio::test]
    async fn short_records_are_rejected_without_io() {
        let store = Arc::new(MemoryStore::new());
        let editor = DatasetEditor::new(store.clone(), key());

        let one = ConversationRecord::new(vec![Turn::system("s")]);
        let two = ConversationRecord::new(vec![Turn::system("s"), Turn::user("q")]);
        for r in [one, two] {
            assert!(matches!(editor.append(&r).await, Err(EditorError::IneligibleRecord)));
        }
        assert_eq!(store.get_calls(), 0);
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn commit_appends_and_resets_session() {
        let store = seeded(&[record("a"), record("b")]);
        let editor = DatasetEditor::new(store.clone(), key());

        let mut session = Session::new("default");
        session.builder.set_system_message("sys-c");
        session.builder.set_turn(1, Role::User, "q-c").unwrap();
        session.builder.set_turn(1, Role::Assistant, "a-c").unwrap();

        assert_eq!(editor.commit(&mut session).await.unwrap(), 3);
        assert_eq!(stored(&store), vec![record("a"), record("b"), record("c")]);
        assert_eq!(store.put_calls(), 1);
        assert_eq!(session.builder.snapshot().messages, vec![Turn::system("sys-c")]);
        assert_eq!(session.conversation_count, 2);
    }

    #[tokio::test]
    async fn append_creates_missing_file() {
        let store = Arc::new(MemoryStore::new());
        let editor = DatasetEditor::new(store.clone(), key());
        assert_eq!(editor.append(&record("a")).await.unwrap(), 1);
        assert_eq!(stored(&store), vec![record("a")]);
    }

    #[tokio::test]
    async fn malformed_remote_file_is_never_overwritten() {
        let store = Arc::new(MemoryStore::with_blob(key(), b"not json".to_vec()));
        let editor = DatasetEditor::new(store.clone(), key());

        let err = editor.append(&record("a")).await.unwrap_err();
        assert!(matches!(err, EditorError::Codec(CodecError::MalformedRecord { line: 1, .. })));
        assert_eq!(store.put_calls(), 0);
        assert_eq!(store.blob(&key()).unwrap(), b"not json");
    }

    #[tokio::test]
    async fn failed_upload_leaves_session_untouched() {
        let inner = MemoryStore::with_blob(key(), dataset::encode(&[record("a")]).unwrap());
        let editor = DatasetEditor::new(Arc::new(ReadOnlyStore(inner)), key());

        let mut session = Session::new("s");
        session.builder.set_turn(1, Role::User, "q").unwrap();
        session.builder.set_turn(1, Role::Assistant, "a").unwrap();
        let before = session.builder.snapshot();

        let err = editor.commit(&mut session).await.unwrap_err();
        assert!(matches!(err, EditorError::RemoteWrite(_)));
        assert_eq!(session.builder.snapshot(), before);
        assert_eq!(session.conversation_count, 1);
    }

    #[tokio::test]
    async fn failed_read_aborts_append_without_upload() {
        let store = Arc::new(UnreachableStore(MemoryStore::new()));
        let editor = DatasetEditor::new(store.clone(), key());

        let err = editor.append(&record("a")).await.unwrap_err();
        match err {
            EditorError::RemoteRead(StoreError::Status { status, .. }) => {
                assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
            }
            other => panic!("expected a read failure, got {:?}", other),
        }
        assert_eq!(store.0.put_calls(), 0);
        assert!(store.0.blob(&key()).is_none());
    }

    #[tokio::test]
    async fn failed_read_leaves_session_untouched() {
        let store = Arc::new(UnreachableStore(MemoryStore::new()));
        let editor = DatasetEditor::new(store.clone(), key());

        let mut session = Session::new("s");
        session.builder.set_turn(1, Role::User, "q").unwrap();
        session.builder.set_turn(1, Role::Assistant, "a").unwrap();
        let before = session.builder.snapshot();
        let revision = session.builder.revision();

        let err = editor.commit(&mut session).await.unwrap_err();
        assert!(matches!(err, EditorError::RemoteRead(_)));
        assert_eq!(store.0.put_calls(), 0);
        assert_eq!(session.builder.snapshot(), before);
        assert_eq!(session.builder.revision(), revision);
        assert_eq!(session.conversation_count, 1);
    }

    #[tokio::test]
    async fn lists_the_tail_in_order() {
        let all: Vec<_> = (0..15).map(|i| record(&i.to_string())).collect();
        let editor = DatasetEditor::new(seeded(&all), key());

        let window = editor.list_recent(10).await.unwrap();
        assert_eq!(window.total, 15);
        assert_eq!(window.records, all[5..].to_vec());
        assert_eq!(window.rows[0].users, "q-5");
        assert_eq!(window.rows[9].assistants, "a-14");
        assert!(window.warning.is_none());
    }

    #[tokio::test]
    async fn missing_file_lists_empty_with_warning() {
        let editor = DatasetEditor::new(Arc::new(MemoryStore::new()), key());
        let window = editor.list_recent(10).await.unwrap();
        assert!(window.rows.is_empty());
        assert_eq!(window.total, 0);
        assert!(window.warning.unwrap().contains("data.jsonl"));
    }

    #[tokio::test]
    async fn delete_maps_window_rows_to_dataset_positions() {
        let all: Vec<_> = (0..15).map(|i| record(&i.to_string())).collect();
        let store = seeded(&all);
        let editor = DatasetEditor::new(store.clone(), key());

        assert_eq!(editor.delete(&[9, 0], 10).await.unwrap(), 2);

        let expected: Vec<_> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 5 && *i != 14)
            .map(|(_, r)| r.clone())
            .collect();
        assert_eq!(stored(&store), expected);
        assert_eq!(store.put_calls(), 1);
    }

    #[tokio::test]
    async fn delete_in_short_dataset_uses_rows_shown() {
        let store = seeded(&[record("a"), record("b"), record("c")]);
        let editor = DatasetEditor::new(store.clone(), key());

        editor.delete(&[0, 0], 10).await.unwrap();
        assert_eq!(stored(&store), vec![record("b"), record("c")]);
    }

    #[tokio::test]
    async fn delete_outside_window_is_rejected() {
        let store = seeded(&[record("a"), record("b")]);
        let editor = DatasetEditor::new(store.clone(), key());

        let err = editor.delete(&[1, 2], 10).await.unwrap_err();
        assert!(matches!(err, EditorError::IndexOutOfRange { index: 2, window: 2 }));
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn empty_selection_does_nothing() {
        let store = seeded(&[record("a")]);
        let editor = DatasetEditor::new(store.clone(), key());
        assert_eq!(editor.delete(&[], 10).await.unwrap(), 0);
        assert_eq!(store.get_calls(), 0);
        assert_eq!(store.put_calls(), 0);
    }
}
