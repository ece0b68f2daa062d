use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Mutex;
use super::{ BlobKey, RemoteStore, StoreError };

/// Process-local blob store. Counts calls so callers can check how much I/O happened.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<BlobKey, Vec<u8>>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: BlobKey, bytes: Vec<u8>) -> Self {
        let store = Self::new();
        store.insert(key, bytes);
        store
    }

    pub fn insert(&self, key: BlobKey, bytes: Vec<u8>) {
        self.lock().insert(key, bytes);
    }

    pub fn blob(&self, key: &BlobKey) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BlobKey, Vec<u8>>> {
        // A poisoned map still holds whole blobs; keep serving it.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        debug!("memory get {}", key);
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        debug!("memory put {} ({} bytes)", key, bytes.len());
        self.lock().insert(key.clone(), bytes);
        Ok(())
    }
}
