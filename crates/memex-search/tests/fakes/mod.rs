//! In-memory fakes of the core traits for engine-level tests.
//!
//! The vector index fake computes real cosine similarities so ranking
//! behavior is exercised, not just echoed.

// Each test binary uses a different subset of the fakes.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use memex_core::{
    new_v7, Conversation, CreateNoteRequest, DirectBacklink, Edge, EdgeRepository,
    EmbeddingBackend, EmbeddingCollection, EntityStore, Error, Message, Note, NoteRepository,
    Result, Role, TitleSuggestion, Vector, VectorHit, VectorIndex,
};

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Deterministic embedding backend: returns pre-seeded vectors per
/// exact input text, or fails wholesale when `fail` is set.
#[derive(Default)]
pub struct FakeEmbedder {
    pub vectors: Mutex<HashMap<String, Vec<f32>>>,
    pub fail: bool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub fn seed(&self, text: &str, vector: Vec<f32>) {
        self.vectors
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }
}

#[async_trait]
impl EmbeddingBackend for FakeEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if self.fail {
            return Err(Error::Embedding("provider unavailable".to_string()));
        }
        let vectors = self.vectors.lock().unwrap();
        texts
            .iter()
            .map(|t| {
                vectors
                    .get(t.trim())
                    .cloned()
                    .map(Vector::from)
                    .ok_or_else(|| Error::Embedding(format!("no fixture vector for '{}'", t)))
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Shared in-memory world: entities plus their current vectors.
#[derive(Default)]
pub struct FakeStore {
    pub conversations: Mutex<HashMap<Uuid, Conversation>>,
    pub messages: Mutex<HashMap<Uuid, Message>>,
    pub notes: Mutex<HashMap<Uuid, Note>>,
    pub message_vectors: Mutex<HashMap<Uuid, Vec<f32>>>,
    pub note_vectors: Mutex<HashMap<Uuid, Vec<f32>>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_conversation(&self, owner_id: Uuid) -> Uuid {
        let id = new_v7();
        self.conversations.lock().unwrap().insert(
            id,
            Conversation {
                id,
                owner_id,
                title: None,
                created_at_utc: Utc::now(),
            },
        );
        id
    }

    pub fn add_message(&self, conversation_id: Uuid, content: &str, vector: Vec<f32>) -> Uuid {
        let id = new_v7();
        self.messages.lock().unwrap().insert(
            id,
            Message {
                id,
                conversation_id,
                role: Role::User,
                content: content.to_string(),
                created_at_utc: Utc::now(),
            },
        );
        self.message_vectors.lock().unwrap().insert(id, vector);
        id
    }

    pub fn add_note(
        &self,
        owner_id: Uuid,
        title: Option<&str>,
        content: &str,
        vector: Vec<f32>,
    ) -> Uuid {
        let id = new_v7();
        self.notes.lock().unwrap().insert(
            id,
            Note {
                id,
                owner_id,
                title: title.map(String::from),
                content: content.to_string(),
                position_x: 0.0,
                position_y: 0.0,
                width: 260.0,
                height: 140.0,
                source: Default::default(),
                source_ref: None,
                parent_id: None,
                created_at_utc: Utc::now(),
                updated_at_utc: Utc::now(),
            },
        );
        if !vector.is_empty() {
            self.note_vectors.lock().unwrap().insert(id, vector);
        }
        id
    }

    /// Remove a note and its vector (the entity half of cascade delete;
    /// edges are cascaded by `EdgeRepository::delete_for_note`).
    pub fn remove_note(&self, id: Uuid) {
        self.notes.lock().unwrap().remove(&id);
        self.note_vectors.lock().unwrap().remove(&id);
    }

    fn search_map(&self, vectors: &HashMap<Uuid, Vec<f32>>, query: &[f32], k: i64) -> Vec<VectorHit> {
        let mut hits: Vec<VectorHit> = vectors
            .iter()
            .map(|(id, vec)| VectorHit {
                entity_id: *id,
                score: cosine_similarity(query, vec),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(k as usize);
        hits
    }
}

#[async_trait]
impl EntityStore for FakeStore {
    async fn get_message(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Message>> {
        let messages = self.messages.lock().unwrap();
        let conversations = self.conversations.lock().unwrap();
        Ok(messages.get(&id).cloned().filter(|m| {
            conversations
                .get(&m.conversation_id)
                .is_some_and(|c| c.owner_id == owner_id)
        }))
    }

    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        let notes = self.notes.lock().unwrap();
        Ok(notes.get(&id).cloned().filter(|n| n.owner_id == owner_id))
    }
}

#[async_trait]
impl VectorIndex for FakeStore {
    async fn search(
        &self,
        collection: EmbeddingCollection,
        query: &Vector,
        k: i64,
    ) -> Result<Vec<VectorHit>> {
        let query = query.as_slice();
        let hits = match collection {
            EmbeddingCollection::Messages => {
                self.search_map(&self.message_vectors.lock().unwrap(), query, k)
            }
            EmbeddingCollection::Notes => {
                self.search_map(&self.note_vectors.lock().unwrap(), query, k)
            }
        };
        Ok(hits)
    }
}

/// In-memory edge repository sharing the store for owner checks.
pub struct FakeEdges {
    store: Arc<FakeStore>,
    pub edges: Mutex<Vec<Edge>>,
}

impl FakeEdges {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self {
            store,
            edges: Mutex::new(Vec::new()),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.lock().unwrap().len()
    }
}

#[async_trait]
impl EdgeRepository for FakeEdges {
    async fn create(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        label: Option<&str>,
    ) -> Result<Option<Uuid>> {
        let mut edges = self.edges.lock().unwrap();
        if edges
            .iter()
            .any(|e| e.source_id == source_id && e.target_id == target_id)
        {
            return Ok(None);
        }
        let id = new_v7();
        edges.push(Edge {
            id,
            source_id,
            target_id,
            label: label.map(String::from),
            created_at_utc: Utc::now(),
        });
        Ok(Some(id))
    }

    async fn get_outgoing(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<Edge>> {
        let notes = self.store.notes.lock().unwrap();
        if !notes.get(&note_id).is_some_and(|n| n.owner_id == owner_id) {
            return Ok(Vec::new());
        }
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.source_id == note_id)
            .cloned()
            .collect())
    }

    async fn get_incoming(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<DirectBacklink>> {
        let notes = self.store.notes.lock().unwrap();
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.target_id == note_id)
            .filter_map(|e| {
                let source = notes.get(&e.source_id)?;
                if source.owner_id != owner_id {
                    return None;
                }
                let target_owned = notes.get(&e.target_id).is_some_and(|n| n.owner_id == owner_id);
                if !target_owned {
                    return None;
                }
                Some(DirectBacklink {
                    edge_id: e.id,
                    label: e.label.clone(),
                    note: source.clone(),
                })
            })
            .collect())
    }

    async fn delete(&self, edge_id: Uuid, _owner_id: Uuid) -> Result<()> {
        let mut edges = self.edges.lock().unwrap();
        let before = edges.len();
        edges.retain(|e| e.id != edge_id);
        if edges.len() == before {
            return Err(Error::NotFound("edge".to_string()));
        }
        Ok(())
    }

    async fn delete_for_note(&self, note_id: Uuid) -> Result<()> {
        self.edges
            .lock()
            .unwrap()
            .retain(|e| e.source_id != note_id && e.target_id != note_id);
        Ok(())
    }
}

/// In-memory note repository over the shared store, used by the
/// wiki-link and backlink tests.
pub struct FakeNotes {
    store: Arc<FakeStore>,
}

impl FakeNotes {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self { store }
    }

    fn normalized(title: &str) -> String {
        title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }
}

#[async_trait]
impl NoteRepository for FakeNotes {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        Ok(self.store.add_note(
            req.owner_id,
            req.title.as_deref(),
            &req.content,
            Vec::new(),
        ))
    }

    async fn fetch(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        self.store.get_note(id, owner_id).await
    }

    async fn update_content(&self, id: Uuid, owner_id: Uuid, content: &str) -> Result<()> {
        let mut notes = self.store.notes.lock().unwrap();
        match notes.get_mut(&id).filter(|n| n.owner_id == owner_id) {
            Some(note) => {
                note.content = content.to_string();
                note.updated_at_utc = Utc::now();
                Ok(())
            }
            None => Err(Error::NotFound("note".to_string())),
        }
    }

    async fn update_title(&self, id: Uuid, owner_id: Uuid, title: &str) -> Result<()> {
        let mut notes = self.store.notes.lock().unwrap();
        match notes.get_mut(&id).filter(|n| n.owner_id == owner_id) {
            Some(note) => {
                note.title = Some(title.to_string());
                Ok(())
            }
            None => Err(Error::NotFound("note".to_string())),
        }
    }

    async fn update_geometry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        position_x: f64,
        position_y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let mut notes = self.store.notes.lock().unwrap();
        match notes.get_mut(&id).filter(|n| n.owner_id == owner_id) {
            Some(note) => {
                note.position_x = position_x;
                note.position_y = position_y;
                note.width = width;
                note.height = height;
                Ok(())
            }
            None => Err(Error::NotFound("note".to_string())),
        }
    }

    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut notes = self.store.notes.lock().unwrap();
        if !notes.get(&id).is_some_and(|n| n.owner_id == owner_id) {
            return Err(Error::NotFound("note".to_string()));
        }
        notes.remove(&id);
        drop(notes);
        self.store.note_vectors.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn find_by_title(&self, owner_id: Uuid, title: &str) -> Result<Option<Note>> {
        let key = Self::normalized(title);
        let notes = self.store.notes.lock().unwrap();
        let mut matches: Vec<&Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .filter(|n| n.title.as_deref().map(Self::normalized).as_deref() == Some(&key))
            .collect();
        matches.sort_by_key(|n| n.id);
        Ok(matches.first().map(|n| (*n).clone()))
    }

    async fn suggest_titles(
        &self,
        owner_id: Uuid,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<TitleSuggestion>> {
        let needle = fragment.trim().to_lowercase();
        let notes = self.store.notes.lock().unwrap();
        let mut matches: Vec<&Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .filter(|n| {
                n.title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect();
        // UUIDv7 order == creation order
        matches.sort_by_key(|n| n.id);
        matches.truncate(limit as usize);
        Ok(matches
            .into_iter()
            .map(|n| TitleSuggestion {
                note_id: n.id,
                title: n.title.clone().unwrap_or_default(),
            })
            .collect())
    }

    async fn scan_wiki_candidates(&self, owner_id: Uuid, title: &str) -> Result<Vec<Note>> {
        let needle = title.trim().to_lowercase();
        let notes = self.store.notes.lock().unwrap();
        let mut matches: Vec<Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .filter(|n| {
                n.content.contains("[[") && n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|n| n.id);
        Ok(matches)
    }
}
