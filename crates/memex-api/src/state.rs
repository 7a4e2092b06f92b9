//! Shared application state.

use std::sync::Arc;

use memex_core::EmbeddingBackend;
use memex_db::Database;
use memex_search::{BacklinkResolver, LinkMaterializer, RelatednessEngine, WikiLinkResolver};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub embedder: Arc<dyn EmbeddingBackend>,
    pub engine: Arc<RelatednessEngine>,
    pub materializer: Arc<LinkMaterializer>,
    pub backlinks: Arc<BacklinkResolver>,
    pub wikilinks: Arc<WikiLinkResolver>,
}

impl AppState {
    /// Wire the search components over a database and embedding backend.
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        let pool = db.pool().clone();
        let entities: Arc<Database> = Arc::new(db.clone());
        let index = Arc::new(memex_db::PgEmbeddingRepository::new(pool.clone()));
        let edges = Arc::new(memex_db::PgEdgeRepository::new(pool.clone()));
        let notes = Arc::new(memex_db::PgNoteRepository::new(pool));

        let engine = Arc::new(RelatednessEngine::new(
            embedder.clone(),
            index,
            entities,
        ));
        let materializer = Arc::new(LinkMaterializer::new(edges.clone()));
        let backlinks = Arc::new(BacklinkResolver::new(edges, notes.clone()));
        let wikilinks = Arc::new(WikiLinkResolver::new(notes));

        Self {
            db,
            embedder,
            engine,
            materializer,
            backlinks,
            wikilinks,
        }
    }
}
