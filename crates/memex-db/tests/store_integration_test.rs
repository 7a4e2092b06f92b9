//! Integration tests against a live PostgreSQL with the pgvector
//! extension. These are skipped by default; run with:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/memex_test \
//!     cargo test -p memex-db -- --ignored
//! ```

use uuid::Uuid;

use memex_core::{
    CreateNoteRequest, EdgeRepository, EmbeddingCollection, EmbeddingStore, JobRepository,
    JobType, NoteRepository, Vector, VectorIndex,
};
use memex_db::Database;

async fn connect() -> Database {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for -- --ignored");
    let db = Database::connect(&url).await.expect("connect");
    sqlx::migrate!("../../migrations")
        .run(db.pool())
        .await
        .expect("migrate");
    db
}

fn unit_vector(axis: usize) -> Vector {
    let mut v = vec![0.0f32; 1536];
    v[axis] = 1.0;
    Vector::from(v)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn set_embedding_overwrite_is_idempotent() {
    let db = connect().await;
    let owner = Uuid::new_v4();

    let note_id = db
        .notes
        .insert(CreateNoteRequest::new(owner, "overwrite me"))
        .await
        .unwrap();

    let v1 = unit_vector(0);
    let v2 = unit_vector(1);

    db.embeddings
        .set_embedding(EmbeddingCollection::Notes, note_id, &v1, "test-model")
        .await
        .unwrap();
    db.embeddings
        .set_embedding(EmbeddingCollection::Notes, note_id, &v2, "test-model")
        .await
        .unwrap();

    // Exactly one current vector, and it is the second write.
    let current = db
        .embeddings
        .get_embedding(EmbeddingCollection::Notes, note_id)
        .await
        .unwrap()
        .expect("vector present");
    assert_eq!(current, v2);

    // The index sees the note once, ranked by the new vector.
    let hits = db
        .embeddings
        .search(EmbeddingCollection::Notes, &v2, 10)
        .await
        .unwrap();
    let matching: Vec<_> = hits.iter().filter(|h| h.entity_id == note_id).collect();
    assert_eq!(matching.len(), 1);
    assert!(matching[0].score > 0.99);

    db.delete_note(note_id, owner).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn set_embedding_for_deleted_note_is_silent_noop() {
    let db = connect().await;
    let owner = Uuid::new_v4();

    let note_id = db
        .notes
        .insert(CreateNoteRequest::new(owner, "short lived"))
        .await
        .unwrap();
    db.delete_note(note_id, owner).await.unwrap();

    // The entity is gone; the write must not error and must not land.
    db.embeddings
        .set_embedding(EmbeddingCollection::Notes, note_id, &unit_vector(0), "test-model")
        .await
        .unwrap();

    let current = db
        .embeddings
        .get_embedding(EmbeddingCollection::Notes, note_id)
        .await
        .unwrap();
    assert!(current.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn delete_note_cascades_edges() {
    let db = connect().await;
    let owner = Uuid::new_v4();

    let a = db
        .notes
        .insert(CreateNoteRequest::new(owner, "note a"))
        .await
        .unwrap();
    let b = db
        .notes
        .insert(CreateNoteRequest::new(owner, "note b"))
        .await
        .unwrap();

    db.edges.create(a, b, Some("92%")).await.unwrap();
    assert_eq!(db.edges.get_incoming(b, owner).await.unwrap().len(), 1);

    db.delete_note(a, owner).await.unwrap();

    assert!(db.edges.get_incoming(b, owner).await.unwrap().is_empty());
    assert!(db.edges.get_outgoing(a, owner).await.unwrap().is_empty());

    db.delete_note(b, owner).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn duplicate_edge_pairs_are_skipped() {
    let db = connect().await;
    let owner = Uuid::new_v4();

    let a = db
        .notes
        .insert(CreateNoteRequest::new(owner, "a"))
        .await
        .unwrap();
    let b = db
        .notes
        .insert(CreateNoteRequest::new(owner, "b"))
        .await
        .unwrap();

    let first = db.edges.create(a, b, Some("90%")).await.unwrap();
    let second = db.edges.create(a, b, Some("91%")).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(db.edges.get_incoming(b, owner).await.unwrap().len(), 1);

    // The reverse direction is a distinct pair.
    assert!(db.edges.create(b, a, None).await.unwrap().is_some());

    db.delete_note(a, owner).await.unwrap();
    db.delete_note(b, owner).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn queue_deduplicates_pending_jobs_per_entity() {
    let db = connect().await;
    let entity = Uuid::new_v4();

    let first = db
        .jobs
        .queue_deduplicated(Some(entity), JobType::EmbedNote, 5, None)
        .await
        .unwrap();
    let second = db
        .jobs
        .queue_deduplicated(Some(entity), JobType::EmbedNote, 5, None)
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_none(), "second enqueue should deduplicate");

    // A different job type for the same entity is not deduplicated.
    let link = db
        .jobs
        .queue_deduplicated(Some(entity), JobType::LinkNote, 3, None)
        .await
        .unwrap();
    assert!(link.is_some());

    // Drain what we queued so reruns stay clean.
    db.jobs.complete(first.unwrap(), None).await.unwrap();
    db.jobs.complete(link.unwrap(), None).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn failed_job_repends_until_max_retries() {
    let db = connect().await;
    let entity = Uuid::new_v4();

    let job_id = db
        .jobs
        .queue(Some(entity), JobType::EmbedNote, 5, None)
        .await
        .unwrap();

    let max_retries = memex_core::defaults::JOB_MAX_RETRIES;
    for _ in 0..max_retries {
        db.jobs.fail(job_id, "transient").await.unwrap();
        let job = db.jobs.get(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, memex_core::JobStatus::Pending);
    }

    db.jobs.fail(job_id, "gave up").await.unwrap();
    let job = db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, memex_core::JobStatus::Failed);
    assert_eq!(job.retry_count, max_retries);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with pgvector"]
async fn owner_scoping_collapses_not_found_and_not_yours() {
    let db = connect().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let note_id = db
        .notes
        .insert(CreateNoteRequest::new(owner, "private"))
        .await
        .unwrap();

    // Someone else's note and a nonexistent note look identical.
    assert!(db.notes.fetch(note_id, stranger).await.unwrap().is_none());
    assert!(db
        .notes
        .fetch(Uuid::new_v4(), stranger)
        .await
        .unwrap()
        .is_none());

    assert!(db.notes.fetch(note_id, owner).await.unwrap().is_some());

    db.delete_note(note_id, owner).await.unwrap();
}
