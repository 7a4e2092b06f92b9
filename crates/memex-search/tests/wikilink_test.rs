//! Tests for wiki-link suggestion, resolution, and text-scan backlinks.

mod fakes;

use std::sync::Arc;

use uuid::Uuid;

use fakes::{FakeEdges, FakeNotes, FakeStore};
use memex_core::{Error, NoteRepository, WikiLinkResolution};
use memex_search::{BacklinkResolver, WikiLinkResolver};

fn notes(store: &Arc<FakeStore>) -> Arc<FakeNotes> {
    Arc::new(FakeNotes::new(store.clone()))
}

#[tokio::test]
async fn wiki_backlinks_returns_referencing_notes() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    store.add_note(owner, Some("Project Alpha"), "# Project Alpha\n", Vec::new());
    store.add_note(
        owner,
        Some("Notes"),
        "Progress on [[Project Alpha]] this week",
        Vec::new(),
    );
    store.add_note(owner, Some("Unrelated"), "nothing here", Vec::new());

    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );

    let backlinks = resolver.wiki_backlinks(owner, "Project Alpha").await.unwrap();
    assert_eq!(backlinks.len(), 1);
    assert_eq!(backlinks[0].title.as_deref(), Some("Notes"));
}

#[tokio::test]
async fn wiki_backlinks_excludes_self_reference() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    // The note references its own title; it must not backlink itself.
    store.add_note(
        owner,
        Some("Project Alpha"),
        "See [[Project Alpha]] history below",
        Vec::new(),
    );

    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );

    let backlinks = resolver.wiki_backlinks(owner, "Project Alpha").await.unwrap();
    assert!(backlinks.is_empty());
}

#[tokio::test]
async fn wiki_backlinks_match_case_insensitively() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    store.add_note(
        owner,
        Some("Journal"),
        "mentioned [[project alpha]] casually",
        Vec::new(),
    );

    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );

    let backlinks = resolver.wiki_backlinks(owner, "Project Alpha").await.unwrap();
    assert_eq!(backlinks.len(), 1);
    assert_eq!(backlinks[0].title.as_deref(), Some("Journal"));
}

#[tokio::test]
async fn wiki_backlinks_ignore_plain_text_mentions() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    // Mentions the title without delimiter syntax; the ILIKE prefilter
    // may surface it, the extraction pass must reject it.
    store.add_note(
        owner,
        Some("Journal"),
        "Project Alpha came up today. Also [[Something Else]].",
        Vec::new(),
    );

    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );

    let backlinks = resolver.wiki_backlinks(owner, "Project Alpha").await.unwrap();
    assert!(backlinks.is_empty());
}

#[tokio::test]
async fn wiki_backlinks_are_owner_scoped() {
    let store = FakeStore::new();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();

    store.add_note(
        owner_b,
        Some("B Journal"),
        "B wrote about [[Project Alpha]]",
        Vec::new(),
    );

    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );

    let backlinks = resolver.wiki_backlinks(owner_a, "Project Alpha").await.unwrap();
    assert!(backlinks.is_empty());
}

#[tokio::test]
async fn wiki_backlinks_empty_title_returns_empty() {
    let store = FakeStore::new();
    let resolver = BacklinkResolver::new(
        Arc::new(FakeEdges::new(store.clone())),
        notes(&store),
    );
    let backlinks = resolver.wiki_backlinks(Uuid::new_v4(), "  ").await.unwrap();
    assert!(backlinks.is_empty());
}

#[tokio::test]
async fn suggest_matches_substring_case_insensitively() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    store.add_note(owner, Some("Project Alpha"), "", Vec::new());
    store.add_note(owner, Some("Beta project notes"), "", Vec::new());
    store.add_note(owner, Some("Groceries"), "", Vec::new());

    let resolver = WikiLinkResolver::new(notes(&store));
    let suggestions = resolver.suggest(owner, "project").await.unwrap();

    assert_eq!(suggestions.len(), 2);
    // Insertion order, not match-quality order
    assert_eq!(suggestions[0].title, "Project Alpha");
    assert_eq!(suggestions[1].title, "Beta project notes");
}

#[tokio::test]
async fn suggest_caps_results() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    for i in 0..15 {
        let title = format!("Note {i}");
        store.add_note(owner, Some(&title), "", Vec::new());
    }

    let resolver = WikiLinkResolver::new(notes(&store));
    let suggestions = resolver.suggest(owner, "note").await.unwrap();
    assert_eq!(suggestions.len(), 10);
}

#[tokio::test]
async fn suggest_empty_fragment_suggests_nothing() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();
    store.add_note(owner, Some("Anything"), "", Vec::new());

    let resolver = WikiLinkResolver::new(notes(&store));
    assert!(resolver.suggest(owner, "   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn resolve_navigates_to_existing_title() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();
    let existing = store.add_note(owner, Some("Project Alpha"), "# Project Alpha\n", Vec::new());

    let resolver = WikiLinkResolver::new(notes(&store));
    let resolution = resolver
        .resolve_or_create(owner, "project ALPHA")
        .await
        .unwrap();

    assert_eq!(resolution, WikiLinkResolution::Existing(existing));
}

#[tokio::test]
async fn resolve_creates_note_when_title_is_new() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    let repo = notes(&store);
    let resolver = WikiLinkResolver::new(repo.clone());
    let resolution = resolver.resolve_or_create(owner, "Fresh Idea").await.unwrap();

    let WikiLinkResolution::Created(id) = resolution else {
        panic!("expected Created, got {:?}", resolution);
    };

    let created = repo.fetch(id, owner).await.unwrap().unwrap();
    assert_eq!(created.title.as_deref(), Some("Fresh Idea"));
    assert_eq!(created.content, "# Fresh Idea\n");
}

#[tokio::test]
async fn resolve_rejects_empty_title() {
    let store = FakeStore::new();
    let resolver = WikiLinkResolver::new(notes(&store));
    assert!(matches!(
        resolver.resolve_or_create(Uuid::new_v4(), "  ").await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn resolve_is_deterministic_for_repeated_titles() {
    let store = FakeStore::new();
    let owner = Uuid::new_v4();

    let repo = notes(&store);
    let resolver = WikiLinkResolver::new(repo);

    let first = resolver.resolve_or_create(owner, "Loop Note").await.unwrap();
    let second = resolver.resolve_or_create(owner, "Loop Note").await.unwrap();

    // First call creates; the second navigates to the same note.
    assert!(matches!(first, WikiLinkResolution::Created(_)));
    assert_eq!(second, WikiLinkResolution::Existing(first.target_id()));
}
