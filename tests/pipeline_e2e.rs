// End-to-end pipeline tests: SubmissionService and FeedService over an
// in-memory SQLite store and an in-process cache.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use rarely::cache::Cache;
use rarely::db::models::{FeedFilter, InputType, Location, Reaction, Scope};
use rarely::db::sqlite::SqliteStore;
use rarely::db::PostStore;
use rarely::error::AppError;
use rarely::input::ValidatedSubmission;
use rarely::moderation::ModerationOrchestrator;
use rarely::pipeline::{FeedEntry, FeedRequest, FeedService, SubmissionService};
use rarely::scoring::PercentileTier;

struct Harness {
    submissions: SubmissionService,
    feed: FeedService,
}

fn harness() -> Harness {
    let store: Arc<dyn PostStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let cache = Cache::memory();
    let moderation = ModerationOrchestrator::static_only(cache.clone());
    Harness {
        submissions: SubmissionService::new(store.clone(), moderation, cache.clone()),
        feed: FeedService::new(store, None, cache),
    }
}

fn action(content: &str) -> ValidatedSubmission {
    ValidatedSubmission {
        content: content.to_string(),
        input_type: InputType::Action,
        scope: Scope::World,
        location: Location::default(),
    }
}

// ============================================================
// Write path
// ============================================================

#[tokio::test]
async fn first_post_is_maximally_rare() {
    let h = harness();
    let result = h.submissions.submit(action("played cricket today")).await.unwrap();

    assert_eq!(result.match_count, 0);
    assert_eq!(result.uniqueness_score, 100.0);
    assert_eq!(result.percentile.tier, PercentileTier::Elite);
    assert!(result.similar_posts.is_empty());
    assert_eq!(result.post.scope, Scope::World);
}

#[tokio::test]
async fn eleventh_identical_post_sees_ten_matches() {
    let h = harness();
    let first = h.submissions.submit(action("played cricket today")).await.unwrap();

    let mut last = None;
    for i in 0..10 {
        // Surface differences normalize to the same fingerprint.
        let text = if i % 2 == 0 {
            "Played cricket today!"
        } else {
            "played   cricket today"
        };
        last = Some(h.submissions.submit(action(text)).await.unwrap());
    }
    let eleventh = last.unwrap();

    assert_eq!(eleventh.match_count, 10);
    assert_eq!(eleventh.percentile.tier, PercentileTier::Popular);
    assert!(eleventh.percentile.percentile > first.percentile.percentile);
    assert!(
        eleventh.uniqueness_score < first.uniqueness_score - 50.0,
        "first={} eleventh={}",
        first.uniqueness_score,
        eleventh.uniqueness_score
    );
    assert_eq!(eleventh.similar_posts.len(), 5);
}

#[tokio::test]
async fn different_actions_do_not_match() {
    let h = harness();
    h.submissions.submit(action("played cricket today")).await.unwrap();
    let other = h.submissions.submit(action("went to the gym")).await.unwrap();
    assert_eq!(other.match_count, 0);
    assert_eq!(other.uniqueness_score, 100.0);
}

#[tokio::test]
async fn scope_narrows_to_what_the_location_supports() {
    let h = harness();
    let submission = ValidatedSubmission {
        scope: Scope::City,
        location: Location {
            city: None,
            state: None,
            country: Some("India".into()),
        },
        ..action("played cricket today")
    };
    let result = h.submissions.submit(submission).await.unwrap();
    assert_eq!(result.post.scope, Scope::Country);
}

#[tokio::test]
async fn quality_rejection_stops_the_pipeline() {
    let h = harness();
    let err = h.submissions.submit(action("asdf asdf asdf")).await.unwrap_err();
    assert!(matches!(err, AppError::QualityRejected { .. }));

    let page = h.feed.list(FeedRequest::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn moderation_rejection_stops_the_pipeline() {
    let h = harness();
    let err = h
        .submissions
        .submit(ValidatedSubmission {
            input_type: InputType::DaySummary,
            ..action("met an old friend, her number is 555-123-4567")
        })
        .await
        .unwrap_err();
    match err {
        AppError::ModerationBlocked { reason, .. } => assert_eq!(reason, "contact_info"),
        other => panic!("expected ModerationBlocked, got {other:?}"),
    }
}

// ============================================================
// Read path
// ============================================================

#[tokio::test]
async fn detail_recomputes_against_later_posts() {
    let h = harness();
    let first = h.submissions.submit(action("played cricket today")).await.unwrap();
    for _ in 0..3 {
        h.submissions.submit(action("played cricket today")).await.unwrap();
    }

    let detail = h.feed.detail(&first.post.id).await.unwrap();
    // Snapshot said 0 matches; three more arrived since.
    assert_eq!(first.post.match_count, 0);
    assert_eq!(detail.uniqueness.match_count, 3);
    assert!(detail.uniqueness.live);
    assert!(detail.uniqueness.uniqueness_score < 100.0);
    assert_eq!(detail.similar_posts.len(), 3);
    assert!(detail.temporal.is_some());
    assert_eq!(detail.rank, Some(1));
}

#[tokio::test]
async fn detail_of_missing_post_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.feed.detail("nope").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn feed_pages_and_filters() {
    let h = harness();
    for text in ["played cricket today", "went to the gym", "played cricket today"] {
        h.submissions.submit(action(text)).await.unwrap();
    }

    let page = h
        .feed
        .list(FeedRequest {
            limit: 2,
            ..FeedRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.posts.len(), 2);
    assert!(page.posts.iter().all(|e| !e.is_ghost()));

    let unique = h
        .feed
        .list(FeedRequest {
            filter: FeedFilter::Unique,
            ..FeedRequest::default()
        })
        .await
        .unwrap();
    match &unique.posts[0] {
        FeedEntry::Post(view) => assert_eq!(view.post.uniqueness_score, 100.0),
        FeedEntry::Ghost(_) => panic!("no trends configured, expected a real post"),
    }
}

#[tokio::test]
async fn reactions_increment_and_missing_posts_404() {
    let h = harness();
    let post = h
        .submissions
        .submit(action("went to the gym"))
        .await
        .unwrap()
        .post;

    h.feed.react(&post.id, Reaction::Funny).await.unwrap();
    let updated = h.feed.react(&post.id, Reaction::MustTry).await.unwrap();
    assert_eq!(updated.funny_count, 1);
    assert_eq!(updated.must_try_count, 1);
    assert_eq!(updated.total_reactions, 2);

    assert!(matches!(
        h.feed.react("missing", Reaction::Creative).await,
        Err(AppError::NotFound(_))
    ));
}
