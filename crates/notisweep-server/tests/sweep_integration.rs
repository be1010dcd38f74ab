//! End-to-end sweeps: the real GitHub client against an in-process fake API.

#[allow(dead_code)]
mod common;

use notisweep_core::{SweepAction, SweepError, SweepOutcome};
use notisweep_server::sweeper::{FailurePolicy, SweepOptions};

use common::{Call, FakeGitHub, fast_options, matching, notification, sweeper_for};

#[tokio::test]
async fn marks_only_matching_security_alerts() {
    let fake = FakeGitHub::start(vec![
        matching("1"),
        notification(
            "2",
            "subscribed",
            "https://api.github.com/repos/acme-corp/app/issues/2",
            "acme-corp",
            "app",
        ),
        notification(
            "3",
            "security_alert",
            "https://api.github.com/repos/other-org/lib/dependabot/alerts/3",
            "other-org",
            "lib",
        ),
        matching("4"),
    ])
    .await;
    let sweeper = sweeper_for(&fake, fast_options());

    let outcome = sweeper.sweep().await.unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.matched, 2);
    assert_eq!(report.marked_read, 2);
    assert_eq!(report.muted, 0);
    assert_eq!(
        fake.writes(),
        vec![Call::MarkRead("1".into()), Call::MarkRead("4".into())]
    );
    assert_eq!(fake.unread_ids(), vec!["2".to_string(), "3".to_string()]);
}

#[tokio::test]
async fn walks_every_page_at_full_page_size() {
    let feed = (1..=250).map(|i| matching(&i.to_string())).collect();
    let fake = FakeGitHub::start(feed).await;
    let sweeper = sweeper_for(&fake, fast_options());

    let report = match sweeper.sweep().await.unwrap() {
        SweepOutcome::Completed(report) => report,
        SweepOutcome::Skipped => panic!("sweep should not be skipped"),
    };

    let listings: Vec<Call> = fake
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::List { .. }))
        .collect();
    assert_eq!(
        listings,
        vec![
            Call::List {
                page: 1,
                per_page: 100
            },
            Call::List {
                page: 2,
                per_page: 100
            },
            Call::List {
                page: 3,
                per_page: 100
            },
        ]
    );
    assert_eq!(report.total, 250);
    assert_eq!(report.marked_read, 250);
    assert!(fake.unread_ids().is_empty());
}

#[tokio::test]
async fn mutes_repository_before_marking_read() {
    let fake = FakeGitHub::start(vec![matching("7")]).await;
    let sweeper = sweeper_for(
        &fake,
        SweepOptions {
            mute_repositories: true,
            ..fast_options()
        },
    );

    let outcome = sweeper.sweep().await.unwrap();

    assert_eq!(
        fake.writes(),
        vec![
            Call::Mute {
                owner: "acme-corp".into(),
                repo: "app".into(),
                ignored: true,
            },
            Call::MarkRead("7".into()),
        ]
    );
    let report = outcome.report().unwrap();
    assert_eq!(report.muted, 1);
    assert_eq!(report.marked_read, 1);
}

#[tokio::test]
async fn second_sweep_finds_nothing_left() {
    let fake = FakeGitHub::start(vec![matching("1"), matching("2")]).await;
    let sweeper = sweeper_for(&fake, fast_options());

    let first = sweeper.sweep().await.unwrap();
    assert_eq!(first.report().unwrap().marked_read, 2);

    let second = sweeper.sweep().await.unwrap();
    let report = second.report().unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(report.marked_read, 0);
    assert_eq!(fake.writes().len(), 2);
}

#[tokio::test]
async fn server_error_aborts_by_default() {
    let fake =
        FakeGitHub::start_with_failures(vec![matching("1"), matching("2"), matching("3")], &["2"])
            .await;
    let sweeper = sweeper_for(&fake, fast_options());

    let err = sweeper.sweep().await.unwrap_err();
    match err {
        SweepError::Action {
            notification_id,
            action,
            source,
        } => {
            assert_eq!(notification_id, "2");
            assert_eq!(action, SweepAction::MarkRead);
            assert_eq!(source.status().map(|s| s.as_u16()), Some(500));
        },
        other => panic!("unexpected error: {other}"),
    }

    // "3" is never attempted
    assert_eq!(
        fake.writes(),
        vec![Call::MarkRead("1".into()), Call::MarkRead("2".into())]
    );

    let last = sweeper.status().last().await.unwrap();
    assert!(!last.succeeded);
    assert!(last.error.is_some());
}

#[tokio::test]
async fn server_error_is_recorded_when_continuing() {
    let fake =
        FakeGitHub::start_with_failures(vec![matching("1"), matching("2"), matching("3")], &["2"])
            .await;
    let sweeper = sweeper_for(
        &fake,
        SweepOptions {
            on_item_error: FailurePolicy::Continue,
            ..fast_options()
        },
    );

    let outcome = sweeper.sweep().await.unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.marked_read, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].notification_id, "2");
    assert_eq!(report.failures[0].action, SweepAction::MarkRead);
    assert_eq!(fake.unread_ids(), vec!["2".to_string()]);

    let last = sweeper.status().last().await.unwrap();
    assert!(!last.succeeded);
    assert_eq!(last.failures, 1);
}

#[tokio::test]
async fn concurrent_triggers_run_one_sweep() {
    let feed = (1..=20).map(|i| matching(&i.to_string())).collect();
    let fake = FakeGitHub::start(feed).await;
    let sweeper = sweeper_for(
        &fake,
        SweepOptions {
            item_delay: std::time::Duration::from_millis(5),
            ..fast_options()
        },
    );

    let outcomes = futures::future::join_all((0..3).map(|_| sweeper.sweep())).await;

    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(SweepOutcome::Completed(_))))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(SweepOutcome::Skipped)))
        .count();
    assert_eq!(completed, 1);
    assert_eq!(skipped, 2);
    assert_eq!(fake.writes().len(), 20);
}
