//! Whole-engine runs against a temporary installation.

use std::{fs, path::Path, sync::Arc};

use herald::{Engine, EngineConfig};
use herald_delivery::FileOutboxTransport;
use tokio::sync::broadcast;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn config_for(root: &Path) -> EngineConfig {
    let toml = format!(
        r#"
[paths]
campaigns_dir = "{root}/campaigns"
contacts_dir = "{root}/contacts"
tracking_dir = "{root}/tracking"
outbox_dir = "{root}/outbox"

[policy]
daily_limit = 50
per_domain_limit = 5
min_delay_secs = 0

[sender]
from_name = "Test Outreach"
opt_out_base_url = "https://outreach.example.org/opt-out"
"#,
        root = root.display()
    );
    toml::from_str(&toml).unwrap()
}

fn engine_for(root: &Path) -> Engine {
    Engine::new(
        config_for(root),
        Arc::new(FileOutboxTransport::new(root.join("outbox"))),
    )
}

#[tokio::test]
async fn test_full_run_sends_and_archives() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/spring.txt", "Dear {{name}},\nSpring is here.");
    write(
        root,
        "contacts/retail/contacts.csv",
        "email,name\na@one.org,Ana\nb@two.org,Ben\n",
    );

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine_for(root).run(&shutdown).await.unwrap();

    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.campaigns.len(), 1);

    // Messages landed in the outbox with the rendered body and footer.
    let outbox: Vec<_> = fs::read_dir(root.join("outbox")).unwrap().collect();
    assert_eq!(outbox.len(), 2);
    let first = fs::read_to_string(outbox[0].as_ref().unwrap().path()).unwrap();
    assert!(first.contains("Dear Ana,") || first.contains("Dear Ben,"));
    assert!(first.contains("https://outreach.example.org/opt-out?email="));

    // The consumed source was archived and replaced with a placeholder.
    assert_eq!(
        fs::read_to_string(root.join("contacts/retail/contacts.csv")).unwrap(),
        ""
    );

    // A per-campaign record exists under the tracking root.
    let record_dir = root.join("tracking/retail/campaigns");
    assert_eq!(fs::read_dir(&record_dir).unwrap().count(), 1);

    // Rate state reflects both sends.
    assert_eq!(summary.stats.sent_today, 2);
    assert_eq!(summary.stats.remaining_today, 48);
}

#[tokio::test]
async fn test_second_run_has_nothing_to_send() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/spring.txt", "Hello {{name}}");
    write(root, "contacts/retail/contacts.csv", "email\na@one.org\n");

    let (shutdown, _) = broadcast::channel(1);
    let first = engine_for(root).run(&shutdown).await.unwrap();
    assert_eq!(first.sent, 1);

    // The archival left an empty placeholder, so a restarted run resolves
    // zero recipients and skips rather than re-sending.
    let second = engine_for(root).run(&shutdown).await.unwrap();
    assert_eq!(second.sent, 0);
    assert_eq!(second.campaigns.len(), 1);
    assert_eq!(second.campaigns[0].sent, 0);
}

#[tokio::test]
async fn test_future_campaign_deferred() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/later.txt", "Later");
    write(
        root,
        "campaigns/retail/later.toml",
        "mode = \"scheduled\"\ndate = \"2199-01-01\"\n",
    );
    write(root, "contacts/retail/contacts.csv", "email\na@one.org\n");

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine_for(root).run(&shutdown).await.unwrap();

    assert_eq!(summary.deferred, 1);
    assert_eq!(summary.sent, 0);
    assert!(summary.campaigns.is_empty());

    // Nothing consumed: the contacts file is untouched.
    assert_eq!(
        fs::read_to_string(root.join("contacts/retail/contacts.csv")).unwrap(),
        "email\na@one.org\n"
    );
}

#[tokio::test]
async fn test_overdue_campaign_skipped_under_skip_policy() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/old.txt", "Old news");
    write(
        root,
        "campaigns/retail/old.toml",
        "mode = \"scheduled\"\ndate = \"2020-01-01\"\n",
    );
    write(root, "contacts/retail/contacts.csv", "email\na@one.org\n");

    let mut config = config_for(root);
    config.catalog.overdue = herald_catalog::OverduePolicy::Skip;
    let engine = Engine::new(
        config,
        Arc::new(FileOutboxTransport::new(root.join("outbox"))),
    );

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine.run(&shutdown).await.unwrap();

    assert_eq!(summary.stale, 1);
    assert_eq!(summary.sent, 0);
}

#[tokio::test]
async fn test_overdue_campaign_caught_up_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/old.txt", "Old news {{name}}");
    write(
        root,
        "campaigns/retail/old.toml",
        "mode = \"scheduled\"\ndate = \"2020-01-01\"\n",
    );
    write(root, "contacts/retail/contacts.csv", "email,name\na@one.org,Ana\n");

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine_for(root).run(&shutdown).await.unwrap();

    assert_eq!(summary.stale, 0);
    assert_eq!(summary.sent, 1);
}

#[tokio::test]
async fn test_missing_campaign_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (shutdown, _) = broadcast::channel(1);

    let result = engine_for(&dir.path().join("nowhere")).run(&shutdown).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_contacts_dir_skips_campaign() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/retail/spring.txt", "Hello");
    // No contacts/retail at all.

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine_for(root).run(&shutdown).await.unwrap();

    assert_eq!(summary.campaigns.len(), 1);
    assert_eq!(summary.campaigns[0].sent, 0);
    assert_eq!(
        summary.campaigns[0].status,
        herald_catalog::CampaignStatus::Skipped
    );
}

#[tokio::test]
async fn test_daily_cap_enforced_across_campaigns() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "campaigns/a/first.txt", "First");
    write(root, "campaigns/b/second.txt", "Second");
    write(root, "contacts/a/contacts.csv", "email\na1@one.org\na2@two.org\n");
    write(root, "contacts/b/contacts.csv", "email\nb1@three.org\nb2@four.org\n");

    let mut config = config_for(root);
    config.policy.daily_limit = 3;
    let engine = Engine::new(
        config,
        Arc::new(FileOutboxTransport::new(root.join("outbox"))),
    );

    let (shutdown, _) = broadcast::channel(1);
    let summary = engine.run(&shutdown).await.unwrap();

    // The cap spans the whole day, not one campaign.
    assert_eq!(summary.sent, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.stats.remaining_today, 0);
}
