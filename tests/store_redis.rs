//! Redis store behaviour against a live server.
//!
//! Every test returns early unless `REDIS_URL` is set. Keys live under a
//! per-test prefix that is removed afterwards.

mod common;

use common::{clear_prefix, redis_store, unique_prefix};
use image_pipeline::infrastructure::store::StateStore;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

fn job(key: &str) -> String {
    serde_json::json!({ "key": key, "word": key }).to_string()
}

#[tokio::test]
async fn test_push_unique_rejects_duplicate_member() {
    let Some(store) = redis_store().await else {
        return;
    };
    let prefix = unique_prefix("push_unique");
    let members = format!("{}members", prefix);
    let normal = format!("{}normal", prefix);
    let priority = format!("{}priority", prefix);

    assert!(store.push_unique(&members, &normal, "pas", &job("pas")).await.unwrap());
    assert!(!store.push_unique(&members, &normal, "pas", &job("pas")).await.unwrap());
    assert!(!store.push_unique(&members, &priority, "pas", &job("pas")).await.unwrap());

    assert_eq!(store.list_len(&normal).await.unwrap(), 1);
    assert_eq!(store.list_len(&priority).await.unwrap(), 0);
    assert!(store.set_contains(&members, "pas").await.unwrap());

    clear_prefix(&store, &prefix).await;
}

#[tokio::test]
async fn test_pop_unique_drains_first_lane_first_and_releases_member() {
    let Some(store) = redis_store().await else {
        return;
    };
    let prefix = unique_prefix("pop_unique");
    let members = format!("{}members", prefix);
    let lanes = [format!("{}priority", prefix), format!("{}normal", prefix)];

    store.push_unique(&members, &lanes[1], "pas", &job("pas")).await.unwrap();
    store.push_unique(&members, &lanes[1], "mačka", &job("mačka")).await.unwrap();
    store.push_unique(&members, &lanes[0], "hitno", &job("hitno")).await.unwrap();

    let mut popped = Vec::new();
    while let Some(raw) = store.pop_unique(&members, &lanes, "key").await.unwrap() {
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let key = value["key"].as_str().unwrap().to_string();
        assert!(!store.set_contains(&members, &key).await.unwrap());
        popped.push(key);
    }

    assert_eq!(popped, vec!["hitno", "pas", "mačka"]);
    assert!(store.pop_unique(&members, &lanes, "key").await.unwrap().is_none());

    // A released member can be queued again.
    assert!(store.push_unique(&members, &lanes[1], "pas", &job("pas")).await.unwrap());

    clear_prefix(&store, &prefix).await;
}

#[tokio::test]
async fn test_increment_within_limit_does_not_count_rejections() {
    let Some(store) = redis_store().await else {
        return;
    };
    let prefix = unique_prefix("increment");
    let counter = format!("{}rate", prefix);

    assert_eq!(store.increment_within_limit(&counter, 3, TTL).await.unwrap(), Some(1));
    assert_eq!(store.increment_within_limit(&counter, 3, TTL).await.unwrap(), Some(2));
    assert_eq!(store.increment_within_limit(&counter, 3, TTL).await.unwrap(), Some(3));
    assert_eq!(store.increment_within_limit(&counter, 3, TTL).await.unwrap(), None);
    assert_eq!(store.increment_within_limit(&counter, 3, TTL).await.unwrap(), None);

    assert_eq!(store.get(&counter).await.unwrap().as_deref(), Some("3"));

    clear_prefix(&store, &prefix).await;
}

#[tokio::test]
async fn test_increment_sets_expiry_on_first_increment() {
    let Some(store) = redis_store().await else {
        return;
    };
    let prefix = unique_prefix("increment_ttl");
    let counter = format!("{}rate", prefix);

    store.increment_within_limit(&counter, 10, TTL).await.unwrap();
    let url = std::env::var("REDIS_URL").unwrap();
    let client = redis::Client::open(url).unwrap();
    let mut conn = redis::aio::ConnectionManager::new(client).await.unwrap();
    let first: i64 = redis::cmd("PTTL").arg(&counter).query_async(&mut conn).await.unwrap();
    assert!(first > 0 && first <= TTL.as_millis() as i64);

    // Later increments leave the original expiry in place.
    let _: () = redis::cmd("PEXPIRE")
        .arg(&counter)
        .arg(5_000)
        .query_async(&mut conn)
        .await
        .unwrap();
    store.increment_within_limit(&counter, 10, TTL).await.unwrap();
    let later: i64 = redis::cmd("PTTL").arg(&counter).query_async(&mut conn).await.unwrap();
    assert!(later > 0 && later <= 5_000);

    clear_prefix(&store, &prefix).await;
}

#[tokio::test]
async fn test_delete_if_equals_only_removes_own_holder() {
    let Some(store) = redis_store().await else {
        return;
    };
    let prefix = unique_prefix("lock");
    let lock = format!("{}lock", prefix);

    assert!(store.set_if_absent(&lock, "holder-a", TTL).await.unwrap());
    assert!(!store.set_if_absent(&lock, "holder-b", TTL).await.unwrap());

    assert!(!store.delete_if_equals(&lock, "holder-b").await.unwrap());
    assert_eq!(store.get(&lock).await.unwrap().as_deref(), Some("holder-a"));

    assert!(store.delete_if_equals(&lock, "holder-a").await.unwrap());
    assert!(!store.exists(&lock).await.unwrap());

    clear_prefix(&store, &prefix).await;
}
