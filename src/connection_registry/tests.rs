use super::*;

async fn register_one(registry: &ConnectionRegistry) -> ConnectionId {
    let (tx, _rx) = mpsc::unbounded_channel();
    registry.register(tx).await
}

#[tokio::test]
async fn test_register_and_unregister() {
    let registry = ConnectionRegistry::new();
    assert_eq!(registry.count().await, 0);

    let id = register_one(&registry).await;
    assert_eq!(registry.count().await, 1);
    assert!(registry.get(&id).await.is_some());

    assert!(registry.unregister(&id).await);
    assert_eq!(registry.count().await, 0);
    // Second removal reports the entry as already gone.
    assert!(!registry.unregister(&id).await);
}

#[tokio::test]
async fn test_new_connection_is_anonymous_with_empty_interests() {
    let registry = ConnectionRegistry::new();
    let id = register_one(&registry).await;

    let conn = registry.get(&id).await.unwrap();
    assert_eq!(conn.user_id, None);
    assert!(conn.circle_interests.is_empty());
    assert!(conn.commodity_interests.is_empty());
}

#[tokio::test]
async fn test_touch_advances_activity_clock() {
    let registry = ConnectionRegistry::new();
    let id = register_one(&registry).await;

    registry.backdate(&id, 120).await;
    let before = registry.get(&id).await.unwrap().last_activity;

    registry.touch(&id).await;
    let after = registry.get(&id).await.unwrap().last_activity;
    assert!(after > before);
}

#[tokio::test]
async fn test_by_user_filters_on_identity() {
    let registry = ConnectionRegistry::new();
    let a = register_one(&registry).await;
    let b = register_one(&registry).await;
    let c = register_one(&registry).await;

    registry.set_user(&a, 7).await;
    registry.set_user(&b, 7).await;
    registry.set_user(&c, 9).await;

    let sevens = registry.by_user(7).await;
    assert_eq!(sevens.len(), 2);
    assert!(sevens.iter().all(|conn| conn.user_id == Some(7)));
    assert!(registry.by_user(1).await.is_empty());
}

#[tokio::test]
async fn test_interest_replacement_is_not_a_merge() {
    let registry = ConnectionRegistry::new();
    let id = register_one(&registry).await;

    registry
        .replace_circle_interests(&id, HashSet::from([1, 2]))
        .await;
    registry
        .replace_circle_interests(&id, HashSet::from([3]))
        .await;

    let conn = registry.get(&id).await.unwrap();
    assert_eq!(conn.circle_interests, HashSet::from([3]));
}

#[tokio::test]
async fn test_has_audience_matches_either_topic() {
    let registry = ConnectionRegistry::new();
    let id = register_one(&registry).await;
    registry
        .replace_circle_interests(&id, HashSet::from([5]))
        .await;
    registry
        .replace_commodity_interests(&id, HashSet::from([8]))
        .await;

    assert!(registry.has_audience(5, 999).await);
    assert!(registry.has_audience(999, 8).await);
    assert!(!registry.has_audience(999, 999).await);
}

#[tokio::test]
async fn test_mutation_of_missing_connection_is_a_noop() {
    let registry = ConnectionRegistry::new();
    let ghost = ConnectionId::new_v4();

    registry.touch(&ghost).await;
    registry.set_user(&ghost, 1).await;
    registry
        .replace_circle_interests(&ghost, HashSet::from([1]))
        .await;

    assert_eq!(registry.count().await, 0);
}

#[tokio::test]
async fn test_reap_stale_uses_strict_cutoff() {
    let registry = ConnectionRegistry::new();
    let id = register_one(&registry).await;
    let last_activity = registry.get(&id).await.unwrap().last_activity;

    // Cutoff equal to the activity time must not evict.
    assert!(registry.reap_stale(last_activity).await.is_empty());

    // A cutoff just past it must.
    let reaped = registry
        .reap_stale(last_activity + chrono::Duration::milliseconds(1))
        .await;
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].id, id);
    assert_eq!(registry.count().await, 0);
}
