//! Concurrent request load against the in-memory store

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use kvgate::frontend::{create_router, AppState, Views};
use kvgate::store::{MemoryConnector, PoolConfig};
use kvgate::KvClient;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    let connector = MemoryConnector::new();
    let client = KvClient::with_connector(Arc::new(connector.clone()), PoolConfig::default());
    let app = create_router(AppState::new(client.clone(), Views::default()));

    let mut handles = Vec::new();
    for _ in 0..200 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/increment")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("key=hits"))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(client.get_integer("hits").await, 200);

    let stats = client.pool_stats();
    assert!(stats.idle <= 3);
    assert_eq!(stats.dialed as usize, connector.dials());
}
