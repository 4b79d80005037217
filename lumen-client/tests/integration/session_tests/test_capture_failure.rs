use std::sync::Arc;

use lumen_core::{ParticipantId, Role};

use crate::integration::{create_test_session_with, init_tracing};
use crate::utils::{DeniedCapture, wait_for_removal};

#[tokio::test]
async fn test_capture_denied_aborts_without_retry() {
    init_tracing();

    let capture = Arc::new(DeniedCapture::new());
    let session = create_test_session_with(Role::Broadcaster, capture.clone());
    let b = ParticipantId::new();
    let c = ParticipantId::new();

    session.manager.on_peer_announced(b.clone(), Role::Viewer).await;
    assert!(wait_for_removal(&session.manager, &b).await);

    session.manager.on_peer_announced(c.clone(), Role::Viewer).await;
    assert!(wait_for_removal(&session.manager, &c).await);

    let aborts = session.observer.aborts_for(&b).await;
    assert_eq!(aborts.len(), 1);
    assert!(aborts[0].contains("denied"), "got: {}", aborts[0]);
    assert_eq!(session.observer.aborts_for(&c).await.len(), 1);

    // Captured once for the whole session; no offer ever left.
    assert_eq!(capture.calls(), 1);
    assert_eq!(session.signals.offers_to(&b), 0);
    assert_eq!(session.signals.offers_to(&c), 0);

    session.manager.teardown_all().await;

    let d = ParticipantId::new();
    session.manager.on_peer_announced(d.clone(), Role::Viewer).await;
    assert!(wait_for_removal(&session.manager, &d).await);
    assert_eq!(capture.calls(), 2);
}
