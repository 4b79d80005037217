use lumen_client::NegotiationState;
use lumen_core::{ParticipantId, Role, ServerSignal};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{
    INVALID_SDP_PREFIX, SessionEvent, TransportCall, test_candidate, wait_for_removal, wait_for_state,
};

#[tokio::test]
async fn test_unexpected_answer_closes_only_that_link() {
    init_tracing();

    let session = create_test_session(Role::Viewer);
    let a = ParticipantId::new();
    let c = ParticipantId::new();

    for remote in [&a, &c] {
        session
            .manager
            .on_message(ServerSignal::Offer {
                from: remote.clone(),
                sdp: "remote-offer".into(),
            })
            .await;
        assert!(wait_for_state(&session.manager, remote, NegotiationState::AnswerSent).await);
    }

    // An answerer never expects an answer.
    session
        .manager
        .on_message(ServerSignal::Answer {
            from: a.clone(),
            sdp: "stray-answer".into(),
        })
        .await;

    assert!(wait_for_removal(&session.manager, &a).await);
    let closed = SessionEvent::Closed { remote: a.clone() };
    assert!(session.observer.wait_for(1, |e| e == &closed).await);

    let aborts = session.observer.aborts_for(&a).await;
    assert_eq!(aborts.len(), 1);
    assert!(aborts[0].contains("answer-sent"), "got: {}", aborts[0]);

    assert_eq!(
        session.manager.link_state(&c),
        Some(NegotiationState::AnswerSent)
    );
    assert!(
        !session
            .transports
            .calls_for(&c)
            .await
            .contains(&TransportCall::Close)
    );
}

#[tokio::test]
async fn test_rejected_answer_closes_link() {
    init_tracing();

    let session = create_test_session(Role::Broadcaster);
    let viewer = ParticipantId::new();

    session
        .manager
        .on_peer_announced(viewer.clone(), Role::Viewer)
        .await;
    assert!(wait_for_state(&session.manager, &viewer, NegotiationState::OfferSent).await);

    session
        .manager
        .on_message(ServerSignal::Answer {
            from: viewer.clone(),
            sdp: format!("{}-answer", INVALID_SDP_PREFIX),
        })
        .await;

    assert!(wait_for_removal(&session.manager, &viewer).await);
    assert!(
        session
            .transports
            .wait_for_call(&viewer, TransportCall::Close)
            .await
    );

    // Eligible for a fresh attempt on its next announcement.
    session
        .manager
        .on_peer_announced(viewer.clone(), Role::Viewer)
        .await;
    assert!(wait_for_state(&session.manager, &viewer, NegotiationState::OfferSent).await);
    assert_eq!(session.transports.created_for(&viewer).await, 2);
}

#[tokio::test]
async fn test_rejected_candidate_closes_link() {
    init_tracing();

    let session = create_test_session(Role::Viewer);
    session.transports.reject_candidates().await;
    let broadcaster = ParticipantId::new();

    session
        .manager
        .on_message(ServerSignal::Offer {
            from: broadcaster.clone(),
            sdp: "remote-offer".into(),
        })
        .await;
    assert!(wait_for_state(&session.manager, &broadcaster, NegotiationState::AnswerSent).await);

    session
        .manager
        .on_message(ServerSignal::IceCandidate {
            from: broadcaster.clone(),
            candidate: test_candidate("bad"),
        })
        .await;

    assert!(wait_for_removal(&session.manager, &broadcaster).await);
    assert_eq!(session.observer.aborts_for(&broadcaster).await.len(), 1);
}

#[tokio::test]
async fn test_failed_transport_creation_aborts() {
    init_tracing();

    let session = create_test_session(Role::Broadcaster);
    session.transports.fail_create().await;
    let viewer = ParticipantId::new();

    session
        .manager
        .on_peer_announced(viewer.clone(), Role::Viewer)
        .await;

    assert!(wait_for_removal(&session.manager, &viewer).await);
    assert!(
        session
            .observer
            .wait_for(1, |e| matches!(e, SessionEvent::Closed { .. }))
            .await
    );
    assert_eq!(session.observer.aborts_for(&viewer).await.len(), 1);
    assert_eq!(session.signals.offers_to(&viewer), 0);
}
