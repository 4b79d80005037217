use lumen_client::{Connectivity, NegotiationState, RemoteTrack, TransportEvent};
use lumen_core::{ClientSignal, ParticipantId, Role, ServerSignal};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{
    MOCK_ANSWER_SDP, SessionEvent, TransportCall, is_answer_to, is_candidate_to, quiet_period,
    test_candidate, wait_for_state,
};

#[tokio::test]
async fn test_answerer_reaches_connected() {
    init_tracing();

    let session = create_test_session(Role::Viewer);
    let broadcaster = ParticipantId::new();

    session
        .manager
        .on_message(ServerSignal::Offer {
            from: broadcaster.clone(),
            sdp: "remote-offer".into(),
        })
        .await;

    assert!(session.signals.wait_for(1, |s| is_answer_to(s, &broadcaster)).await);
    assert!(wait_for_state(&session.manager, &broadcaster, NegotiationState::AnswerSent).await);
    assert!(session.signals.signals().contains(&ClientSignal::Answer {
        target: broadcaster.clone(),
        sdp: MOCK_ANSWER_SDP.into(),
    }));

    // Viewers send nothing, so no tracks are attached.
    assert_eq!(
        session.transports.calls_for(&broadcaster).await,
        vec![
            TransportCall::SetRemoteOffer("remote-offer".into()),
            TransportCall::CreateAnswer,
        ]
    );

    session
        .transports
        .emit(
            &broadcaster,
            TransportEvent::ConnectivityChanged(Connectivity::Connected),
        )
        .await;

    assert!(wait_for_state(&session.manager, &broadcaster, NegotiationState::Connected).await);
    assert_eq!(session.observer.connected_count(&broadcaster).await, 1);
}

#[tokio::test]
async fn test_late_candidate_is_applied_immediately() {
    init_tracing();

    let session = create_test_session(Role::Viewer);
    let broadcaster = ParticipantId::new();

    session
        .manager
        .on_message(ServerSignal::Offer {
            from: broadcaster.clone(),
            sdp: "remote-offer".into(),
        })
        .await;
    assert!(wait_for_state(&session.manager, &broadcaster, NegotiationState::AnswerSent).await);

    let candidate = test_candidate("late");
    session
        .manager
        .on_message(ServerSignal::IceCandidate {
            from: broadcaster.clone(),
            candidate: candidate.clone(),
        })
        .await;

    assert!(
        session
            .transports
            .wait_for_call(&broadcaster, TransportCall::AddIceCandidate(candidate.candidate))
            .await
    );
}

#[tokio::test]
async fn test_transport_events_reach_relay_and_observer() {
    init_tracing();

    let session = create_test_session(Role::Viewer);
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
        .transports
        .emit(
            &broadcaster,
            TransportEvent::CandidateGenerated(test_candidate("local")),
        )
        .await;
    assert!(session.signals.wait_for(1, |s| is_candidate_to(s, &broadcaster)).await);

    let track = RemoteTrack {
        stream_id: "lumen-screen".into(),
        track_id: "video".into(),
        kind: "video".into(),
    };
    session
        .transports
        .emit(&broadcaster, TransportEvent::TrackReceived(track.clone()))
        .await;

    let expected = SessionEvent::StreamAttached {
        remote: broadcaster.clone(),
        track,
    };
    assert!(session.observer.wait_for(1, |e| e == &expected).await);
}

#[tokio::test]
async fn test_early_connectivity_report_is_ignored() {
    init_tracing();

    let session = create_test_session(Role::Broadcaster);
    let viewer = ParticipantId::new();

    session
        .manager
        .on_peer_announced(viewer.clone(), Role::Viewer)
        .await;
    assert!(wait_for_state(&session.manager, &viewer, NegotiationState::OfferSent).await);

    session
        .transports
        .emit(
            &viewer,
            TransportEvent::ConnectivityChanged(Connectivity::Connected),
        )
        .await;
    quiet_period().await;

    session
        .manager
        .on_message(ServerSignal::Answer {
            from: viewer.clone(),
            sdp: "remote-answer".into(),
        })
        .await;

    assert!(wait_for_state(&session.manager, &viewer, NegotiationState::AnswerReceived).await);
    assert_eq!(session.observer.connected_count(&viewer).await, 0);

    session
        .transports
        .emit(
            &viewer,
            TransportEvent::ConnectivityChanged(Connectivity::Connected),
        )
        .await;
    assert!(wait_for_state(&session.manager, &viewer, NegotiationState::Connected).await);
}
