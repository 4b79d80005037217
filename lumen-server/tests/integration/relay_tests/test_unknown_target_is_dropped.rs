use lumen_core::{ClientSignal, ParticipantId, Role};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::TestParticipant;

#[tokio::test]
async fn test_unknown_target_is_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut sender = TestParticipant::connect(&relay).await;
    let mut bystander = TestParticipant::connect(&relay).await;
    sender.join("r1", Role::Broadcaster).await;
    bystander.join("r1", Role::Viewer).await;
    sender.drain().await;

    sender.send(ClientSignal::Offer {
        target: ParticipantId::new(),
        sdp: "lost".into(),
    });
    sender.send(ClientSignal::RequestOffer {
        target: Some(ParticipantId::new()),
    });

    sender.expect_silence().await;
    bystander.expect_silence().await;
    assert_eq!(relay.registry().members_of(&"r1".into()).len(), 2);
}

#[tokio::test]
async fn test_signal_to_departed_participant_is_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut sender = TestParticipant::connect(&relay).await;
    let gone = TestParticipant::connect(&relay).await;
    let gone_id = gone.id.clone();
    gone.disconnect();
    drop(gone);

    sender.send(ClientSignal::Answer {
        target: gone_id,
        sdp: "late".into(),
    });

    sender.expect_silence().await;
    assert_eq!(relay.connection_count(), 1);
}
