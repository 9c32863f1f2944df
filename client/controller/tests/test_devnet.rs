//! End-to-end: controller, JSON-RPC gateway and HTTP transport against the devnet.

use std::sync::Arc;
use std::time::Duration;

use adapters::{ContractGateway, GatewayConfig, NodeAccounts};
use controller::{Rejected, TopicsController};
use harness::{Devnet, DevnetConfig, DevnetServer, DEV_ACCOUNT_1};
use http::HttpTransport;
use transport::DynTransport;
use types::{OperationPhase, Topic};

type Client = TopicsController<ContractGateway, NodeAccounts>;

fn start(topics: &[u64]) -> (DevnetServer, Client) {
    let config = DevnetConfig {
        topics: topics.iter().copied().map(Topic::new).collect(),
        ..Default::default()
    };
    let server = DevnetServer::spawn(Arc::new(Devnet::new(config))).expect("bind devnet");
    let transport: DynTransport = Arc::new(HttpTransport::new(server.url()));
    let gateway = ContractGateway::new(
        transport.clone(),
        GatewayConfig {
            poll_interval: Duration::from_millis(10),
            confirmation_timeout: Duration::from_millis(300),
        },
    );
    let registry = server.devnet().registry();
    let controller =
        TopicsController::with_registry(gateway, NodeAccounts::new(transport), registry);
    (server, controller)
}

fn ids(controller: &Client) -> Vec<u64> {
    controller.view().topics.iter().map(Topic::id).collect()
}

#[tokio::test]
async fn test_owner_round_trip() {
    let (server, controller) = start(&[1, 2, 3]);
    let view = controller.refresh().await.expect("refresh accepted");
    assert!(view.authorized);
    assert_eq!(ids(&controller), vec![1, 2, 3]);

    let view = controller.add_topic(Topic::new(4)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Idle);
    assert_eq!(ids(&controller), vec![1, 2, 3, 4]);

    let view = controller.remove_topic(Topic::new(4)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Idle);
    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert_eq!(server.devnet().topics(), vec![Topic::new(1), Topic::new(2), Topic::new(3)]);
}

#[tokio::test]
async fn test_viewer_cannot_mutate() {
    let (server, controller) = start(&[1]);
    server.devnet().set_accounts(vec![DEV_ACCOUNT_1]);

    let view = controller.refresh().await.expect("refresh accepted");
    assert!(!view.authorized);
    assert_eq!(controller.add_topic(Topic::new(2)).await, Err(Rejected::Unauthorized));
    assert_eq!(server.devnet().call_count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_external_insert_caught_by_existence_check() {
    let (server, controller) = start(&[1]);
    controller.refresh().await.expect("refresh accepted");
    server.devnet().insert_topic_externally(Topic::new(2));

    let view = controller.add_topic(Topic::new(2)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Failed);
    assert_eq!(view.message.as_deref(), Some("Topic 2 already exists"));
    assert_eq!(server.devnet().call_count("eth_sendTransaction"), 0);
    // The snapshot that missed topic 2 was re-read.
    assert_eq!(ids(&controller), vec![1, 2]);
}

#[tokio::test]
async fn test_contract_has_the_final_word() {
    let (server, controller) = start(&[1]);
    controller.refresh().await.expect("refresh accepted");
    // Ownership moves after the controller last read it.
    server.devnet().set_owner(DEV_ACCOUNT_1);

    let view = controller.add_topic(Topic::new(2)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Failed);
    assert_eq!(view.message.as_deref(), Some("Adding topic 2 was rejected by the network"));
    assert_eq!(ids(&controller), vec![1]);
}

#[tokio::test]
async fn test_unmined_transaction_times_out() {
    let (server, controller) = start(&[1]);
    controller.refresh().await.expect("refresh accepted");
    server.devnet().set_auto_mine(false);

    let view = controller.add_topic(Topic::new(2)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Failed);
    assert!(view.message.expect("message").contains("was not confirmed within 300ms"));
    assert_eq!(ids(&controller), vec![1]);

    // Once mined, a refresh picks the topic up.
    server.devnet().mine();
    let view = controller.refresh().await.expect("refresh accepted");
    assert_eq!(view.phase, OperationPhase::Idle);
    assert_eq!(ids(&controller), vec![1, 2]);
}

#[tokio::test]
async fn test_declined_signature() {
    let (server, controller) = start(&[1]);
    controller.refresh().await.expect("refresh accepted");
    server.devnet().reject_next_send();

    let view = controller.remove_topic(Topic::new(1)).await.expect("intent accepted");
    assert_eq!(view.phase, OperationPhase::Failed);
    assert_eq!(view.message.as_deref(), Some("Removing topic 1 was declined by the signer"));
    assert_eq!(server.devnet().topics(), vec![Topic::new(1)]);
}
