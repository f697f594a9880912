//! The chain service end to end: typed requests in, chain state out.

use std::sync::Arc;

use glint_chain::{Blockchain, ChainConfig, Collaborators, SubmitOutcome};
use glint_crypto::SecretKey;
use glint_ledger::outputs::OUTPUT_TREE;
use glint_ledger::{Header, HeaderTemplate};
use glint_node::{
    spawn_service, GlintNode, NodeConfig, NodeError, NodeMetrics, ShutdownController, ShutdownReason,
};
use glint_nullables::{NullClock, NullEnvironment};
use glint_store::{Environment, Table, WriteTxn};
use glint_types::{ConsensusParams, NetworkId};
use glint_work::{validate_pow, Blake2bOracle};

fn params() -> ConsensusParams {
    ConsensusParams::for_network(NetworkId::Dev)
}

fn solve(template: &HeaderTemplate) -> Header {
    let bytes = template.to_bytes();
    let nonce = (0u64..)
        .find(|&n| validate_pow(&Blake2bOracle, &bytes, n, template.height, template.bits).is_ok())
        .unwrap();
    Header::new(template.clone(), nonce)
}

fn in_memory_chain(clock: Arc<NullClock>) -> Blockchain<NullEnvironment> {
    Blockchain::open(
        Arc::new(NullEnvironment::new()),
        params(),
        ChainConfig::default(),
        Arc::new(Blake2bOracle),
        Collaborators {
            clock,
            ..Collaborators::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn mining_through_the_handle_moves_the_tip() {
    let clock = Arc::new(NullClock::new(params().genesis_timestamp + 60));
    let metrics = Arc::new(NodeMetrics::new().unwrap());
    let shutdown = ShutdownController::new();
    let (handle, task) = spawn_service(
        in_memory_chain(clock.clone()),
        Arc::clone(&metrics),
        8,
        shutdown.clone(),
    );

    let (genesis, height) = handle.tip().await.unwrap();
    assert_eq!(height, Some(0));

    let template = handle.block_template(SecretKey::random()).await.unwrap();
    let solved = solve(&template.header);
    let hash = solved.hash();
    assert_eq!(
        handle.submit_solution(solved.clone()).await.unwrap(),
        SubmitOutcome::Accepted(hash)
    );
    assert_eq!(handle.tip().await.unwrap(), (hash, Some(1)));
    assert_eq!(handle.submit_solution(solved).await.unwrap(), SubmitOutcome::Stale);

    let header = handle.header(hash).await.unwrap().unwrap();
    assert_eq!(header.prev(), genesis);
    assert_eq!(handle.headers_at_height(1).await.unwrap().len(), 1);
    assert!(handle.block(hash).await.unwrap().is_some());
    assert_eq!(metrics.tip_height.get(), 1);

    shutdown.trigger(ShutdownReason::Requested);
    let chain = task.await.unwrap();
    assert_eq!(chain.current_tip().unwrap(), hash);
    assert!(matches!(handle.tip().await, Err(NodeError::ServiceClosed)));
}

#[tokio::test]
async fn chain_errors_come_back_typed() {
    let clock = Arc::new(NullClock::new(params().genesis_timestamp));
    let shutdown = ShutdownController::new();
    let (handle, _task) = spawn_service(
        in_memory_chain(clock),
        Arc::new(NodeMetrics::new().unwrap()),
        8,
        shutdown.clone(),
    );

    let (genesis, _) = handle.tip().await.unwrap();
    let genesis = handle.block(genesis).await.unwrap().unwrap();
    let err = handle.add_header(genesis.header).await.unwrap_err();
    let NodeError::Chain(chain) = err else {
        panic!("expected a chain error, got {err:?}");
    };
    assert!(chain.is_dos());
}

#[tokio::test]
async fn consistency_fault_stops_the_service() {
    let env = Arc::new(NullEnvironment::new());
    let chain = Blockchain::open(
        Arc::clone(&env),
        params(),
        ChainConfig::default(),
        Arc::new(Blake2bOracle),
        Collaborators {
            clock: Arc::new(NullClock::new(params().genesis_timestamp)),
            ..Collaborators::default()
        },
    )
    .unwrap();
    let shutdown = ShutdownController::new();
    let (handle, task) = spawn_service(
        chain,
        Arc::new(NodeMetrics::new().unwrap()),
        8,
        shutdown.clone(),
    );
    handle.tip().await.unwrap();

    // output tree state no longer matches the commitment tree
    let mut txn = env.write_txn().unwrap();
    txn.put(Table::MmrMeta, &[OUTPUT_TREE, b's'], &[9; 32]).unwrap();
    txn.commit().unwrap();

    let err = handle.tip().await.unwrap_err();
    assert!(matches!(&err, NodeError::Chain(chain) if chain.is_fatal()));
    task.await.unwrap();
    assert!(shutdown.reason().is_some_and(|reason| reason.is_fault()));
    assert!(matches!(handle.tip().await, Err(NodeError::ServiceClosed)));
}

#[tokio::test]
async fn lmdb_node_restarts_on_the_same_tip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        map_size: 64 * 1024 * 1024,
        ..NodeConfig::default()
    };

    let node = GlintNode::start(config.clone(), Collaborators::default()).unwrap();
    let (tip, height) = node.handle().tip().await.unwrap();
    assert_eq!(height, Some(0));
    assert_eq!(node.metrics().blocks_applied.get(), 1);
    assert_eq!(node.stop().await.unwrap(), ShutdownReason::Requested);

    let node = GlintNode::start(config, Collaborators::default()).unwrap();
    assert_eq!(node.handle().tip().await.unwrap(), (tip, Some(0)));
    assert_eq!(node.metrics().blocks_applied.get(), 0);
    node.shutdown_controller().trigger(ShutdownReason::Signal("SIGTERM"));
    assert_eq!(node.stop().await.unwrap(), ShutdownReason::Signal("SIGTERM"));
}
