//! End-to-end sync runs against the in-memory mock node.
//!
//! Each test mirrors a small chain into a temp-dir store and checks the
//! resulting ledgers, snapshots, and watermark.

use strata_core::constants::{COINBASE_ADDRESS, SATS_PER_COIN};
use strata_index::sync::{SyncConfig, SyncDriver, SyncMode};
use strata_store::CacheStore;
use strata_tests::helpers::{MockNode, coinbase_tx, transfer_tx};

fn test_store() -> (tempfile::TempDir, CacheStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::open(dir.path()).unwrap();
    (dir, store)
}

/// Two blocks: a coinbase to alice, then a coinbase to bob plus alice
/// paying bob 20 with 30 change back to herself.
fn small_chain() -> MockNode {
    MockNode::with_chain(vec![
        vec![coinbase_tx("cb1", "alice", 50.0)],
        vec![
            coinbase_tx("cb2", "bob", 50.0),
            transfer_tx("t2", "cb1", 0, vec![("bob", 20.0), ("alice", 30.0)]),
        ],
    ])
}

#[tokio::test]
async fn update_mirrors_chain_and_ledgers() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());

    let report = driver.run(SyncMode::Update).await.unwrap();
    assert_eq!(report.tip, 2);
    assert_eq!(report.cached, 2);
    assert_eq!(store.last_synced().unwrap(), 2);

    let block = store.block_by_height(2).unwrap().unwrap();
    assert_eq!(block.tx.len(), 2);
    assert_eq!(block.fulltx.len(), 2);

    let alice = store.address("alice").unwrap().unwrap();
    assert_eq!(alice.received, 80 * SATS_PER_COIN);
    assert_eq!(alice.sent, 50 * SATS_PER_COIN);
    assert_eq!(alice.balance, 30 * SATS_PER_COIN);

    let bob = store.address("bob").unwrap().unwrap();
    assert_eq!(bob.received, 70 * SATS_PER_COIN);
    assert_eq!(bob.sent, 0);
    assert_eq!(bob.balance, 70 * SATS_PER_COIN);

    // Newly minted supply accumulates on the pseudo-address as sent only.
    let coinbase = store.address(COINBASE_ADDRESS).unwrap().unwrap();
    assert_eq!(coinbase.sent, 100 * SATS_PER_COIN);
    assert_eq!(coinbase.balance, 0);
}

#[tokio::test]
async fn ledger_invariant_holds_for_every_address() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());
    driver.run(SyncMode::Update).await.unwrap();

    for doc in store.all_addresses().unwrap() {
        if doc.a_id == COINBASE_ADDRESS {
            assert_eq!(doc.balance, 0);
        } else {
            assert_eq!(doc.balance, doc.received - doc.sent, "address {}", doc.a_id);
        }
    }
}

#[tokio::test]
async fn rerunning_update_changes_nothing() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());

    driver.run(SyncMode::Update).await.unwrap();
    let first = store.all_addresses().unwrap();

    let report = driver.run(SyncMode::Update).await.unwrap();
    assert_eq!(report.cached, 0);
    assert_eq!(store.all_addresses().unwrap(), first);
}

#[tokio::test]
async fn reindex_after_update_reproduces_state() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());

    driver.run(SyncMode::Update).await.unwrap();
    let baseline = store.all_addresses().unwrap();

    driver.run(SyncMode::Reindex).await.unwrap();
    assert_eq!(store.all_addresses().unwrap(), baseline);
    assert_eq!(store.last_synced().unwrap(), 2);
}

#[tokio::test]
async fn check_mode_fills_gaps_without_richlist_recompute() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());

    let report = driver.run(SyncMode::Check).await.unwrap();
    assert_eq!(report.cached, 2);

    // Check mode leaves the bootstrap rich-list document untouched.
    let richlist = store.richlist("strata").unwrap().unwrap();
    assert!(richlist.received.is_empty());
    assert!(richlist.balance.is_empty());
}

#[tokio::test]
async fn update_recomputes_richlist() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());
    driver.run(SyncMode::Update).await.unwrap();

    let richlist = store.richlist("strata").unwrap().unwrap();
    assert_eq!(richlist.balance[0].a_id, "bob");
    assert_eq!(richlist.balance[1].a_id, "alice");
    // Ranked by lifetime received, alice (80) leads bob (70).
    assert_eq!(richlist.received[0].a_id, "alice");
}

#[tokio::test]
async fn stats_and_peers_refresh_each_run() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());
    driver.run(SyncMode::Update).await.unwrap();

    let stats = store.stats("strata").unwrap().unwrap();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.connections, 8);
    assert_eq!(stats.supply, 5000.0);

    let peers = store.peers().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].address, "10.0.0.1:9333");
}

#[tokio::test]
async fn summed_balances_match_circulating_value() {
    let (_dir, store) = test_store();
    let node = small_chain();
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());
    driver.run(SyncMode::Update).await.unwrap();

    // alice 30 + bob 70, with the coinbase pseudo-address contributing zero.
    assert_eq!(store.balance_supply().unwrap(), 100 * SATS_PER_COIN);
}

#[tokio::test]
async fn handshake_failure_is_fatal() {
    let (_dir, store) = test_store();
    let mut node = small_chain();
    node.fail_handshake = true;
    let driver = SyncDriver::new(&node, &store, SyncConfig::default());

    assert!(driver.run(SyncMode::Update).await.is_err());
    // Nothing was mirrored.
    assert_eq!(store.last_synced().unwrap(), 0);
}

#[tokio::test]
async fn unresolvable_heights_are_skipped_not_fatal() {
    let (_dir, store) = test_store();
    let mut node = small_chain();
    // Drop block 1 from the node so its lookup fails mid-run.
    node.blocks.remove(&1);

    let driver = SyncDriver::new(&node, &store, SyncConfig::default());
    let report = driver.run(SyncMode::Update).await.unwrap();
    assert_eq!(report.cached, 1);
    assert_eq!(report.skipped, 1);
    assert!(store.block_by_height(2).unwrap().is_some());
}
