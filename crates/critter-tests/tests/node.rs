//! Node-level integration tests: configuration to genesis, block
//! assignment and the event log.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use critter_core::event::LedgerEvent;
use critter_core::types::Interaction;
use critter_node_lib::config::GenesisBalance;
use critter_node_lib::{Node, NodeConfig};
use critter_tests::helpers::*;

fn node_with(users: &[critter_core::address::Address]) -> Arc<Node> {
    let config = NodeConfig {
        genesis_admin: admin(),
        genesis_balances: users
            .iter()
            .map(|a| GenesisBalance {
                address: *a,
                amount: STARTING_BALANCE,
            })
            .collect(),
        parameters: BTreeMap::from([("virality_threshold".to_string(), 60)]),
        fees: BTreeMap::from([("like".to_string(), 3000)]),
        event_log_capacity: 64,
        ..NodeConfig::default()
    };
    Node::new(config).unwrap()
}

#[test]
fn node_runs_scenario_one_block_per_call() {
    let (a, b, c, d) = (addr(0xA1), addr(0xB2), addr(0xC3), addr(0xD4));
    let node = node_with(&[a, b, c, d]);
    assert_eq!(node.read(|l| l.interaction_fee(Interaction::Like)), 3000);

    for (i, who) in [a, b, c, d].into_iter().enumerate() {
        node.submit(who, 0, |l, ctx| l.create_account(ctx, &format!("critter{i}")))
            .unwrap();
    }
    let (id, receipt) = node
        .submit(a, 0, |l, ctx| l.create_squeak(ctx, "from the node"))
        .unwrap();
    assert_eq!(receipt.block_number, 5);

    for who in [a, b] {
        node.submit(who, 4000, |l, ctx| l.interact(ctx, id, Interaction::Resqueak))
            .unwrap();
    }
    node.submit(c, 3000, |l, ctx| l.interact(ctx, id, Interaction::Like))
        .unwrap();
    assert!(!node.read(|l| l.is_viral(id)));
    node.submit(d, 3000, |l, ctx| l.interact(ctx, id, Interaction::Like))
        .unwrap();
    assert!(node.read(|l| l.is_viral(id)));
    assert_eq!(node.read(|l| l.tip()), 9);

    let events = node.recent_events(64);
    assert!(events.windows(2).all(|w| w[0].block_number <= w[1].block_number));
    let created = events
        .iter()
        .find(|e| matches!(e.event, LedgerEvent::PoolCreated { .. }))
        .unwrap();
    assert_eq!(created.block_number, 9);
}

#[test]
fn rejected_submission_is_not_logged() {
    let a = addr(1);
    let node = node_with(&[a]);
    node.submit(a, 0, |l, ctx| l.create_account(ctx, "solo")).unwrap();
    let logged = node.recent_events(64).len();

    let err = node
        .submit(a, 0, |l, ctx| l.create_account(ctx, "again"))
        .unwrap_err();
    assert_eq!(err.code(), critter_core::error::LedgerError::AccountAlreadyExists(a).code());
    assert_eq!(node.recent_events(64).len(), logged);
    assert_eq!(node.read(|l| l.tip()), 1);
}

#[test]
fn concurrent_submissions_get_distinct_blocks() {
    let users: Vec<_> = (1..=8).map(addr).collect();
    let node = node_with(&users);

    let handles: Vec<_> = users
        .iter()
        .copied()
        .enumerate()
        .map(|(i, who)| {
            let node = node.clone();
            thread::spawn(move || {
                node.submit(who, 0, |l, ctx| l.create_account(ctx, &format!("t{i}")))
                    .unwrap()
                    .1
                    .block_number
            })
        })
        .collect();
    let mut blocks: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    blocks.sort_unstable();
    assert_eq!(blocks, (1..=8).collect::<Vec<_>>());
    assert_eq!(node.read(|l| l.account_count()), 8);

    let events = node.recent_events(100);
    assert_eq!(events.len(), 8);
    assert!(events.windows(2).all(|w| w[0].block_number < w[1].block_number));
}

#[test]
fn event_log_is_bounded() {
    let a = addr(1);
    let mut config = NodeConfig {
        genesis_admin: admin(),
        event_log_capacity: 3,
        ..NodeConfig::default()
    };
    config.genesis_balances.push(GenesisBalance {
        address: a,
        amount: STARTING_BALANCE,
    });
    let node = Node::new(config).unwrap();
    node.submit(a, 0, |l, ctx| l.create_account(ctx, "chatty")).unwrap();
    for i in 0..5 {
        node.submit(a, 0, |l, ctx| l.create_squeak(ctx, &format!("squeak {i}")))
            .unwrap();
    }
    let events = node.recent_events(10);
    assert_eq!(events.len(), 3);
    assert_eq!(events.last().unwrap().block_number, 6);
}
