//! End-to-end scenarios for the Critter ledger.
//!
//! Every test runs one call per block through a [`Harness`], with scores
//! from the production virality engine and the default threshold of 60.
//! The reference squeak is resqueaked twice, then liked at age 3 (score 58)
//! and liked again at age 4 (score 63), which makes it viral.

use critter_core::address::Address;
use critter_core::config::ConfigKey;
use critter_core::error::LedgerError;
use critter_core::event::{LedgerEvent, Receipt};
use critter_core::types::{
    AccountStatus, CallContext, Interaction, PoolInfo, PoolPass, Sentiment, SentimentCounts, SqueakId,
};
use critter_tests::helpers::*;
use critter_virality::ViralityEngine;

struct Cast {
    a: Address,
    b: Address,
    c: Address,
    d: Address,
    e: Address,
}

fn cast() -> Cast {
    Cast {
        a: addr(0xA1),
        b: addr(0xB2),
        c: addr(0xC3),
        d: addr(0xD4),
        e: addr(0xE5),
    }
}

/// Registers the cast, posts A's squeak and brings it to one like short of
/// viral. Returns the squeak id.
fn almost_viral(h: &mut Harness, cast: &Cast) -> SqueakId {
    let id = h.post(cast.a, "first squeak");
    let posted = h.ledger.squeak(id).unwrap().block_number;
    h.interact(cast.a, id, Interaction::Resqueak);
    h.interact(cast.b, id, Interaction::Resqueak);
    assert_eq!(h.ledger.virality_score(id).unwrap(), 0, "no likes yet");
    assert_eq!(h.next_block() - posted, 3);
    h.interact(cast.c, id, Interaction::Like);
    id
}

/// Like by D at age 4 that crosses the threshold.
fn go_viral(h: &mut Harness, cast: &Cast, id: SqueakId) -> Receipt {
    let fee = h.ledger.interaction_fee(Interaction::Like);
    let ctx = h.ctx(cast.d, fee);
    h.ledger.interact(ctx, id, Interaction::Like).unwrap().1
}

fn harness(cast: &Cast) -> Harness {
    Harness::with_users(&[cast.a, cast.b, cast.c, cast.d, cast.e])
}

#[test]
fn below_threshold_forms_no_pool() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);

    assert_eq!(
        h.ledger.sentiment_counts(id),
        SentimentCounts {
            dislikes: 0,
            likes: 1,
            resqueaks: 2,
        }
    );
    assert!(!h.ledger.is_viral(id));
    assert_eq!(h.ledger.pool_info(id), PoolInfo::default());
    for who in [cast.a, cast.b, cast.c] {
        assert_eq!(h.ledger.scout_level(&who), 1);
    }
}

#[test]
fn crossing_threshold_forms_pool_with_bonus() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    let receipt = go_viral(&mut h, &cast, id);

    let created: Vec<_> = receipt
        .find(|e| matches!(e, LedgerEvent::PoolCreated { .. }))
        .collect();
    assert_eq!(
        created,
        vec![&LedgerEvent::PoolCreated {
            squeak_id: id,
            virality_score: 63,
            triggered_by: cast.d,
        }]
    );
    assert!(h.ledger.is_viral(id));

    assert_eq!(h.ledger.scout_level(&cast.a), 2);
    assert_eq!(h.ledger.scout_level(&cast.b), 2);
    assert_eq!(h.ledger.scout_level(&cast.c), 2);
    assert_eq!(h.ledger.scout_level(&cast.d), 7);
    assert_eq!(h.ledger.scout_level(&cast.e), 1);

    assert_eq!(
        h.ledger.pool_passes(id),
        vec![
            PoolPass { account: cast.a, shares: 2 },
            PoolPass { account: cast.b, shares: 2 },
            PoolPass { account: cast.c, shares: 2 },
            PoolPass { account: cast.d, shares: 7 },
        ]
    );
    assert_eq!(
        h.ledger.pool_info(id),
        PoolInfo {
            amount: 0,
            total_shares: 13,
            member_count: 4,
        }
    );
}

#[test]
fn triggering_fee_goes_to_owner_not_pool() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);

    // two resqueaks at 4000 and two likes at 2000, 10% kept each time
    assert_eq!(h.ledger.treasury(), 400 + 400 + 200 + 200);
    assert_eq!(
        h.ledger.balance(&cast.a),
        STARTING_BALANCE - 4000 + 3600 + 3600 + 1800 + 1800
    );
    assert_eq!(h.ledger.balance(&cast.b), STARTING_BALANCE - 4000);
    assert_eq!(h.ledger.balance(&cast.d), STARTING_BALANCE - 2000);
    assert_eq!(h.ledger.pool_info(id).amount, 0);
}

#[test]
fn later_positive_interaction_funds_pool_and_admits_caller() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);
    let owner_before = h.ledger.balance(&cast.a);

    let ctx = h.ctx(cast.e, 2000);
    let (_, receipt) = h.ledger.interact(ctx, id, Interaction::Like).unwrap();

    assert!(receipt.events.contains(&LedgerEvent::PoolMemberAdded {
        squeak_id: id,
        account: cast.e,
        shares: 1,
    }));
    assert_eq!(
        h.ledger.pool_info(id),
        PoolInfo {
            amount: 900,
            total_shares: 14,
            member_count: 5,
        }
    );
    assert_eq!(h.ledger.balance(&cast.a), owner_before + 900);
    assert_eq!(receipt.credited_to(&cast.a), 900);
}

#[test]
fn deleting_viral_squeak_resets_everything() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);
    let ctx = h.ctx(cast.e, 2000);
    h.ledger.interact(ctx, id, Interaction::Like).unwrap();
    let treasury_before = h.ledger.treasury();

    let posted = h.ledger.squeak(id).unwrap().block_number;
    let ctx = h.ctx(cast.a, 1000);
    let expected_fee = (ctx.block_number - posted) * 100;
    let balance_before = h.ledger.balance(&cast.a);
    let (fee, receipt) = h.ledger.delete_squeak(ctx, id).unwrap();

    assert_eq!(fee, expected_fee);
    assert_eq!(h.ledger.balance(&cast.a), balance_before - fee);
    assert!(receipt.events.contains(&LedgerEvent::Refunded {
        to: cast.a,
        amount: 1000 - fee,
    }));
    assert!(receipt.events.contains(&LedgerEvent::PoolDissolved {
        squeak_id: id,
        swept: 900,
    }));
    assert_eq!(
        receipt.events.last(),
        Some(&LedgerEvent::SqueakDeleted {
            squeak_id: id,
            deleted_by: cast.a,
            fee,
        })
    );
    assert_eq!(h.ledger.treasury(), treasury_before + fee + 900);

    assert_eq!(h.ledger.squeak(id), None);
    assert_eq!(h.ledger.sentiment_counts(id), SentimentCounts::default());
    for who in [cast.a, cast.b, cast.c, cast.d, cast.e] {
        assert_eq!(h.ledger.user_sentiment(id, &who), Sentiment::default());
    }
    assert!(!h.ledger.is_viral(id));
    assert_eq!(h.ledger.virality_score(id).unwrap(), 0);
    assert_eq!(h.ledger.pool_info(id), PoolInfo::default());
    assert!(h.ledger.pool_passes(id).is_empty());
    // levels earned from the pool survive deletion
    assert_eq!(h.ledger.scout_level(&cast.d), 7);

    let ctx = h.ctx(cast.b, 2000);
    assert_eq!(
        h.ledger.interact(ctx, id, Interaction::Like),
        Err(LedgerError::SqueakNotFound(id))
    );
}

#[test]
fn last_member_leaving_dissolves_pool_for_good() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);

    let ctx = h.ctx(cast.d, 0);
    assert_eq!(h.ledger.leave_pool(ctx, id).unwrap().0, 7);
    assert_eq!(h.ledger.pool_info(id).total_shares, 6);

    for member in [cast.a, cast.b] {
        let ctx = h.ctx(admin(), 0);
        assert_eq!(h.ledger.eject_from_pool(ctx, id, member).unwrap().0, 2);
    }
    let ctx = h.ctx(cast.c, 0);
    let (_, receipt) = h.ledger.leave_pool(ctx, id).unwrap();
    assert!(receipt.events.contains(&LedgerEvent::PoolDissolved {
        squeak_id: id,
        swept: 0,
    }));
    assert!(!h.ledger.is_viral(id));
    assert_eq!(h.ledger.pool_count(), 0);

    // a dissolved squeak never forms a second pool and is not pooled
    let owner_before = h.ledger.balance(&cast.a);
    let ctx = h.ctx(cast.e, 2000);
    let (_, receipt) = h.ledger.interact(ctx, id, Interaction::Like).unwrap();
    assert!(receipt
        .find(|e| matches!(e, LedgerEvent::PoolCreated { .. } | LedgerEvent::PoolFunded { .. }))
        .next()
        .is_none());
    assert_eq!(h.ledger.balance(&cast.a), owner_before + 1800);

    let ctx = h.ctx(cast.c, 0);
    assert_eq!(
        h.ledger.leave_pool(ctx, id),
        Err(LedgerError::PoolNotFound(id))
    );
}

#[test]
fn non_member_cannot_leave_and_ejection_needs_moderator() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);

    let ctx = h.ctx(cast.e, 0);
    assert_eq!(
        h.ledger.leave_pool(ctx, id),
        Err(LedgerError::NotPoolMember {
            squeak_id: id,
            account: cast.e,
        })
    );
    let ctx = h.ctx(cast.e, 0);
    assert!(matches!(
        h.ledger.eject_from_pool(ctx, id, cast.a),
        Err(LedgerError::MissingRole { .. })
    ));
    assert_eq!(h.ledger.pool_info(id).member_count, 4);
}

#[test]
fn undo_after_viral_keeps_pool_membership() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    go_viral(&mut h, &cast, id);
    let treasury_before = h.ledger.treasury();

    h.interact(cast.c, id, Interaction::UndoLike);
    assert_eq!(h.ledger.treasury(), treasury_before + 1000);
    assert_eq!(h.ledger.user_sentiment(id, &cast.c), Sentiment::default());
    assert_eq!(h.ledger.sentiment_counts(id).likes, 1);
    assert_eq!(h.ledger.pool_info(id).total_shares, 13);
    assert!(h.ledger.is_viral(id));
}

#[test]
fn dislike_replaces_like_and_pays_treasury() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = h.post(cast.a, "hot take");
    h.interact(cast.b, id, Interaction::Like);
    let treasury_before = h.ledger.treasury();
    let owner_before = h.ledger.balance(&cast.a);

    h.interact(cast.b, id, Interaction::Dislike);
    assert_eq!(
        h.ledger.user_sentiment(id, &cast.b),
        Sentiment {
            liked: false,
            disliked: true,
            resqueaked: false,
        }
    );
    assert_eq!(
        h.ledger.sentiment_counts(id),
        SentimentCounts {
            dislikes: 1,
            likes: 0,
            resqueaks: 0,
        }
    );
    assert_eq!(h.ledger.treasury(), treasury_before + 2000);
    assert_eq!(h.ledger.balance(&cast.a), owner_before);
}

#[test]
fn transferred_squeak_pays_new_owner() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = h.post(cast.a, "for sale");
    let ctx = h.ctx(cast.a, 0);
    h.ledger.transfer_squeak(ctx, id, cast.b).unwrap();
    assert_eq!(h.ledger.squeak(id).unwrap().owner, cast.b);

    let before = h.ledger.balance(&cast.b);
    h.interact(cast.c, id, Interaction::Like);
    assert_eq!(h.ledger.balance(&cast.b), before + 1800);

    let ctx = h.ctx(cast.a, 1_000);
    assert!(matches!(
        h.ledger.delete_squeak(ctx, id),
        Err(LedgerError::NotSqueakOwner { .. })
    ));
}

#[test]
fn banned_account_cannot_interact_or_delete() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = h.post(cast.a, "soon gone");
    let ctx = h.ctx(admin(), 0);
    h.ledger
        .update_account_status(ctx, cast.a, AccountStatus::Banned)
        .unwrap();

    let ctx = h.ctx(cast.a, 2000);
    assert!(matches!(
        h.ledger.interact(ctx, id, Interaction::Like),
        Err(LedgerError::InactiveAccount { .. })
    ));
    let ctx = h.ctx(cast.a, 10_000);
    assert!(matches!(
        h.ledger.delete_squeak(ctx, id),
        Err(LedgerError::InactiveAccount { .. })
    ));
    assert_eq!(h.ledger.balance(&cast.a), STARTING_BALANCE);
}

#[test]
fn calls_in_a_past_block_are_rejected() {
    let cast = cast();
    let mut h = harness(&cast);
    let tip = h.ledger.tip();
    let ctx = CallContext::new(cast.a, tip - 1);
    assert_eq!(
        h.ledger.create_squeak(ctx, "late"),
        Err(LedgerError::StaleBlock { got: tip - 1, tip })
    );
    // same block as the tip is still accepted
    let ctx = CallContext::new(cast.a, tip);
    assert!(h.ledger.create_squeak(ctx, "on time").is_ok());
}

#[test]
fn ledger_score_matches_engine_breakdown() {
    let cast = cast();
    let mut h = harness(&cast);
    let id = almost_viral(&mut h, &cast);
    let posted = h.ledger.squeak(id).unwrap().block_number;
    let engine = ViralityEngine::new();

    let expected = |h: &Harness| {
        let age = h.ledger.tip() - posted;
        engine
            .breakdown(&h.ledger.sentiment_counts(id), age)
            .unwrap()
            .score
    };
    assert_eq!(h.ledger.virality_score(id).unwrap(), expected(&h));
    assert_eq!(expected(&h), 58);

    go_viral(&mut h, &cast, id);
    assert_eq!(h.ledger.virality_score(id).unwrap(), expected(&h));
    assert_eq!(expected(&h), 63);
}

#[test]
fn zero_threshold_makes_first_like_viral() {
    let cast = cast();
    let mut h = harness(&cast);
    h.set_config(ConfigKey::ViralityThreshold, 0);
    let id = h.post(cast.a, "instant");

    let fee = h.ledger.interaction_fee(Interaction::Like);
    let ctx = h.ctx(cast.b, fee);
    let (_, receipt) = h.ledger.interact(ctx, id, Interaction::Like).unwrap();

    assert_eq!(h.ledger.virality_score(id).unwrap(), 0);
    assert!(h.ledger.is_viral(id));
    assert!(receipt.events.contains(&LedgerEvent::PoolCreated {
        squeak_id: id,
        virality_score: 0,
        triggered_by: cast.b,
    }));
    // basic increase plus the trigger bonus
    assert_eq!(h.ledger.scout_level(&cast.b), 7);
    assert_eq!(
        h.ledger.pool_passes(id),
        vec![PoolPass { account: cast.b, shares: 7 }]
    );
    assert_eq!(h.ledger.pool_info(id).amount, 0);
}

#[test]
fn zero_threshold_needs_a_positive_holder() {
    let cast = cast();
    let mut h = harness(&cast);
    h.set_config(ConfigKey::ViralityThreshold, 0);
    let id = h.post(cast.a, "unpopular");

    h.interact(cast.b, id, Interaction::Dislike);
    assert!(!h.ledger.is_viral(id));
    assert!(h.ledger.pool_passes(id).is_empty());
    assert_eq!(h.ledger.pool_info(id), PoolInfo::default());

    h.interact(cast.c, id, Interaction::Resqueak);
    assert!(h.ledger.is_viral(id));
    assert_eq!(
        h.ledger.pool_passes(id),
        vec![PoolPass { account: cast.c, shares: 7 }]
    );
}
