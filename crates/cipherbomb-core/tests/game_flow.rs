//! Integration tests for the full game flow.
//!
//! These tests drive complete matches through the public API only, opening
//! hands the way players do: with their own keys through the gateway.

use cipherbomb_core::{
    CipherBomb, FheBackend, GameConfig, GameError, GameEvent, GameHost, Hand, MockFheBackend,
    Outcome, PlayerId, PlayerKeys,
};

fn seat(game: &mut CipherBomb<MockFheBackend>, count: usize) -> Vec<PlayerKeys> {
    let keys: Vec<PlayerKeys> = (0..count).map(|_| PlayerKeys::generate()).collect();
    for (i, k) in keys.iter().enumerate() {
        game.join(k.player_id(), format!("player-{}", i)).unwrap();
    }
    keys
}

fn wait_for_roles<B: FheBackend>(game: &mut CipherBomb<B>) {
    for _ in 0..100 {
        if game.assign_roles().unwrap() {
            return;
        }
    }
    panic!("roles never became ready");
}

/// The orchestrator retry loop; returns how many passes it took
fn deal<B: FheBackend>(game: &mut CipherBomb<B>) -> usize {
    for pass in 1..=100 {
        game.deal_round().unwrap();
        if !game.check_deal_complete().unwrap() {
            return pass;
        }
    }
    panic!("deal never completed");
}

fn open_hands<B: FheBackend>(game: &CipherBomb<B>, keys: &[PlayerKeys]) -> Vec<Hand> {
    keys.iter()
        .map(|k| {
            let token = k.authorize(&game.id());
            game.get_hand(&k.player_id(), &token)
                .unwrap()
                .open(k)
                .unwrap()
        })
        .collect()
}

fn ids(keys: &[PlayerKeys]) -> Vec<PlayerId> {
    keys.iter().map(|k| k.player_id()).collect()
}

/// Randomness for one four-player round of `cards` each: every wire and the
/// bomb land in the first seat first, never more than one in any other seat,
/// and each cut seed points at the last card of its source hand, which is
/// then always neutral under the rotation 0<-1, 1<-2, 2<-3, 3<-0.
fn quiet_round(cards: u64) -> Vec<u64> {
    let mut live = 5u64;
    let mut draws = Vec::new();
    for seat in 0..4 {
        for slot in 0..cards {
            let take_live = live > 0 && (seat == 0 || slot == 0);
            if take_live {
                live -= 1;
                draws.push(0);
            } else {
                draws.push(u64::MAX);
            }
        }
    }
    draws.extend([cards - 1, cards - 1, cards - 1, cards]);
    draws
}

fn rotate(game: &mut CipherBomb<MockFheBackend>, ids: &[PlayerId]) {
    for i in 0..4 {
        game.take_card(&ids[i], &ids[(i + 1) % 4]).unwrap();
    }
}

/// Seat 0 takes from seat 1, then seats 1 to 3 each take from seat 0
fn rotate_towards_first(game: &mut CipherBomb<MockFheBackend>, ids: &[PlayerId]) {
    game.take_card(&ids[0], &ids[1]).unwrap();
    for i in 1..4 {
        game.take_card(&ids[i], &ids[0]).unwrap();
    }
}

#[test]
fn test_four_player_round() {
    let backend = MockFheBackend::new(1);
    let mut game = CipherBomb::new(backend.clone(), GameConfig::default()).unwrap();
    let keys = seat(&mut game, 4);
    let ids = ids(&keys);

    // Phase 1: start and assign roles
    backend.script_randomness([0, 0, 0, 0]);
    backend.script_randomness(quiet_round(5));
    game.start_game().unwrap();
    assert_eq!(game.current_turn_player(), Some(ids[0]));
    wait_for_roles(&mut game);

    // Phase 2: deal
    deal(&mut game);
    assert_eq!(game.aggregate_card_counts(), vec![5, 5, 5, 5]);
    let hands = open_hands(&game, &keys);
    assert_eq!(hands[0], Hand { wire: 4, bomb: 1, neutral: 0 });
    for hand in &hands[1..] {
        assert_eq!(*hand, Hand { wire: 0, bomb: 0, neutral: 5 });
    }

    // Phase 3: one rotation of takes
    game.take_card(&ids[0], &ids[1]).unwrap();
    assert_eq!(game.aggregate_card_counts(), vec![6, 4, 5, 5]);
    assert_eq!(game.current_turn_player(), Some(ids[1]));
    game.take_card(&ids[1], &ids[2]).unwrap();
    game.take_card(&ids[2], &ids[3]).unwrap();
    game.take_card(&ids[3], &ids[0]).unwrap();

    // cards moved, none appeared or vanished
    assert_eq!(game.aggregate_card_counts(), vec![5, 5, 5, 5]);
    let hands = open_hands(&game, &keys);
    assert_eq!(hands[0], Hand { wire: 4, bomb: 1, neutral: 0 });
    assert_eq!(hands.iter().map(Hand::total).sum::<u64>(), 20);
    assert_eq!(hands.iter().map(|h| h.bomb).sum::<u64>(), 1);

    // Phase 4: the round is over and a smaller deal is due
    assert!(game.game_running());
    assert!(game.deal_pending());
    assert_eq!(game.round_cards_remaining(), 4);
    assert!(matches!(
        game.take_card(&ids[0], &ids[1]),
        Err(GameError::NotReady("deal"))
    ));
}

#[test]
fn test_rounds_shrink_until_bad_guys_win() {
    let backend = MockFheBackend::new(2);
    let mut game = CipherBomb::new(backend.clone(), GameConfig::default()).unwrap();
    let keys = seat(&mut game, 4);
    let ids = ids(&keys);

    backend.script_randomness([0, 0, 0, 0]);
    for cards in [5, 4, 3, 2] {
        backend.script_randomness(quiet_round(cards));
    }
    game.start_game().unwrap();
    wait_for_roles(&mut game);

    for cards in [5u32, 4, 3, 2] {
        deal(&mut game);
        assert_eq!(game.aggregate_card_counts(), vec![cards; 4]);
        let hands = open_hands(&game, &keys);
        assert_eq!(hands.iter().map(|h| h.bomb).sum::<u64>(), 1);
        assert!(hands.iter().all(|h| h.total() == cards as u64));
        rotate(&mut game, &ids);
    }

    assert!(game.game_ended());
    assert_eq!(game.outcome(), Some(Outcome::BadGuysWin));

    let dealt: Vec<u32> = game
        .events()
        .iter()
        .filter_map(|e| match e {
            GameEvent::RoundDealt {
                cards_per_player, ..
            } => Some(*cards_per_player),
            _ => None,
        })
        .collect();
    assert_eq!(dealt, vec![5, 4, 3, 2]);
    assert_eq!(game.events().iter().filter(|e| e.is_outcome()).count(), 1);

    assert!(matches!(game.deal_round(), Err(GameError::GameEnded)));
    assert!(matches!(
        game.take_card(&ids[0], &ids[1]),
        Err(GameError::GameEnded)
    ));
}

#[test]
fn test_good_guys_win_by_cutting_every_wire() {
    let backend = MockFheBackend::new(7);
    let mut game = CipherBomb::new(backend.clone(), GameConfig::default()).unwrap();
    let keys = seat(&mut game, 4);
    let ids = ids(&keys);

    // roles, then round one: the bomb and all four wires go to seat 0
    backend.script_randomness([0, 0, 0, 0]);
    backend.script_randomness([0; 5]);
    backend.script_randomness([u64::MAX; 15]);
    backend.script_randomness([0; 4]);
    game.start_game().unwrap();
    wait_for_roles(&mut game);
    deal(&mut game);
    assert_eq!(open_hands(&game, &keys)[0], Hand { wire: 4, bomb: 1, neutral: 0 });

    // every seed cuts position 0: seats 1 to 3 each pull a fresh wire from seat 0
    rotate_towards_first(&mut game, &ids);
    assert!(game.game_running());
    assert!(game.deal_pending());
    assert_eq!(game.current_turn_player(), Some(ids[0]));

    // round two only re-deals the single wire still uncut
    backend.script_randomness([0, 0]);
    backend.script_randomness([u64::MAX; 14]);
    backend.script_randomness([0; 4]);
    deal(&mut game);
    let hands = open_hands(&game, &keys);
    assert_eq!(hands[0], Hand { wire: 1, bomb: 1, neutral: 2 });
    assert_eq!(hands.iter().map(|h| h.wire).sum::<u64>(), 1);

    game.take_card(&ids[0], &ids[1]).unwrap();
    assert!(game.game_running());
    game.take_card(&ids[1], &ids[0]).unwrap();

    assert!(game.game_ended());
    assert_eq!(game.outcome(), Some(Outcome::GoodGuysWin));
    assert_eq!(game.events().iter().filter(|e| e.is_outcome()).count(), 1);
    assert_eq!(
        game.events().last(),
        Some(&GameEvent::outcome(game.id(), Outcome::GoodGuysWin))
    );

    assert!(matches!(
        game.take_card(&ids[2], &ids[3]),
        Err(GameError::GameEnded)
    ));
    assert!(matches!(game.deal_round(), Err(GameError::GameEnded)));
    assert!(matches!(
        game.check_deal_complete(),
        Err(GameError::GameEnded)
    ));
}

#[test]
fn test_random_matches_end_exactly_once() {
    for seed in 0..12 {
        let backend = MockFheBackend::new(seed);
        let mut game = CipherBomb::new(backend, GameConfig::default()).unwrap();
        let keys = seat(&mut game, 4 + (seed as usize % 3));
        game.start_game().unwrap();
        wait_for_roles(&mut game);

        let mut last_round_cards = u32::MAX;
        while game.game_running() {
            if game.deal_pending() {
                deal(&mut game);
                if !game.game_running() {
                    break;
                }
                let cards = game.round_cards_remaining();
                assert!(cards < last_round_cards, "seed {}", seed);
                last_round_cards = cards;
                let hands = open_hands(&game, &keys);
                assert_eq!(hands.iter().map(|h| h.bomb).sum::<u64>(), 1);
                continue;
            }
            let caller = game.current_turn_player().unwrap();
            let target = game
                .players()
                .into_iter()
                .find(|p| p.id != caller && !p.eliminated && p.cards > 0)
                .unwrap();
            game.take_card(&caller, &target.id).unwrap();
        }

        let outcomes: Vec<_> = game.events().iter().filter(|e| e.is_outcome()).collect();
        assert_eq!(outcomes.len(), 1, "seed {}", seed);
        assert_eq!(
            outcomes[0],
            &GameEvent::outcome(game.id(), game.outcome().unwrap())
        );
    }
}

#[test]
fn test_exactly_one_bad_guy_seen_by_players() {
    let mut game = CipherBomb::new(MockFheBackend::new(3), GameConfig::default()).unwrap();
    let keys = seat(&mut game, 6);
    game.start_game().unwrap();
    wait_for_roles(&mut game);

    let bad_guys = keys
        .iter()
        .filter(|k| {
            let token = k.authorize(&game.id());
            let sealed = game.get_role(&k.player_id(), &token).unwrap();
            !k.open_bool(&sealed).unwrap()
        })
        .count();
    assert_eq!(bad_guys, 1);
}

#[test]
fn test_token_of_one_player_cannot_read_another() {
    let mut game = CipherBomb::new(MockFheBackend::new(4), GameConfig::default()).unwrap();
    let keys = seat(&mut game, 4);
    game.start_game().unwrap();
    wait_for_roles(&mut game);
    deal(&mut game);

    let token = keys[0].authorize(&game.id());
    assert!(matches!(
        game.get_hand(&keys[1].player_id(), &token),
        Err(GameError::Unauthorized)
    ));
    assert!(matches!(
        game.get_role(&keys[1].player_id(), &token),
        Err(GameError::Unauthorized)
    ));
    assert!(game.get_hand(&keys[0].player_id(), &token).is_ok());
}

#[test]
fn test_slow_randomness_needs_retries() {
    let backend = MockFheBackend::with_latency(5, 4);
    let mut game = CipherBomb::new(backend.clone(), GameConfig::default()).unwrap();
    seat(&mut game, 4);
    game.start_game().unwrap();
    wait_for_roles(&mut game);

    let passes = deal(&mut game);

    assert!(passes > 1);
    assert_eq!(backend.pending_requests(), 0);
    assert_eq!(game.aggregate_card_counts(), vec![5, 5, 5, 5]);
}

#[test]
fn test_host_keeps_matches_apart() {
    let backend = MockFheBackend::new(6);
    let mut host = GameHost::new(backend);
    let a = host.create_game(GameConfig::default()).unwrap();
    let b = host.create_game(GameConfig::default()).unwrap();

    let keys_a = seat(host.game_mut(&a).unwrap(), 4);
    let keys_b = seat(host.game_mut(&b).unwrap(), 5);
    for id in [a, b] {
        let game = host.game_mut(&id).unwrap();
        game.start_game().unwrap();
        wait_for_roles(game);
        deal(game);
    }

    assert_eq!(host.game(&a).unwrap().aggregate_card_counts(), vec![5; 4]);
    assert_eq!(host.game(&b).unwrap().aggregate_card_counts(), vec![5; 5]);

    // a token is scoped to its own match
    let token = keys_a[0].authorize(&a);
    assert!(matches!(
        host.game(&b)
            .unwrap()
            .get_hand(&keys_b[0].player_id(), &token),
        Err(GameError::Unauthorized)
    ));
    assert_eq!(host.active_games().len(), 2);
}
