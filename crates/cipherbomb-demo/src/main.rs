//! CipherBomb Demo
//!
//! Runs complete matches against the mock homomorphic backend. A background
//! coprocessor task fulfills randomness requests after a delay, and each
//! match is driven by the orchestrator loop a real client would run:
//! retry `assign_roles`, then `deal_round` / `check_deal_complete` while a
//! deal is pending, then let the current player take a card.
//!
//! Configuration comes from an optional JSON file named by
//! `CIPHERBOMB_CONFIG`, overridden by `PLAYERS`, `GAMES`, `SEED`,
//! `FULFILL_DELAY_MS` and `DEAL_TIMEOUT_SECS`. Log verbosity follows
//! `RUST_LOG`.

use cipherbomb_core::{
    CipherBomb, GameConfig, GameError, GameHost, GameId, MockFheBackend, Outcome, PlayerKeys,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Demo error type
#[derive(Debug, Error)]
enum DemoError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Backend error: {0}")]
    Backend(#[from] cipherbomb_core::FheError),

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Game {0} not found")]
    MissingGame(GameId),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Game {0} stopped without an outcome")]
    NoOutcome(GameId),
}

/// Demo settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    players: usize,
    games: usize,
    seed: u64,
    /// Delay before the coprocessor fulfills outstanding randomness
    fulfill_delay_ms: u64,
    /// Give up on a deal (or role assignment) after this long
    deal_timeout_secs: u64,
    /// Pause between orchestrator retries
    poll_interval_ms: u64,
    game: GameConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            players: 4,
            games: 1,
            seed: 7,
            fulfill_delay_ms: 50,
            deal_timeout_secs: 10,
            poll_interval_ms: 10,
            game: GameConfig::default(),
        }
    }
}

/// Replace `target` with the parsed value of `name`, if set and valid
fn env_override<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Some(value) = std::env::var(name).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

impl DemoConfig {
    fn load() -> Result<Self, DemoError> {
        let mut config = match std::env::var("CIPHERBOMB_CONFIG") {
            Ok(path) => {
                info!("Loading config from {}", path);
                serde_json::from_str(&std::fs::read_to_string(path)?)?
            }
            Err(_) => DemoConfig::default(),
        };
        env_override("PLAYERS", &mut config.players);
        env_override("GAMES", &mut config.games);
        env_override("SEED", &mut config.seed);
        env_override("FULFILL_DELAY_MS", &mut config.fulfill_delay_ms);
        env_override("DEAL_TIMEOUT_SECS", &mut config.deal_timeout_secs);
        Ok(config)
    }

    fn deal_timeout(&self) -> Duration {
        Duration::from_secs(self.deal_timeout_secs)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

type SharedHost = Arc<Mutex<GameHost<MockFheBackend>>>;

/// Run `f` against one match while holding the host lock
async fn with_game<T>(
    host: &SharedHost,
    id: &GameId,
    f: impl FnOnce(&mut CipherBomb<MockFheBackend>) -> Result<T, DemoError>,
) -> Result<T, DemoError> {
    let mut host = host.lock().await;
    let game = host.game_mut(id).ok_or(DemoError::MissingGame(*id))?;
    f(game)
}

/// Fulfill outstanding randomness every `delay`, like an FHE coprocessor
fn spawn_coprocessor(backend: MockFheBackend, delay: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(delay).await;
            let fulfilled = backend.fulfill_pending();
            if fulfilled > 0 {
                debug!("Coprocessor fulfilled {} randomness request(s)", fulfilled);
            }
        }
    })
}

/// Retry role assignment until the backend has delivered every draw
async fn await_roles(host: &SharedHost, id: &GameId, config: &DemoConfig) -> Result<(), DemoError> {
    let retries = async {
        loop {
            if with_game(host, id, |game| Ok(game.assign_roles()?)).await? {
                return Ok::<(), DemoError>(());
            }
            tokio::time::sleep(config.poll_interval()).await;
        }
    };
    tokio::time::timeout(config.deal_timeout(), retries)
        .await
        .map_err(|_| DemoError::Timeout("roles"))?
}

/// The deal retry loop: deal, check, repeat while the deal is pending
async fn await_deal(host: &SharedHost, id: &GameId, config: &DemoConfig) -> Result<u32, DemoError> {
    let retries = async {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let pending = with_game(host, id, |game| {
                game.deal_round()?;
                Ok(game.check_deal_complete()?)
            })
            .await?;
            if !pending {
                return Ok::<u32, DemoError>(attempts);
            }
            tokio::time::sleep(config.poll_interval()).await;
        }
    };
    tokio::time::timeout(config.deal_timeout(), retries)
        .await
        .map_err(|_| DemoError::Timeout("deal"))?
}

/// Each player opens their own hand with their own keys
fn show_hands(game: &CipherBomb<MockFheBackend>, keys: &[PlayerKeys]) -> Result<(), DemoError> {
    for k in keys {
        let id = k.player_id();
        let token = k.authorize(&game.id());
        let hand = game.get_hand(&id, &token)?.open(k)?;
        info!(
            "  {} sees {} wire / {} bomb / {} neutral",
            game.player_name(&id).unwrap_or("?"),
            hand.wire,
            hand.bomb,
            hand.neutral
        );
    }
    Ok(())
}

fn show_roles(game: &CipherBomb<MockFheBackend>, keys: &[PlayerKeys]) -> Result<(), DemoError> {
    for k in keys {
        let id = k.player_id();
        let token = k.authorize(&game.id());
        let good = k.open_bool(&game.get_role(&id, &token)?)?;
        info!(
            "  {} learns they are a {}",
            game.player_name(&id).unwrap_or("?"),
            if good { "good guy" } else { "bad guy" }
        );
    }
    Ok(())
}

/// Play one match to the end and return its outcome
async fn run_match(
    host: SharedHost,
    id: GameId,
    config: DemoConfig,
    seed: u64,
) -> Result<Outcome, DemoError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let keys: Vec<PlayerKeys> = (0..config.players).map(|_| PlayerKeys::generate()).collect();

    with_game(&host, &id, |game| {
        for (i, k) in keys.iter().enumerate() {
            game.join(k.player_id(), format!("player-{}", i + 1))?;
        }
        game.start_game()?;
        Ok(())
    })
    .await?;

    await_roles(&host, &id, &config).await?;
    with_game(&host, &id, |game| show_roles(game, &keys)).await?;

    loop {
        let (running, deal_pending) =
            with_game(&host, &id, |game| Ok((game.game_running(), game.deal_pending()))).await?;
        if !running {
            break;
        }
        if deal_pending {
            let attempts = await_deal(&host, &id, &config).await?;
            with_game(&host, &id, |game| {
                info!(
                    "Game {}: round {} dealt after {} attempt(s), {} cards each",
                    id,
                    game.round_number(),
                    attempts,
                    game.round_cards_remaining()
                );
                show_hands(game, &keys)
            })
            .await?;
            continue;
        }

        with_game(&host, &id, |game| {
            let Some(caller) = game.current_turn_player() else {
                return Ok(());
            };
            let targets: Vec<_> = game
                .players()
                .into_iter()
                .filter(|p| p.id != caller && !p.eliminated && p.cards > 0)
                .collect();
            let Some(target) = targets.choose(&mut rng) else {
                warn!("Game {}: {} has nobody to take from", id, caller);
                return Ok(());
            };
            game.take_card(&caller, &target.id)?;
            info!(
                "Game {}: {} took a card from {} {:?}",
                id,
                game.player_name(&caller).unwrap_or("?"),
                target.name,
                game.aggregate_card_counts()
            );
            Ok(())
        })
        .await?;
    }

    with_game(&host, &id, |game| {
        for event in game.drain_events() {
            debug!("{}", serde_json::to_string(&event)?);
        }
        game.outcome().ok_or(DemoError::NoOutcome(id))
    })
    .await
}

/// Run every configured match concurrently
async fn run(config: DemoConfig) -> Result<Vec<(GameId, Outcome)>, DemoError> {
    config.game.validate().map_err(GameError::from)?;
    // requests only resolve when the coprocessor fulfills them
    let backend = MockFheBackend::with_latency(config.seed, u32::MAX);
    let coprocessor = spawn_coprocessor(
        backend.clone(),
        Duration::from_millis(config.fulfill_delay_ms),
    );
    let host: SharedHost = Arc::new(Mutex::new(GameHost::new(backend)));

    let mut matches = Vec::new();
    for n in 0..config.games {
        let id = host.lock().await.create_game(config.game.clone())?;
        let task = tokio::spawn(run_match(
            host.clone(),
            id,
            config.clone(),
            config.seed.wrapping_add(n as u64),
        ));
        matches.push((id, task));
    }

    let mut outcomes = Vec::new();
    for (id, task) in matches {
        match task.await {
            Ok(Ok(outcome)) => {
                info!("Game {} finished: {}", id, outcome);
                outcomes.push((id, outcome));
            }
            Ok(Err(e)) => error!("Game {} failed: {}", id, e),
            Err(e) => error!("Game {} task panicked: {}", id, e),
        }
    }
    coprocessor.abort();
    Ok(outcomes)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match DemoConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    info!(
        "Running {} game(s) with {} players (fulfill delay {}ms, deal timeout {}s)",
        config.games, config.players, config.fulfill_delay_ms, config.deal_timeout_secs
    );

    match run(config).await {
        Ok(outcomes) => {
            let good = outcomes
                .iter()
                .filter(|(_, o)| *o == Outcome::GoodGuysWin)
                .count();
            info!(
                "{} game(s) finished: {} good guys win, {} bad guys win",
                outcomes.len(),
                good,
                outcomes.len() - good
            );
        }
        Err(e) => {
            error!("Demo failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> DemoConfig {
        DemoConfig {
            games: 2,
            fulfill_delay_ms: 1,
            poll_interval_ms: 1,
            ..DemoConfig::default()
        }
    }

    #[tokio::test]
    async fn test_matches_run_to_an_outcome() {
        let outcomes = run(fast_config()).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_ne!(outcomes[0].0, outcomes[1].0);
    }

    #[tokio::test]
    async fn test_failed_matches_are_left_out() {
        // below the minimum table size every match fails to start
        let config = DemoConfig {
            players: 2,
            ..fast_config()
        };

        let outcomes = run(config).await.unwrap();

        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_deal_times_out_without_coprocessor() {
        let config = DemoConfig {
            deal_timeout_secs: 0,
            ..fast_config()
        };
        let backend = MockFheBackend::with_latency(1, u32::MAX);
        let host: SharedHost = Arc::new(Mutex::new(GameHost::new(backend)));
        let id = host.lock().await.create_game(GameConfig::default()).unwrap();
        with_game(&host, &id, |game| {
            for i in 0..4 {
                game.join(PlayerKeys::generate().player_id(), format!("p{}", i))?;
            }
            Ok(game.start_game()?)
        })
        .await
        .unwrap();

        assert!(matches!(
            await_roles(&host, &id, &config).await,
            Err(DemoError::Timeout("roles"))
        ));
    }

    #[test]
    fn test_config_file_uses_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{"players": 6, "game": {"bad_guys": 2}}"#).unwrap();

        assert_eq!(config.players, 6);
        assert_eq!(config.games, 1);
        assert_eq!(config.game.bad_guys, 2);
        assert_eq!(config.game.first_round_cards, 5);
    }
}
