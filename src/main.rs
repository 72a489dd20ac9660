use futures::future::join_all;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balloonpop::{
    broadcast,
    client::{ClientNode, SubmitError},
    config::{HostConfig, SimConfig},
    host::HostNode,
    protocol::{Action, Channel, HostCommand},
    state::PhaseError,
    transport::LoopbackHub,
    types::*,
};

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("{0} never showed up in a snapshot")]
    NotObserved(&'static str),
}

/// Everything one run of the headless game needs
struct Table {
    host: Arc<HostNode>,
    clients: Vec<Arc<ClientNode>>,
    sim: SimConfig,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balloonpop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Balloon Pop simulation...");

    let host_config = HostConfig::from_env();
    let sim = SimConfig::from_env();

    let hub = LoopbackHub::with_loss_rate(sim.loss_rate);
    let (host_link, host_rx) = hub.attach(Channel::Action).await;
    let host = Arc::new(HostNode::start(Arc::new(host_link), host_config.clone()));
    broadcast::spawn_action_listener(host.clone(), host_rx);

    let mut clients = Vec::with_capacity(sim.players);
    for _ in 0..sim.players {
        let (link, rx) = hub.attach(Channel::State).await;
        let client = Arc::new(ClientNode::start(Arc::new(link)));
        broadcast::spawn_state_listener(client.clone(), rx);
        clients.push(client);
    }

    if let Some(every) = host_config.snapshot_heartbeat {
        broadcast::spawn_snapshot_heartbeat(host.clone(), every);
    }

    let table = Table { host, clients, sim };
    match table.play().await {
        Ok(session) => print_results(&session),
        Err(e) => tracing::error!("Simulation failed: {}", e),
    }
}

impl Table {
    async fn play(&self) -> Result<Session, SimError> {
        self.host
            .command(HostCommand::FinishNameEntry {
                name: "Hana".to_string(),
            })
            .await?;

        self.lobby().await?;
        self.round_one().await?;
        self.round_two().await?;
        self.round_three().await
    }

    async fn lobby(&self) -> Result<(), SimError> {
        let joins = self.clients.iter().enumerate().map(|(i, client)| async move {
            let me = client.local_player_id().to_string();
            let action = client.join(&format!("Guest {}", i + 1)).await?;
            self.observe(client, &action, |s| s.player(&me).is_some())
                .await
        });
        collect(join_all(joins).await)?;

        // The first guest takes the spotlight
        let spotlight = self.clients[0].local_player_id().to_string();
        self.host
            .command(HostCommand::SetSpotlight {
                player_id: spotlight,
            })
            .await?;
        Ok(())
    }

    async fn round_one(&self) -> Result<(), SimError> {
        self.host.command(HostCommand::StartRound1).await?;

        let verdicts = self.balloon_clients().enumerate().map(|(i, client)| async move {
            let me = client.local_player_id().to_string();
            // Keep at least one guest balloon in play
            if i == 1 {
                let action = client.pop("looks").await?;
                self.observe(client, &action, |s| {
                    s.player(&me).is_some_and(|p| p.is_popped())
                })
                .await
            } else {
                let action = client.keep().await?;
                self.observe(client, &action, |s| {
                    s.phase == GamePhase::Round1 && s.player(&me).is_some_and(|p| !p.is_popped())
                })
                .await
            }
        });
        collect(join_all(verdicts).await)?;
        Ok(())
    }

    async fn round_two(&self) -> Result<(), SimError> {
        self.host.command(HostCommand::StartRound2).await?;
        let session = self.host.session().await;
        if session.phase == GamePhase::Results {
            return Ok(());
        }

        let asks = self.balloon_clients().map(|client| async move {
            let me = client.local_player_id().to_string();
            if client.me().await.is_some_and(|p| p.is_popped()) {
                return Ok(());
            }
            let action = client.ask("What is your idea of a perfect day?").await?;
            self.observe(client, &action, |s| s.question_from(&me).is_some())
                .await
                .map(|_| ())
        });
        collect(join_all(asks).await)?;

        let host_id = self.host.local_player_id().to_string();
        if !session.is_spotlight(&host_id) {
            self.host
                .apply_local(&Action::Question {
                    id: new_id(),
                    from_player_id: host_id,
                    text: "Cats or dogs?".to_string(),
                })
                .await;
        }

        let spotlight = &self.clients[0];
        let expected = self.host.session().await.questions.len();
        let session = self
            .catch_up(spotlight, |s| s.questions.len() == expected)
            .await?;

        for question in session.questions_in_order() {
            let action = spotlight
                .answer(&question.id, &format!("Answering \"{}\"", question.text))
                .await?;
            let question_id = question.id.clone();
            self.observe(spotlight, &action, |s| s.answer_for(&question_id).is_some())
                .await?;
        }
        Ok(())
    }

    async fn round_three(&self) -> Result<Session, SimError> {
        let session = self.host.session().await;
        if session.phase == GamePhase::Results {
            return Ok(session);
        }
        self.host.command(HostCommand::StartRound3).await?;

        let spotlight = &self.clients[0];
        let session = self
            .catch_up(spotlight, |s| s.phase == GamePhase::Round3)
            .await?;
        let Some(chosen) = session.remaining_balloons().first().map(|p| p.id.clone()) else {
            return Ok(self.host.session().await);
        };

        let action = spotlight.choose(&chosen).await?;
        self.observe(spotlight, &action, |s| s.phase == GamePhase::Results)
            .await
    }

    fn balloon_clients(&self) -> impl Iterator<Item = &Arc<ClientNode>> {
        self.clients.iter().skip(1)
    }

    /// Watch for the effect of an already submitted action, resubmitting the
    /// identical action whenever the wait runs out
    async fn observe<F>(
        &self,
        client: &ClientNode,
        action: &Action,
        predicate: F,
    ) -> Result<Session, SimError>
    where
        F: Fn(&Session) -> bool,
    {
        for attempt in 1..=self.sim.max_attempts {
            if let Some(session) = client
                .wait_until(&predicate, self.sim.observe_timeout)
                .await
            {
                return Ok(session);
            }
            tracing::debug!(attempt, "Resubmitting {}", action.kind());
            client.submit(action).await?;
        }
        Err(SimError::NotObserved(action.kind()))
    }

    /// Bring a client's replica up to date with the host without it acting
    async fn catch_up<F>(&self, client: &ClientNode, predicate: F) -> Result<Session, SimError>
    where
        F: Fn(&Session) -> bool,
    {
        for _ in 0..self.sim.max_attempts {
            self.host.rebroadcast().await;
            if let Some(session) = client
                .wait_until(&predicate, self.sim.observe_timeout)
                .await
            {
                return Ok(session);
            }
        }
        Err(SimError::NotObserved("host snapshot"))
    }
}

fn collect<T>(results: Vec<Result<T, SimError>>) -> Result<Vec<T>, SimError> {
    results.into_iter().collect()
}

fn print_results(session: &Session) {
    let name = |id: &str| {
        session
            .player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    println!("Game {}", session.game_id.as_deref().unwrap_or("?"));
    for player in session.balloons() {
        match &player.pop_reason {
            Some(reason) => println!("  {} popped ({})", player.name, reason),
            None if player.is_popped() => println!("  {} popped", player.name),
            None => println!("  {} kept their balloon", player.name),
        }
    }
    for question in session.questions_in_order() {
        let answer = session
            .answer_for(&question.id)
            .map(|a| a.text.as_str())
            .unwrap_or("(no answer)");
        println!("  {} asked: {}", name(&question.from_player_id), question.text);
        println!("    -> {}", answer);
    }
    match &session.matched {
        Some(m) => println!("Match: {} + {}", name(&m.spotlight_id), name(&m.balloon_id)),
        None => println!("No match this time"),
    }
}
