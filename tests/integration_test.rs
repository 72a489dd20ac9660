use balloonpop::broadcast::{spawn_action_listener, spawn_state_listener};
use balloonpop::client::ClientNode;
use balloonpop::config::HostConfig;
use balloonpop::host::HostNode;
use balloonpop::protocol::{Action, Channel, HostCommand};
use balloonpop::transport::LoopbackHub;
use balloonpop::types::{GamePhase, Session};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(1);

/// Host plus `players` clients wired over one hub, host already in the lobby
async fn table(hub: Arc<LoopbackHub>, players: usize) -> (Arc<HostNode>, Vec<Arc<ClientNode>>) {
    let (host_link, host_rx) = hub.attach(Channel::Action).await;
    let host = Arc::new(HostNode::start(Arc::new(host_link), HostConfig::default()));
    spawn_action_listener(host.clone(), host_rx);

    let mut clients = Vec::new();
    for _ in 0..players {
        let (link, rx) = hub.attach(Channel::State).await;
        let client = Arc::new(ClientNode::start(Arc::new(link)));
        spawn_state_listener(client.clone(), rx);
        clients.push(client);
    }

    host.command(HostCommand::FinishNameEntry {
        name: "Hana".to_string(),
    })
    .await
    .unwrap();
    (host, clients)
}

async fn seen_by(client: &ClientNode, predicate: impl Fn(&Session) -> bool) -> Session {
    client
        .wait_until(predicate, WAIT)
        .await
        .expect("Client never saw the expected snapshot")
}

/// End-to-end game over the loopback link
#[tokio::test]
async fn test_full_game_flow() {
    let (host, clients) = table(LoopbackHub::new(), 3).await;
    let ids: Vec<String> = clients
        .iter()
        .map(|c| c.local_player_id().to_string())
        .collect();

    // 1. Everyone joins
    for (client, name) in clients.iter().zip(["Ann", "Ben", "Cat"]) {
        client.join(name).await.unwrap();
        let me = client.local_player_id().to_string();
        seen_by(client, |s| s.player(&me).is_some()).await;
        assert_eq!(client.phase().await, GamePhase::Lobby);
    }
    assert_eq!(host.session().await.players.len(), 4);

    // 2. Ann takes the spotlight, Round 1
    host.command(HostCommand::SetSpotlight {
        player_id: ids[0].clone(),
    })
    .await
    .unwrap();
    host.command(HostCommand::StartRound1).await.unwrap();
    seen_by(&clients[1], |s| s.phase == GamePhase::Round1).await;

    clients[1].keep().await.unwrap();
    clients[2].pop("looks").await.unwrap();
    let popped = ids[2].clone();
    let session = seen_by(&clients[0], |s| {
        s.player(&popped).is_some_and(|p| p.is_popped())
    })
    .await;
    assert_eq!(
        session.player(&ids[2]).unwrap().pop_reason.as_deref(),
        Some("looks")
    );

    // 3. Round 2: Ben and the host ask, Ann answers both
    host.command(HostCommand::StartRound2).await.unwrap();
    seen_by(&clients[1], |s| s.phase == GamePhase::Round2).await;

    clients[1].ask("Mountains or sea?").await.unwrap();
    let ben = ids[1].clone();
    seen_by(&clients[1], |s| s.question_from(&ben).is_some()).await;
    let host_id = host.local_player_id().to_string();
    host.apply_local(&Action::Question {
        id: "host-q".to_string(),
        from_player_id: host_id.clone(),
        text: "Cats or dogs?".to_string(),
    })
    .await;

    let session = seen_by(&clients[0], |s| s.questions.len() == 2).await;
    let ordered: Vec<_> = session
        .questions_in_order()
        .into_iter()
        .map(|q| q.from_player_id.clone())
        .collect();
    assert_eq!(ordered, vec![ids[1].clone(), host_id.clone()]);

    for question in session.questions_in_order() {
        clients[0].answer(&question.id, "Sea, always").await.unwrap();
    }
    seen_by(&clients[0], |s| s.answers.len() == 2).await;
    assert!(host.session().await.round_two_complete());

    // 4. Round 3: Ann picks Ben
    host.command(HostCommand::StartRound3).await.unwrap();
    seen_by(&clients[0], |s| s.phase == GamePhase::Round3).await;
    clients[0].choose(&ids[1]).await.unwrap();

    let results = seen_by(&clients[1], |s| s.phase == GamePhase::Results).await;
    let matched = results.matched.expect("Match should be set");
    assert_eq!(matched.spotlight_id, ids[0]);
    assert_eq!(matched.balloon_id, ids[1]);

    // 5. Restart returns to the lobby with round records cleared
    host.command(HostCommand::Restart).await.unwrap();
    let lobby = seen_by(&clients[2], |s| s.phase == GamePhase::Lobby).await;
    assert!(lobby.questions.is_empty());
    assert!(lobby.answers.is_empty());
    assert!(lobby.matched.is_none());
    assert_eq!(lobby.players.len(), 4);
}

#[tokio::test]
async fn test_duplicate_join_keeps_first_name() {
    let (host, clients) = table(LoopbackHub::new(), 1).await;
    let client = &clients[0];
    let me = client.local_player_id().to_string();

    client.join("Ann").await.unwrap();
    seen_by(client, |s| s.player(&me).is_some()).await;

    // The ignored JOIN still commits and broadcasts
    let mut changes = host.subscribe();
    client
        .submit(&Action::Join {
            player_id: me.clone(),
            name: "Ann2".to_string(),
        })
        .await
        .unwrap();
    tokio::time::timeout(WAIT, changes.changed())
        .await
        .unwrap()
        .unwrap();

    let session = host.session().await;
    assert_eq!(session.players.len(), 2);
    assert_eq!(session.player(&me).unwrap().name, "Ann");
}

#[tokio::test]
async fn test_round_three_gate_ignores_popped_balloons() {
    let (host, clients) = table(LoopbackHub::new(), 3).await;
    for client in &clients {
        client.join("Guest").await.unwrap();
    }
    let ids: Vec<String> = clients
        .iter()
        .map(|c| c.local_player_id().to_string())
        .collect();
    seen_by(&clients[2], |s| s.players.len() == 4).await;

    // The host is the spotlight, so only the guests are balloons
    host.command(HostCommand::SetSpotlight {
        player_id: host.local_player_id().to_string(),
    })
    .await
    .unwrap();
    host.command(HostCommand::StartRound1).await.unwrap();
    host.command(HostCommand::StartRound2).await.unwrap();
    seen_by(&clients[0], |s| s.phase == GamePhase::Round2).await;

    clients[0].ask("First?").await.unwrap();
    clients[1].ask("Second?").await.unwrap();
    clients[2].ask("Third?").await.unwrap();
    let session = seen_by(&clients[0], |s| s.questions.len() == 3).await;

    let host_id = host.local_player_id().to_string();
    let ann_q = session.question_from(&ids[0]).unwrap().id.clone();
    host.apply_local(&Action::Answer {
        question_id: ann_q,
        from_player_id: host_id.clone(),
        text: "Yes".to_string(),
    })
    .await;
    clients[1].pop("answer").await.unwrap();
    clients[2].pop("answer").await.unwrap();
    let (p2, p3) = (ids[1].clone(), ids[2].clone());
    seen_by(&clients[0], |s| {
        s.player(&p2).is_some_and(|p| p.is_popped()) && s.player(&p3).is_some_and(|p| p.is_popped())
    })
    .await;

    // Popped balloons' questions stay unanswered and do not block Round 3
    let session = host.session().await;
    assert!(session.answer_for(&session.question_from(&ids[1]).unwrap().id).is_none());
    host.command(HostCommand::StartRound3).await.unwrap();
    assert_eq!(host.session().await.phase, GamePhase::Round3);
}

#[tokio::test]
async fn test_final_choice_ends_game_from_round_two() {
    let (host, clients) = table(LoopbackHub::new(), 1).await;
    let guest = clients[0].local_player_id().to_string();
    clients[0].join("Ann").await.unwrap();
    seen_by(&clients[0], |s| s.player(&guest).is_some()).await;

    let host_id = host.local_player_id().to_string();
    host.command(HostCommand::SetSpotlight {
        player_id: host_id.clone(),
    })
    .await
    .unwrap();
    host.command(HostCommand::StartRound1).await.unwrap();
    host.command(HostCommand::StartRound2).await.unwrap();

    let outcome = host
        .apply_local(&Action::FinalChoice {
            spotlight_id: host_id.clone(),
            balloon_id: guest.clone(),
        })
        .await;
    assert!(outcome.is_applied());

    let results = seen_by(&clients[0], |s| s.phase == GamePhase::Results).await;
    let matched = results.matched.unwrap();
    assert_eq!(matched.spotlight_id, host_id);
    assert_eq!(matched.balloon_id, guest);
}

#[tokio::test]
async fn test_lost_join_is_never_applied() {
    let hub = LoopbackHub::with_loss_rate(1.0);
    let (host, clients) = table(hub, 1).await;
    let me = clients[0].local_player_id().to_string();

    // Submission succeeds locally; nothing confirms or retries it
    clients[0].join("Ann").await.unwrap();

    let seen = clients[0]
        .wait_until(|_| true, Duration::from_millis(100))
        .await;
    assert!(seen.is_none());
    assert_eq!(clients[0].phase().await, GamePhase::NameEntry);

    let session = host.session().await;
    assert!(session.player(&me).is_none());
    assert_eq!(session.players.len(), 1);
}

#[tokio::test]
async fn test_resubmitted_answer_updates_in_place() {
    let (host, clients) = table(LoopbackHub::new(), 2).await;
    for client in &clients {
        client.join("Guest").await.unwrap();
    }
    seen_by(&clients[0], |s| s.players.len() == 3).await;

    let spotlight = clients[0].local_player_id().to_string();
    host.command(HostCommand::SetSpotlight {
        player_id: spotlight,
    })
    .await
    .unwrap();
    host.command(HostCommand::StartRound1).await.unwrap();
    host.command(HostCommand::StartRound2).await.unwrap();

    clients[1].ask("Favourite food?").await.unwrap();
    let session = seen_by(&clients[0], |s| s.questions.len() == 1).await;
    let question_id = session.questions[0].id.clone();

    clients[0].answer(&question_id, "Pizza").await.unwrap();
    clients[0].answer(&question_id, "Sushi").await.unwrap();

    let session = seen_by(&clients[0], |s| {
        s.answer_for(&question_id).is_some_and(|a| a.text == "Sushi")
    })
    .await;
    assert_eq!(session.answers.len(), 1);
}
