//! Client against a real quiz server on a loopback listener

use std::net::SocketAddr;
use std::time::Duration;

use quiz_client::{
    ClientConfig, ClientError, ClientEvent, ConnectionState, Gap, QuestionContent, QuizClient,
    ReconnectPolicy,
};
use quiz_server::{Config, QuizStorage, Server, ServerState};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(storage: QuizStorage, addr: SocketAddr) -> Self {
        Self::start_with_capacity(storage, addr, 256).await
    }

    async fn start_with_capacity(
        storage: QuizStorage,
        addr: SocketAddr,
        session_queue_capacity: usize,
    ) -> Self {
        let mut config = Config::with_overrides("/tmp/quiz-e2e-test", addr.port());
        config.ping_interval_ms = 60_000;
        config.session_queue_capacity = session_queue_capacity;
        let state = ServerState::with_storage(config.clone(), storage).unwrap();

        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::with_state(config, state.clone());
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    async fn stop(self) {
        self.state.shutdown.cancel();
        let _ = self.handle.await;
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn wait_for_sessions(&self, n: usize) {
        for _ in 0..200 {
            if self.state.engine.live_sessions() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} live sessions");
    }
}

fn fast_reconnect(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_attempts: Some(max_attempts),
    }
}

async fn wait_for(
    rx: &mut broadcast::Receiver<ClientEvent>,
    mut predicate: impl FnMut(&ClientEvent) -> bool,
) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for client event")
}

async fn wait_for_acks(state: &ServerState, client_id: &str, count: usize) {
    for _ in 0..200 {
        if let Some(record) = state.engine.client_ack(client_id).unwrap()
            && record.acked_seqs.len() == count
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} acks for {client_id}");
}

fn seqs(client: &QuizClient) -> Vec<u64> {
    client.questions().iter().map(|q| q.seq).collect()
}

#[tokio::test]
async fn backlog_then_live_push_are_merged_and_acked() {
    let server = TestServer::start(QuizStorage::open_in_memory().unwrap(), "127.0.0.1:0".parse().unwrap()).await;
    for text in ["Q1", "Q2"] {
        server.state.engine.create_question(QuestionContent::new(text)).unwrap();
    }

    let config = ClientConfig::new(server.base_url(), "e2e-1").with_reconnect(fast_reconnect(3));
    let client = QuizClient::new(config).unwrap();
    let mut events = client.subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    let reconciled = wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;
    assert_eq!(
        reconciled,
        ClientEvent::Reconciled {
            merged: 2,
            last_seq: 2
        }
    );
    assert_eq!(client.state(), ConnectionState::Connected);

    server.wait_for_sessions(1).await;
    let created = client
        .http()
        .create_question(QuestionContent::new("Q3"))
        .await
        .unwrap();
    assert_eq!(created.seq, 3);

    let pushed = wait_for(&mut events, |e| matches!(e, ClientEvent::Question(_))).await;
    assert!(matches!(pushed, ClientEvent::Question(q) if q.seq == 3));

    wait_for_acks(&server.state, "e2e-1", 3).await;
    assert_eq!(seqs(&client), vec![1, 2, 3]);
    assert!(client.gap_warning().is_none());
    assert!(server.state.engine.reconcile("e2e-1", 0).unwrap().is_empty());

    let record = client.http().ack_record().await.unwrap().unwrap();
    assert_eq!(record.high_water_mark, 3);

    client.shutdown();
    assert!(runner.await.unwrap().is_ok());
    server.stop().await;
}

#[tokio::test]
async fn returning_client_receives_only_unacked_items() {
    let storage = QuizStorage::open_in_memory().unwrap();
    let server = TestServer::start(storage, "127.0.0.1:0".parse().unwrap()).await;
    server.state.engine.create_question(QuestionContent::new("Q1")).unwrap();

    // First visit: receives and acks Q1
    {
        let client = QuizClient::new(ClientConfig::new(server.base_url(), "returning")).unwrap();
        let mut events = client.subscribe();
        let runner = tokio::spawn({
            let client = client.clone();
            async move { client.run().await }
        });
        wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;
        wait_for_acks(&server.state, "returning", 1).await;
        client.shutdown();
        runner.await.unwrap().unwrap();
    }
    server.wait_for_sessions(0).await;

    for text in ["Q2", "Q3"] {
        server.state.engine.create_question(QuestionContent::new(text)).unwrap();
    }

    // Fresh process, same client id, no local state
    let client = QuizClient::new(ClientConfig::new(server.base_url(), "returning")).unwrap();
    let mut events = client.subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    let reconciled = wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;
    assert_eq!(
        reconciled,
        ClientEvent::Reconciled {
            merged: 2,
            last_seq: 3
        }
    );
    assert_eq!(seqs(&client), vec![2, 3]);

    client.shutdown();
    runner.await.unwrap().unwrap();
    server.stop().await;
}

#[tokio::test]
async fn reconnects_after_server_restart() {
    let storage = QuizStorage::open_in_memory().unwrap();
    let server = TestServer::start(storage.clone(), "127.0.0.1:0".parse().unwrap()).await;
    let addr = server.addr;
    server.state.engine.create_question(QuestionContent::new("Q1")).unwrap();

    let config = ClientConfig::new(server.base_url(), "restart").with_reconnect(fast_reconnect(100));
    let client = QuizClient::new(config).unwrap();
    let mut events = client.subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;
    wait_for_acks(&server.state, "restart", 1).await;

    server.stop().await;
    wait_for(&mut events, |e| {
        *e == ClientEvent::StateChanged(ConnectionState::Disconnected)
    })
    .await;
    // Previously received items are kept while offline
    assert_eq!(seqs(&client), vec![1]);

    // Same database, same address
    let server = TestServer::start(storage, addr).await;
    server.state.engine.create_question(QuestionContent::new("Q2")).unwrap();

    wait_for(&mut events, |e| {
        *e == ClientEvent::StateChanged(ConnectionState::Connected)
    })
    .await;
    wait_for_acks(&server.state, "restart", 2).await;
    assert_eq!(seqs(&client), vec![1, 2]);

    client.shutdown();
    runner.await.unwrap().unwrap();
    server.stop().await;
}

#[tokio::test]
async fn session_is_registered_before_reconcile() {
    let server = TestServer::start(QuizStorage::open_in_memory().unwrap(), "127.0.0.1:0".parse().unwrap()).await;

    let client = QuizClient::new(ClientConfig::new(server.base_url(), "early")).unwrap();
    let mut events = client.subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    wait_for(&mut events, |e| {
        *e == ClientEvent::StateChanged(ConnectionState::Connected)
    })
    .await;
    // Connected is only entered after the server's ready frame
    assert_eq!(server.state.engine.live_sessions(), 1);

    // Lands between ready and the backlog request: push or backlog, never lost
    server.state.engine.create_question(QuestionContent::new("Q1")).unwrap();

    wait_for_acks(&server.state, "early", 1).await;
    assert_eq!(seqs(&client), vec![1]);

    client.shutdown();
    runner.await.unwrap().unwrap();
    server.stop().await;
}

#[tokio::test]
async fn dropped_push_is_recovered_after_gap() {
    let server = TestServer::start_with_capacity(
        QuizStorage::open_in_memory().unwrap(),
        "127.0.0.1:0".parse().unwrap(),
        1,
    )
    .await;

    let client = QuizClient::new(ClientConfig::new(server.base_url(), "slow")).unwrap();
    let mut events = client.subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });
    wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;

    // Single-threaded runtime: nothing drains the session queue between
    // these calls, so Q1 is queued and Q2, Q3 are dropped.
    for text in ["Q1", "Q2", "Q3"] {
        server.state.engine.create_question(QuestionContent::new(text)).unwrap();
    }
    let first = wait_for(&mut events, |e| matches!(e, ClientEvent::Question(_))).await;
    assert!(matches!(first, ClientEvent::Question(q) if q.seq == 1));

    server.state.engine.create_question(QuestionContent::new("Q4")).unwrap();
    let gap = wait_for(&mut events, |e| matches!(e, ClientEvent::Gap(_))).await;
    assert_eq!(
        gap,
        ClientEvent::Gap(Gap {
            expected: 2,
            received: 4
        })
    );

    let repaired = wait_for(&mut events, |e| matches!(e, ClientEvent::Reconciled { .. })).await;
    assert!(matches!(repaired, ClientEvent::Reconciled { last_seq: 4, .. }));
    assert_eq!(seqs(&client), vec![1, 2, 3, 4]);
    assert_eq!(client.contiguous_seq(), 4);
    assert!(client.gap_warning().is_none());

    wait_for_acks(&server.state, "slow", 4).await;
    assert!(server.state.engine.reconcile("slow", 0).unwrap().is_empty());

    client.shutdown();
    runner.await.unwrap().unwrap();
    server.stop().await;
}

#[tokio::test]
async fn gives_up_after_reconnect_attempts() {
    // Reserve a port, then free it so nothing listens there
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = ClientConfig::new(format!("http://{addr}"), "lonely").with_reconnect(fast_reconnect(2));
    let client = QuizClient::new(config).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), client.run())
        .await
        .expect("run should give up");
    assert!(matches!(result, Err(ClientError::ReconnectExhausted(2))));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
