//! Watch a quiz server and print questions as they arrive
//!
//! ```text
//! QUIZ_SERVER_URL=http://localhost:3001 QUIZ_CLIENT_ID=alice \
//!     cargo run -p quiz-client --example watch
//! ```

use quiz_client::{ClientConfig, ClientEvent, QuizClient};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_client=info".into()),
        )
        .init();

    let config = ClientConfig::from_env();
    println!("Watching {} as {}", config.base_url, config.client_id);

    let client = QuizClient::new(config)?;
    let mut events = client.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::StateChanged(state)) => println!("[{}]", state),
                Ok(ClientEvent::Question(q)) => println!("#{} {}", q.seq, q.content.text),
                Ok(ClientEvent::Gap(gap)) => println!("{}", gap),
                Ok(ClientEvent::Reconciled { merged, last_seq }) => {
                    println!("reconciled {} item(s), last seq {}", merged, last_seq)
                }
                Ok(ClientEvent::Error(message)) => eprintln!("error: {}", message),
                Err(RecvError::Lagged(n)) => eprintln!("skipped {} event(s)", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    let result = tokio::select! {
        joined = &mut runner => joined?,
        _ = tokio::signal::ctrl_c() => {
            client.shutdown();
            runner.await?
        }
    };
    printer.abort();

    println!("Local view:");
    for q in client.questions() {
        println!("  #{:<4} {}", q.seq, q.content.text);
    }
    result.map_err(Into::into)
}
