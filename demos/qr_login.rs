//! QR login demo: start a session, print the QR payload, poll until the phone has scanned it.
//!
//! Run with: `WHATSAPP_API_URL=... WHATSAPP_API_KEY=... cargo run --example qr_login -- <session-id>`

use std::time::Duration;
use whatsapp_gateway::{ClientCredentials, QrSession, SessionId};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let session_id = std::env::args()
        .nth(1)
        .map(SessionId::from)
        .unwrap_or_else(SessionId::generate);
    let creds = ClientCredentials::from_env(None, None)?;
    let session = QrSession::new(session_id, creds);

    println!("Starting session {}...", session.session_id());
    let started = session.start().await?;
    let qr = session.fetch_qr(&started.qr_endpoint).await?;
    println!("Scan this with WhatsApp > Linked Devices:\n{qr}");

    // Polling cadence and the overall deadline are the caller's job.
    let outcome = tokio::time::timeout(LOGIN_TIMEOUT, async {
        loop {
            let status = session.check_status().await?;
            let state = status.state();
            println!("[status] {state}");
            if state.is_terminal() {
                return Ok::<_, whatsapp_gateway::Error>(status);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;

    match outcome {
        Ok(Ok(status)) if status.is_connected() => println!("Connected."),
        Ok(Ok(status)) => println!("Session ended: {}", status.status()),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => println!("Gave up after {}s without a scan.", LOGIN_TIMEOUT.as_secs()),
    }
    Ok(())
}
