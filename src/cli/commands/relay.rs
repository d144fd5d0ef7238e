//! Local relay command.

use console::style;

use crate::config::Settings;

/// Start the forwarding relay.
pub async fn cmd_relay(settings: &Settings, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.relay_host.clone());
    let port = port.unwrap_or(settings.relay_port);

    println!(
        "{} Starting relay at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Requests must carry an X-Target-URL header");
    println!("  Press Ctrl+C to stop");

    crate::relay::serve(&host, port).await
}
