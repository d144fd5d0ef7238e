//! Login, logout and session display.

use anyhow::anyhow;
use console::style;

use crate::config::Settings;
use crate::platform::{auth, SessionFile};

/// Log in and save the session.
pub async fn cmd_login(
    settings: &Settings,
    url: Option<String>,
    username: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let url = url
        .or_else(|| settings.platform_url.clone())
        .ok_or_else(|| anyhow!("No platform URL. Pass --url or set platform_url in the config."))?;
    let password =
        password.ok_or_else(|| anyhow!("Password required (--password or DOCUSYNC_PASSWORD)"))?;

    println!("{} Logging in to {}...", style("→").cyan(), url);
    let session = match auth::login(&settings.transport(), &url, username, &password).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    let file = SessionFile::new(&settings.data_dir);
    file.save(&session)?;
    println!(
        "  {} Logged in as {} ({})",
        style("✓").green(),
        style(&session.username).bold(),
        session.base_url
    );
    println!("  Session saved to {}", file.path().display());
    Ok(())
}

/// Forget the saved session.
pub async fn cmd_logout(settings: &Settings) -> anyhow::Result<()> {
    if SessionFile::new(&settings.data_dir).clear()? {
        println!("{} Logged out", style("✓").green());
    } else {
        println!("{} No saved session", style("!").yellow());
    }
    Ok(())
}

/// Show the saved session.
pub async fn cmd_whoami(settings: &Settings) -> anyhow::Result<()> {
    match SessionFile::new(&settings.data_dir).load()? {
        Some(session) => {
            println!("{:<14} {}", "User:", style(&session.username).bold());
            println!("{:<14} {}", "Platform:", session.base_url);
            println!("{:<14} {}", "Organization:", session.organization_id);
            if let Some(relay) = &settings.relay_url {
                println!("{:<14} {}", "Relay:", relay);
            }
        }
        None => println!("{} Not logged in", style("!").yellow()),
    }
    Ok(())
}
