use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::info;
use sshbook_core::connections::ssh::{HostKeyPolicy, SshConnection};
use sshbook_core::connections::Connection;
use sshbook_core::{run_relay, Session};
use sshbook_storage::{NewProfile, ProfileStore, ServerProfile, StoreError};
use tokio::io::BufReader;

use crate::ui::prompt;

/// The schema carries no port column; sessions always go to the default
/// SSH port.
const SSH_PORT: u16 = 22;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sshbook",
    version,
    about = "Store labeled SSH servers and open interactive sessions by label"
)]
pub struct Args {
    /// Add a new server profile (prompts for IP, username, password, label)
    #[arg(short = 'n', long = "new")]
    pub new: bool,

    /// Open a session to the server stored under LABEL
    #[arg(short = 'c', long = "connect", value_name = "LABEL")]
    pub connect: Option<String>,

    /// List all stored server profiles
    #[arg(short = 'l', long = "list")]
    pub list: bool,
}

pub async fn run_cli(args: Args) -> anyhow::Result<()> {
    let store = open_store()?;

    if args.new {
        run_new(&store)
    } else if let Some(label) = args.connect {
        run_connect(&store, &label).await
    } else if args.list {
        run_list(&store)
    } else {
        Args::command().print_help().context("printing help")?;
        Ok(())
    }
}

fn open_store() -> anyhow::Result<ProfileStore> {
    let path = ProfileStore::default_path()?;
    ProfileStore::open(&path)
        .with_context(|| format!("opening profile store at {}", path.display()))
}

fn run_new(store: &ProfileStore) -> anyhow::Result<()> {
    let ip = prompt::read_line("Server IP address: ")?;
    let username = prompt::read_line("Username: ")?;
    let password = prompt::read_password("Password: ")?;
    let label = prompt::read_line("Label: ")?;

    match store.add_profile(NewProfile {
        ip,
        username,
        password,
        label,
    }) {
        Ok(profile) => {
            println!("Added server profile '{}'", profile.label);
            Ok(())
        }
        Err(StoreError::DuplicateLabel(label)) => {
            println!("Error: label '{}' is already in use", label);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_list(store: &ProfileStore) -> anyhow::Result<()> {
    let profiles = store.list_all()?;
    if profiles.is_empty() {
        println!("No stored server profiles");
        return Ok(());
    }

    println!("\nStored server profiles:");
    println!("{}", "-".repeat(50));
    println!("{:<15}{:<15}{:<20}", "label", "username", "host");
    println!("{}", "-".repeat(50));
    for profile in &profiles {
        println!(
            "{:<15}{:<15}{:<20}",
            profile.label, profile.username, profile.ip
        );
    }
    println!("{}", "-".repeat(50));
    Ok(())
}

/// Resolve the label and drive an interactive session over an SSH
/// connection. Unknown labels and connection failures are reported to the
/// user and are not fatal.
async fn run_connect(store: &ProfileStore, label: &str) -> anyhow::Result<()> {
    run_connect_with(store, label, |profile| {
        Box::new(SshConnection::new(
            profile.ip.clone(),
            SSH_PORT,
            profile.username.clone(),
            profile.password.clone(),
            HostKeyPolicy::default(),
        ))
    })
    .await
}

/// `run_connect` with the connection construction injected. The builder only
/// runs once the label resolved, so an unknown label never touches the SSH
/// client.
async fn run_connect_with<F>(
    store: &ProfileStore,
    label: &str,
    make_connection: F,
) -> anyhow::Result<()>
where
    F: FnOnce(&ServerProfile) -> Box<dyn Connection + Send + Unpin>,
{
    let profile = match store.find_by_label(label) {
        Ok(profile) => profile,
        Err(StoreError::NotFound(_)) => {
            println!("No server profile with label '{}'", label);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "Connecting to {}:{} as user {}",
        profile.ip, SSH_PORT, profile.username
    );
    let conn = make_connection(&profile);

    let session = match Session::open(conn).await {
        Ok(session) => session,
        Err(e) => {
            println!("Connection failed: {}", e);
            return Ok(());
        }
    };

    println!(
        "Connected to {} ({}). Type 'exit' to end the session.",
        profile.ip, label
    );

    let input = BufReader::new(tokio::io::stdin());
    run_relay(session, input, tokio::io::stdout()).await?;

    println!("Connection closed");
    Ok(())
}
