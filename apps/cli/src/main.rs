use std::{path::PathBuf, process::ExitCode, sync::Arc};

mod config;
mod controller;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AuthState, CarField, Credentials, FileTokenStore, HttpApi, Page, RemoteApi, SessionController,
    ViewStateMachine,
};
use shared::domain::ConnectorType;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::load_settings,
    controller::{
        actions::{help_text, parse_action, UiAction},
        orchestration::{dispatch_action, run_action, Flow},
    },
    ui::terminal::render_frame,
};

#[derive(Parser, Debug)]
#[command(name = "car-client", about = "Terminal client for the car registry service")]
struct Args {
    /// Base URL of the car service; overrides car-client.toml and env.
    #[arg(long)]
    api_url: Option<String>,
    /// Directory holding the persisted access token.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and show the dashboard.
    Login { username: String, password: String },
    /// Print the signed-in username.
    Whoami,
    /// List every registered car.
    Cars,
    /// Register a car; numeric fields are validated before sending.
    AddCar {
        #[arg(long)]
        name: String,
        /// May be repeated.
        #[arg(long = "connector")]
        connectors: Vec<ConnectorType>,
        #[arg(long, allow_hyphen_values = true)]
        battery_charge_limit: String,
        #[arg(long, allow_hyphen_values = true)]
        battery_size: String,
        #[arg(long, allow_hyphen_values = true)]
        max_kw_ac: String,
        #[arg(long, allow_hyphen_values = true)]
        max_kw_dc: String,
    },
    /// Forget the stored session.
    Logout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }

    let base_url = settings.api_url()?;
    info!(api = %base_url, data_dir = %settings.data_dir.display(), "starting car client");

    let api: Arc<dyn RemoteApi> = Arc::new(HttpApi::new(base_url));
    let store = Arc::new(FileTokenStore::in_dir(&settings.data_dir));
    let session = Arc::new(SessionController::new(Arc::clone(&api), store));
    let machine = ViewStateMachine::new(session, api);

    match args.command {
        Some(command) => run_once(&machine, command).await,
        None => {
            run_interactive(&machine).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_frame(machine: &ViewStateMachine) {
    println!("{}", render_frame(&machine.frame()));
}

async fn run_once(machine: &Arc<ViewStateMachine>, command: Command) -> Result<ExitCode> {
    match command {
        Command::Login { username, password } => {
            machine.start().await;
            run_action(
                machine,
                UiAction::SubmitLogin(Credentials::new(username, password)),
            )
            .await;
        }
        Command::Whoami => {
            machine.start().await;
            return Ok(match machine.session().user() {
                Some(user) => {
                    println!("{}", user.username);
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("not signed in");
                    ExitCode::FAILURE
                }
            });
        }
        Command::Cars => {
            machine.start().await;
            if machine.session().auth_state() != AuthState::Authenticated {
                print_frame(machine);
                eprintln!("not signed in");
                return Ok(ExitCode::FAILURE);
            }
            run_action(machine, UiAction::Navigate(Page::Cars)).await;
        }
        Command::AddCar {
            name,
            connectors,
            battery_charge_limit,
            battery_size,
            max_kw_ac,
            max_kw_dc,
        } => {
            machine.start().await;
            run_action(machine, UiAction::Navigate(Page::AddCar)).await;
            let fields = [
                (CarField::Name, name),
                (CarField::BatteryChargeLimit, battery_charge_limit),
                (CarField::BatterySize, battery_size),
                (CarField::MaxKwAc, max_kw_ac),
                (CarField::MaxKwDc, max_kw_dc),
            ];
            for (field, value) in fields {
                run_action(machine, UiAction::SetField { field, value }).await;
            }
            for connector in connectors {
                // Repeats must not cancel each other out.
                if !machine
                    .snapshot()
                    .car_form
                    .connector_types
                    .contains(&connector)
                {
                    run_action(machine, UiAction::ToggleConnector(connector)).await;
                }
            }
            run_action(machine, UiAction::SubmitCar).await;
        }
        Command::Logout => {
            run_action(machine, UiAction::Logout).await;
        }
    }

    machine.settle().await;
    print_frame(machine);

    Ok(if machine.snapshot().error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_interactive(machine: &Arc<ViewStateMachine>) -> Result<()> {
    let mut events = machine.subscribe_events();
    let listener = {
        let machine = Arc::clone(machine);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(?event, "view event");
                        print_frame(&machine);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "view events lagged; redrawing");
                        print_frame(&machine);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    machine.start().await;
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_action(&line) {
            Ok(None) => {}
            Ok(Some(action)) => match dispatch_action(machine, action) {
                Flow::Continue => {}
                Flow::Redraw => print_frame(machine),
                Flow::Help => println!("{}", help_text()),
                Flow::Quit => break,
            },
            Err(err) => eprintln!("{err}"),
        }
    }

    listener.abort();
    Ok(())
}
