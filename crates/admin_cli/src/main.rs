use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
};
use engine::{Currency, Engine, NewRoom, RoomKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "roomledger_admin")]
#[command(about = "Admin utilities for Roomledger (bootstrap users/rooms)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./roomledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Room(Room),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Room {
    #[command(subcommand)]
    command: RoomCommand,
}

#[derive(Subcommand, Debug)]
enum RoomCommand {
    /// Create a room owned by an existing user and print its invite code
    Create(RoomCreateArgs),
    /// Print balances and suggested transfers of a room
    Summary(RoomSummaryArgs),
}

#[derive(Args, Debug)]
struct RoomCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "general")]
    kind: String,
    #[arg(long, default_value = "MAD")]
    currency: String,
}

#[derive(Args, Debug)]
struct RoomSummaryArgs {
    #[arg(long)]
    room: String,
    /// Member whose access is used to read the room
    #[arg(long = "as")]
    member: String,
}

const MIN_PASSWORD_LEN: usize = 6;

/// Disables raw mode again when dropped, even on early return.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads one line from the terminal without echoing it.
fn read_secret(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut err = std::io::stderr();
    execute!(err, Print(prompt))?;
    let _raw = RawMode::enable()?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(err, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) => secret.push(ch),
            _ => {}
        }
    }
    execute!(err, Print("\r\n"))?;
    err.flush()?;
    Ok(secret)
}

fn check_new_password(first: String, confirm: &str) -> Result<String, String> {
    if first.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if first != confirm {
        return Err("passwords do not match".to_string());
    }
    Ok(first)
}

fn prompt_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    let first = read_secret("Password: ")?;
    let confirm = read_secret("Confirm password: ")?;
    Ok(check_new_password(first, &confirm)?)
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_new_password()?;
            engine.register_user(&args.username, &password).await?;
            println!("created user: {}", args.username);
        }
        Command::Room(Room {
            command: RoomCommand::Create(args),
        }) => {
            let kind = RoomKind::try_from(args.kind.as_str())?;
            let currency = Currency::parse(&args.currency)?;
            let room = engine
                .create_room(
                    NewRoom {
                        name: args.name,
                        kind: Some(kind),
                        currency: Some(currency),
                        ..Default::default()
                    },
                    &args.owner,
                )
                .await?;
            println!(
                "created room: {} ({}), invite code {}",
                room.name, room.id, room.invite_code
            );
        }
        Command::Room(Room {
            command: RoomCommand::Summary(args),
        }) => {
            let summary = engine.room_summary(&args.room, &args.member).await?;
            println!(
                "total spent: {} {}",
                summary.total_spent, summary.currency
            );
            for (member, balance) in summary.balances.iter() {
                println!("  {member}: {balance}");
            }
            if summary.transfers.is_empty() {
                println!("all settled up");
            }
            for transfer in &summary.transfers {
                println!(
                    "  {} -> {}: {}",
                    transfer.from, transfer.to, transfer.amount
                );
            }
        }
    }

    Ok(())
}
