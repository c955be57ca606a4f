use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use client_core::{
    ChatController, FileUserStore, Key, PageVariant, Renderer, SendOutcome, TextRenderer,
    Transport, UserStore, WsTransport,
};
use shared::{domain::unix_now, protocol::ServerFrame};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the webchat server")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:4000")]
    server_url: String,
    /// Name to chat as; defaults to the remembered one.
    #[arg(long)]
    user: Option<String>,
    #[arg(long, default_value = "presence")]
    variant: PageVariant,
    /// Where the remembered name is kept.
    #[arg(long)]
    store_path: Option<PathBuf>,
    #[arg(long, default_value = "warn")]
    log_level: String,
}

enum Command {
    Quit,
    Name(String),
    Say(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim() == "/quit" {
        Command::Quit
    } else if let Some(name) = line.strip_prefix("/name ") {
        Command::Name(name.trim().to_string())
    } else {
        Command::Say(line.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(std::io::stderr)
        .init();

    let store = match args.store_path {
        Some(path) => FileUserStore::new(path),
        None => FileUserStore::in_config_dir()?,
    };
    let transport = WsTransport::connect(&args.server_url).await?;
    let mut frames = transport.subscribe();
    let mut controller =
        ChatController::new(transport, TextRenderer::local(), store, args.variant);
    if let Some(user) = args.user {
        controller.page_mut().user = user;
    }
    info!(variant = %controller.variant(), user = %controller.page().user, "chat client ready");
    if controller.page().user.is_empty() {
        eprintln!("Set your name with /name <name>, then type messages. /quit exits.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Command::Quit => break,
                    Command::Name(name) => controller.page_mut().user = name,
                    Command::Say(text) => {
                        controller.page_mut().message = text;
                        if controller.key_press(Key::Enter, unix_now()).await?
                            == Some(SendOutcome::Rejected)
                        {
                            if let Some(alert) = controller.page().alerts().last() {
                                eprintln!("{alert}");
                            }
                        }
                    }
                }
            }
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    controller.handle(&frame);
                    print_updates(&controller, &frame, &mut printed);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped server frames"),
                Err(RecvError::Closed) => {
                    eprintln!("connection closed by server");
                    return Ok(());
                }
            },
        }
    }

    controller.leave().await?;
    controller.transport_mut().close().await?;
    Ok(())
}

fn print_updates<T, R, S>(
    controller: &ChatController<T, R, S>,
    frame: &ServerFrame,
    printed: &mut usize,
) where
    T: Transport,
    R: Renderer,
    S: UserStore,
{
    let page = controller.page();
    for entry in &page.output()[*printed..] {
        println!("{entry}");
    }
    *printed = page.output().len();

    match frame {
        ServerFrame::Typing(_) if !page.feedback.is_empty() => eprintln!("{}", page.feedback),
        ServerFrame::Participant(_) => {
            if let Some(title) = page.title() {
                eprintln!("-- {title} --");
            }
        }
        _ => {}
    }
}
