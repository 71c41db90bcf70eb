//! Interactive chat session.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio_util::sync::CancellationToken;

use testa_application::SessionContext;
use testa_core::TestaError;
use testa_core::assistant::AssistantService;
use testa_core::session::NormalizedMessage;
use testa_core::token::TokenDecoder;
use testa_infrastructure::{ConfigStorage, FernetTokenDecoder, SecretStorage};
use testa_interaction::OpenAIAssistantsClient;

use crate::render;

const COMMANDS: &[&str] = &["/debug", "/new", "/files", "/prices", "/quit"];
const PREVIEW_LINES: usize = 5;

/// rustyline helper completing and highlighting slash commands.
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

/// Opens the session described by `data` and runs the chat loop, optionally
/// continuing `thread`.
pub async fn run(data: &str, thread: Option<&str>) -> Result<()> {
    let config = ConfigStorage::new()?.load_with_env()?;
    let key = SecretStorage::new()?.resolve_token_key()?;
    let decoder = FernetTokenDecoder::from_base64_key(&key)?;

    let token = match decoder.decode(data) {
        Ok(token) => token,
        Err(e) => return incorrect_token(e),
    };
    let client = OpenAIAssistantsClient::new(token.key.clone()).with_base_url(&config.api_base_url);
    let service: Arc<dyn AssistantService> = Arc::new(client);

    let mut ctx = match SessionContext::open(token, service, &config).await {
        Ok(ctx) => ctx,
        Err(e) if e.is_invalid_token() => return incorrect_token(e),
        Err(e) => return Err(e.into()),
    };
    if let Some(thread_id) = thread {
        ctx.resume(thread_id)
            .await
            .with_context(|| format!("Failed to resume thread {thread_id}"))?;
    }

    print_intro(&ctx);
    if thread.is_some() {
        print_records(&ctx.session().messages);
    }
    let mut shown = ctx.session().messages.len();

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match input {
                    "/quit" | "/exit" => break,
                    "/debug" => println!("{}", ctx.session().debug.to_pretty_json()),
                    "/new" => {
                        ctx.reset_thread();
                        shown = 0;
                        println!("{}", "Started a new conversation.".bright_green());
                    }
                    "/files" => {
                        if interruptible(show_files(&mut ctx), ctrl_c()).await.is_none() {
                            println!("{}", "Interrupted.".yellow());
                        }
                    }
                    "/prices" => show_prices(&ctx),
                    cmd if cmd.starts_with('/') => {
                        println!("{}", format!("Unknown command {cmd}").bright_black());
                    }
                    prompt => {
                        shown = exchange(&mut ctx, prompt, shown).await;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

fn incorrect_token(err: TestaError) -> Result<()> {
    tracing::warn!("[Chat] Rejected token: {}", err);
    eprintln!("{}", "Incorrect token.".red().bold());
    bail!("incorrect token")
}

fn print_intro(ctx: &SessionContext) {
    let session = ctx.session();
    println!("{}", format!("=== {} ===", session.title()).bright_magenta().bold());
    println!("{}", render::header(session));
    for file in ctx.assistant_files() {
        println!("{} {}", "assistant file:".bright_black(), file.filename);
    }
    for file in &session.input_files {
        println!("{} {} ({})", "input file:".bright_black(), file.name, file.id);
    }
    println!(
        "{}",
        format!("Commands: {}. Ctrl-C while waiting cancels the answer.", COMMANDS.join(" "))
            .bright_black()
    );
    println!();
}

/// Resolves on Ctrl-C.
///
/// Once registered, tokio keeps its SIGINT handler installed for the rest
/// of the process, so Ctrl-C stops killing the program. Every long wait
/// outside the line editor has to race against this future itself.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Runs `work` unless `interrupt` resolves first.
async fn interruptible<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = interrupt => None,
        out = work => Some(out),
    }
}

fn print_records(records: &[NormalizedMessage]) {
    for record in records {
        for line in render::message(record) {
            println!("{line}");
        }
    }
}

/// Runs one exchange and prints the records not shown yet.
///
/// Returns the number of records shown after the exchange.
async fn exchange(ctx: &mut SessionContext, prompt: &str, shown: usize) -> usize {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            ctrl_c().await;
            cancel.cancel();
        })
    };
    println!("{}", "Waiting for the assistant...".bright_black());
    let result = ctx.ask(prompt, &cancel).await;
    watcher.abort();

    match result {
        Ok(outcome) => {
            let start = if shown <= outcome.messages.len() { shown } else { 0 };
            print_records(&outcome.messages[start..]);
            if !outcome.is_success() {
                let reason = outcome
                    .last_error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .unwrap_or("no details");
                println!(
                    "{}",
                    format!("The run ended as {}: {}", outcome.status, reason).red()
                );
            }
            println!("{}", render::header(ctx.session()));
            outcome.messages.len()
        }
        Err(TestaError::Cancelled) => {
            println!("{}", "Cancelled.".yellow());
            shown
        }
        Err(e @ TestaError::PollTimeout { .. }) => {
            println!("{}", format!("{e}").yellow());
            shown
        }
        Err(e) => {
            tracing::error!("[Chat] Exchange failed: {}", e);
            println!("{}", "Something went wrong. Please try again.".red());
            shown
        }
    }
}

async fn show_files(ctx: &mut SessionContext) {
    let files = ctx.session().input_files.clone();
    if files.is_empty() {
        println!("{}", "No input files.".bright_black());
        return;
    }
    for file in &files {
        match ctx.load_input_file(file).await {
            Ok(path) => {
                println!("{} -> {}", file.name.bold(), path.display());
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        for line in text.lines().take(PREVIEW_LINES) {
                            println!("  {line}");
                        }
                    }
                    Err(e) => println!("  {}", format!("(not text: {e})").bright_black()),
                }
            }
            Err(e) => {
                tracing::error!("[Chat] Loading {} failed: {}", file.id, e);
                println!("{}", format!("Could not load {}.", file.name).red());
            }
        }
    }
}

fn show_prices(ctx: &SessionContext) {
    match ctx.model_prices() {
        Some(prices) => {
            println!("{}", prices.model.bold());
            println!("  input:  {}", prices.input);
            println!("  output: {}", prices.output);
        }
        None => println!("{}", "No price known for this model.".bright_black()),
    }
}
