use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::{Color, Colorize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use facet_application::{ChatSession, ConversationService, PersonaService, SendOutcome, SkipReason};
use facet_core::persona::PersonaDraft;
use facet_core::registry;
use facet_infrastructure::{ConfigService, JsonConversationRepository, JsonPersonaRepository};
use facet_interaction::HttpChatDispatcher;

const COMMANDS: &[&str] = &[
    "/new",
    "/list",
    "/switch",
    "/delete",
    "/rename",
    "/provider",
    "/model",
    "/gems",
    "/gem",
    "/gem-new",
    "/gem-edit",
    "/gem-delete",
    "/gem-off",
    "/help",
    "/quit",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
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

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn provider_color(token: &str) -> Color {
    match token {
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        _ => Color::White,
    }
}

/// Builds the prompt from the active selections, e.g. `OpenAI/gpt-4o 💎 >> `.
async fn prompt_for(session: &ChatSession) -> String {
    let context = session.context().await;
    let (provider_name, _) = registry::display_names(&context.provider_id, &context.model_id);
    let color = registry::provider(&context.provider_id)
        .map(|p| provider_color(p.color))
        .unwrap_or(Color::White);

    let gem = match session.active_persona().await {
        Some(persona) => format!(" {}", persona.emoji),
        None => String::new(),
    };

    format!(
        "{}/{}{} >> ",
        provider_name.color(color),
        context.model_id,
        gem
    )
}

fn print_help() {
    println!("{}", "Conversations:".bright_magenta());
    println!("  /new               start a new conversation");
    println!("  /list              list conversations, most recent first");
    println!("  /switch <n>        switch to conversation n from /list");
    println!("  /rename <n> <t>    rename conversation n");
    println!("  /delete <n>        delete conversation n");
    println!("{}", "Providers:".bright_magenta());
    println!("  /provider [id]     list providers or select one");
    println!("  /model [id]        list models of the provider or select one");
    println!("{}", "Gems:".bright_magenta());
    println!("  /gems              list gems");
    println!("  /gem <n>           activate gem n from /gems");
    println!("  /gem-new           create a gem");
    println!("  /gem-edit <n>      edit gem n");
    println!("  /gem-delete <n>    delete gem n");
    println!("  /gem-off           deactivate the active gem");
    println!("{}", "Anything else is sent as a chat message.".bright_black());
}

async fn list_conversations(session: &ChatSession) {
    let active_id = session.context().await.conversation_id;
    for (index, conversation) in session.conversations().await.iter().enumerate() {
        let (provider_name, model_name) =
            registry::display_names(&conversation.provider, &conversation.model);
        let marker = if conversation.id == active_id { "*" } else { " " };
        println!(
            "{} {:>2}. {}  {}",
            marker,
            index + 1,
            conversation.title,
            format!("[{} · {} · {} messages]", provider_name, model_name, conversation.messages.len())
                .bright_black()
        );
    }
}

async fn list_gems(session: &ChatSession) {
    let gems = session.personas().await;
    if gems.is_empty() {
        println!("{}", "No gems yet. Create one with /gem-new.".bright_black());
        return;
    }
    let active = session.context().await.persona_id;
    for (index, gem) in gems.iter().enumerate() {
        let marker = if active.as_deref() == Some(gem.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:>2}. {} {}", marker, index + 1, gem.emoji, gem.name);
    }
}

/// Resolves a 1-based index argument against a list length.
fn parse_index(arg: &str, len: usize) -> Option<usize> {
    let n: usize = arg.trim().parse().ok()?;
    if n >= 1 && n <= len { Some(n - 1) } else { None }
}

fn read_line(rl: &mut Editor<CliHelper, rustyline::history::DefaultHistory>, prompt: &str) -> Option<String> {
    match rl.readline(prompt) {
        Ok(line) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

/// Prompts for the gem fields, pre-filled from `existing` when editing.
fn edit_gem_draft(
    rl: &mut Editor<CliHelper, rustyline::history::DefaultHistory>,
    existing: Option<&facet_core::persona::Persona>,
) -> Option<PersonaDraft> {
    let show = |label: &str, current: &str| {
        if current.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{current}]: ")
        }
    };

    let current_name = existing.map(|p| p.name.as_str()).unwrap_or("");
    let name = read_line(rl, &show("Name", current_name))?;
    let name = if name.is_empty() { current_name.to_string() } else { name };

    let current_emoji = existing.map(|p| p.emoji.as_str()).unwrap_or("");
    let emoji = read_line(rl, &show("Emoji", current_emoji))?;
    let emoji = if emoji.is_empty() { current_emoji.to_string() } else { emoji };

    let current_prompt = existing.map(|p| p.prompt.as_str()).unwrap_or("");
    let prompt = read_line(rl, &show("Prompt", current_prompt))?;
    let prompt = if prompt.is_empty() { current_prompt.to_string() } else { prompt };

    let current_context = existing.map(|p| p.context.as_str()).unwrap_or("");
    let context = read_line(rl, &show("Context (optional)", current_context))?;
    let context = if context.is_empty() { current_context.to_string() } else { context };

    Some(PersonaDraft {
        id: existing.map(|p| p.id.clone()),
        name,
        emoji,
        prompt,
        context,
    })
}

fn confirm(rl: &mut Editor<CliHelper, rustyline::history::DefaultHistory>, question: &str) -> bool {
    matches!(
        read_line(rl, &format!("{question} (y/n) ")).as_deref(),
        Some("y") | Some("yes")
    )
}

async fn handle_command(
    session: &ChatSession,
    rl: &mut Editor<CliHelper, rustyline::history::DefaultHistory>,
    command: &str,
    arg: &str,
) -> Result<()> {
    match command {
        "/help" => print_help(),
        "/new" => {
            session.new_conversation().await?;
            println!("{}", "Started a new conversation.".green());
        }
        "/list" => list_conversations(session).await,
        "/switch" => {
            let conversations = session.conversations().await;
            match parse_index(arg, conversations.len()) {
                Some(index) => {
                    let conversation = session.load_conversation(&conversations[index].id).await?;
                    println!("{}", format!("Switched to '{}'.", conversation.title).green());
                    for message in &conversation.messages {
                        print_message(message);
                    }
                }
                None => println!("{}", "Usage: /switch <n> (see /list)".yellow()),
            }
        }
        "/rename" => {
            let conversations = session.conversations().await;
            let mut parts = arg.splitn(2, ' ');
            let index = parts.next().unwrap_or("");
            let title = parts.next().unwrap_or("").trim();
            match (parse_index(index, conversations.len()), title.is_empty()) {
                (Some(index), false) => {
                    session.rename_conversation(&conversations[index].id, title).await?;
                    println!("{}", "Renamed.".green());
                }
                _ => println!("{}", "Usage: /rename <n> <title>".yellow()),
            }
        }
        "/delete" => {
            let conversations = session.conversations().await;
            match parse_index(arg, conversations.len()) {
                Some(index) => {
                    let target = &conversations[index];
                    if confirm(rl, &format!("Delete '{}'?", target.title)) {
                        session.delete_conversation(&target.id).await?;
                        println!("{}", "Deleted.".green());
                    }
                }
                None => println!("{}", "Usage: /delete <n> (see /list)".yellow()),
            }
        }
        "/provider" => {
            if arg.is_empty() {
                let current = session.context().await.provider_id;
                for provider in registry::providers() {
                    let marker = if provider.id == current { "*" } else { " " };
                    println!(
                        "{} {}  {}",
                        marker,
                        provider.name.color(provider_color(provider.color)),
                        format!("({})", provider.id).bright_black()
                    );
                }
            } else {
                session.select_provider(arg).await?;
                let context = session.context().await;
                println!(
                    "{}",
                    format!("Provider set to {} (model reset to {}).", arg, context.model_id).green()
                );
            }
        }
        "/model" => {
            let context = session.context().await;
            let provider = registry::provider(&context.provider_id)?;
            if arg.is_empty() {
                for model in provider.models {
                    let marker = if model.id == context.model_id { "*" } else { " " };
                    println!(
                        "{} {}  {}",
                        marker,
                        model.name,
                        format!("({})", model.id).bright_black()
                    );
                }
            } else {
                session.select_model(arg).await?;
                println!("{}", format!("Model set to {arg}.").green());
            }
        }
        "/gems" => list_gems(session).await,
        "/gem" => {
            let gems = session.personas().await;
            match parse_index(arg, gems.len()) {
                Some(index) => {
                    session.activate_persona(&gems[index].id).await?;
                    println!(
                        "{}",
                        format!("{} {} is now active.", gems[index].emoji, gems[index].name).green()
                    );
                }
                None => println!("{}", "Usage: /gem <n> (see /gems)".yellow()),
            }
        }
        "/gem-off" => {
            session.deactivate_persona().await;
            println!("{}", "Gem deactivated.".green());
        }
        "/gem-new" => match edit_gem_draft(rl, None) {
            Some(draft) => match session.save_persona(draft).await {
                Ok(gem) => println!("{}", format!("Created {} {}.", gem.emoji, gem.name).green()),
                Err(err) => println!("{}", format!("Not saved: {err}").red()),
            },
            None => println!("{}", "Cancelled.".bright_black()),
        },
        "/gem-edit" => {
            let gems = session.personas().await;
            match parse_index(arg, gems.len()) {
                Some(index) => match edit_gem_draft(rl, Some(&gems[index])) {
                    Some(draft) => match session.save_persona(draft).await {
                        Ok(gem) => println!("{}", format!("Saved {} {}.", gem.emoji, gem.name).green()),
                        Err(err) => println!("{}", format!("Not saved: {err}").red()),
                    },
                    None => println!("{}", "Cancelled.".bright_black()),
                },
                None => println!("{}", "Usage: /gem-edit <n> (see /gems)".yellow()),
            }
        }
        "/gem-delete" => {
            let gems = session.personas().await;
            match parse_index(arg, gems.len()) {
                Some(index) => {
                    let target = &gems[index];
                    if confirm(rl, &format!("Delete {} {}?", target.emoji, target.name)) {
                        session.delete_persona(&target.id).await?;
                        println!("{}", "Deleted.".green());
                    }
                }
                None => println!("{}", "Usage: /gem-delete <n> (see /gems)".yellow()),
            }
        }
        _ => println!("{}", "Unknown command. Try /help.".bright_black()),
    }
    Ok(())
}

fn print_message(message: &facet_core::conversation::ConversationMessage) {
    use facet_core::conversation::MessageRole;
    match message.role {
        MessageRole::User => println!("{}", format!("> {}", message.content).green()),
        MessageRole::Assistant => {
            if let (Some(provider), Some(model)) = (&message.provider_name, &message.model_name) {
                println!("{}", format!("[{provider} · {model}]").bright_magenta());
            }
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
        }
        MessageRole::System => println!("{}", message.content.bright_black()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ===== Backend Initialization =====
    let config = ConfigService::new()?.get_config().await;
    let personas = Arc::new(
        PersonaService::load(Arc::new(JsonPersonaRepository::new()?)).await?,
    );
    let conversations = Arc::new(
        ConversationService::load(Arc::new(JsonConversationRepository::new()?)).await?,
    );
    let dispatcher = Arc::new(HttpChatDispatcher::new(config.endpoint.clone()));

    // A configured provider outside the catalog falls back to the default.
    let initial_provider = config
        .provider
        .as_deref()
        .filter(|id| registry::provider(id).is_ok());
    if config.provider.is_some() && initial_provider.is_none() {
        tracing::warn!(
            "Configured provider {:?} is not in the catalog, using the default",
            config.provider
        );
    }

    let session = ChatSession::start(personas, conversations, dispatcher, initial_provider).await?;

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, rustyline::history::DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== facet ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Endpoint: {}", config.endpoint).bright_black()
    );
    println!("{}", "Type /help for commands, or just start chatting.".bright_black());
    println!();

    // ===== Main REPL Loop =====
    loop {
        let prompt = prompt_for(&session).await;
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "/quit" || trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    let mut parts = trimmed.splitn(2, ' ');
                    let command = parts.next().unwrap_or("");
                    let arg = parts.next().unwrap_or("").trim();
                    if let Err(err) = handle_command(&session, &mut rl, command, arg).await {
                        eprintln!("{}", format!("Error: {err}").red());
                    }
                    continue;
                }

                match session.send(trimmed).await {
                    Ok(SendOutcome::Reply(message)) => print_message(&message),
                    Ok(SendOutcome::Failed(text)) => {
                        eprintln!("{}", format!("Error: {text}").red());
                    }
                    Ok(SendOutcome::Skipped(SkipReason::Busy)) => {
                        println!("{}", "A request is already in flight.".yellow());
                    }
                    Ok(SendOutcome::Skipped(SkipReason::EmptyInput)) => {}
                    Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
