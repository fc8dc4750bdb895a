//! blogctl - Main CLI Entry Point

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use blogctl::api::{image_url, BlogManagerClient};
use blogctl::cli::input::{is_exit_command, HISTORY_FILE};
use blogctl::cli::{
    Args, BlogCommand, ChatRenderer, Commands, Display, ImageCommand, InputHandler, LlmCommand,
    MetaArgs, SystemCommand, Verbosity,
};
use blogctl::config::Config;
use blogctl::doctor::Doctor;
use blogctl::guard::{before_each, Navigation, Route};
use blogctl::search::{search, BlogQuery};
use blogctl::streaming::{StreamFailure, StreamHandle, StreamOutcome};
use blogctl::types::{BlogKey, BlogListItem, BlogMeta, LlmType, LoginRequest, RegisterRequest};
use blogctl::{frontmatter, telemetry, AuthStore, ClientError, SessionStore};

/// Everything a command handler needs
struct App {
    config: Config,
    config_error: Option<String>,
    client: BlogManagerClient,
    auth: AuthStore,
    display: Display,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_error) = match Config::load(args.config.as_deref()) {
        Ok(config) => (config, None),
        // doctor reports a broken config instead of refusing to start
        Err(e) if matches!(args.command, Commands::Doctor) => (Config::default(), Some(e.to_string())),
        Err(e) => return Err(e.into()),
    };
    if let Some(server) = &args.server {
        config.server.base_url = server.clone();
    }
    if let Some(timeout) = args.timeout {
        config.server.timeout_secs = timeout;
    }

    let verbosity = if args.verbosity_is_default() {
        Verbosity::from_name(&config.display.default_verbosity).unwrap_or(Verbosity::Normal)
    } else {
        args.verbosity()
    };
    let color = config.display.color_output && !args.no_color;
    telemetry::init(verbosity, color);
    let display = Display::new(verbosity, color);

    let session = SessionStore::new(config.state_dir());
    let client = BlogManagerClient::new(&config.server.base_url, config.timeout(), session.clone())?;
    let mut ctx = App {
        config,
        config_error,
        client,
        auth: AuthStore::new(session),
        display,
    };

    if let Some(route) = args.command.route() {
        match before_each(&route, &mut ctx.auth) {
            Navigation::Proceed => {}
            Navigation::Redirect(Route::Login) => {
                display.error(&format!(
                    "{} requires a login. Please log in first (blogctl login)",
                    route
                ));
                std::process::exit(2);
            }
            Navigation::Redirect(target) => {
                display.info(&format!(
                    "Already logged in as {}; redirected to {}",
                    ctx.auth.user().map(|u| u.username.as_str()).unwrap_or("?"),
                    target
                ));
                return Ok(());
            }
        }
    }

    if let Err(e) = run(&args.command, &mut ctx).await {
        match e.downcast_ref::<ClientError>() {
            Some(ClientError::Unauthorized) => {
                display.error("Session expired. Please log in again (blogctl login)")
            }
            Some(ClientError::NotAuthenticated) => {
                display.error("Not logged in. Please log in first (blogctl login)")
            }
            _ => display.error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: &Commands, ctx: &mut App) -> Result<()> {
    match command {
        Commands::Login { username, password } => login(ctx, username, password.as_deref()).await,
        Commands::Register {
            username,
            email,
            password,
        } => register(ctx, username, email, password.as_deref()).await,
        Commands::Logout => {
            ctx.auth.init_auth();
            ctx.auth.logout()?;
            ctx.display.success("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            ctx.auth.init_auth();
            match ctx.auth.user() {
                Some(user) => ctx.display.user(user),
                None => ctx.display.info("Not logged in"),
            }
            Ok(())
        }
        Commands::Blog(cmd) => run_blog(cmd, ctx).await,
        Commands::Image(cmd) => run_image(cmd, ctx).await,
        Commands::Config(cmd) => run_system(cmd, ctx).await,
        Commands::Llm(cmd) => run_llm(cmd, ctx).await,
        Commands::Doctor => run_doctor(ctx).await,
        Commands::Settings { init } => show_settings(ctx, *init),
    }
}

async fn login(ctx: &mut App, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt("Password: ")?,
    };
    let credentials = LoginRequest {
        username: username.to_string(),
        password,
    };

    let spinner = ctx.display.spinner("Logging in...");
    let result = ctx.auth.login(&ctx.client.auth(), &credentials).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let response = result?;
    ctx.display
        .success(&format!("Logged in as {}", response.username));
    Ok(())
}

async fn register(
    ctx: &mut App,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt("Password: ")?,
    };
    let request = RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password,
    };

    let response = ctx.auth.register(&ctx.client.auth(), &request).await?;
    ctx.display.success(&response.message);
    ctx.display.info("Log in with `blogctl login`");
    Ok(())
}

async fn run_blog(cmd: &BlogCommand, ctx: &mut App) -> Result<()> {
    let blogs = ctx.client.blogs();
    match cmd {
        BlogCommand::List => {
            let list = blogs.list_blogs().await?;
            ctx.display.blog_table(&list);
        }
        BlogCommand::Show { id } => {
            let (_, key) = locate(ctx, *id).await?;
            let detail = blogs
                .get_blog_detail(&key)
                .await?
                .ok_or_else(|| anyhow!("post {} has no content on the backend", key))?;
            ctx.display.blog_detail(&detail);
        }
        BlogCommand::New { meta, from_file } => {
            let draft = match from_file {
                Some(path) => {
                    let source = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    Some(frontmatter::parse(&source)?)
                }
                None => None,
            };

            let mut new_meta = draft.as_ref().map(|d| d.meta()).unwrap_or_default();
            merge_meta(&mut new_meta, meta, !meta.tags.is_empty());
            if new_meta.title.trim().is_empty() {
                bail!("a title is required (--title or `title:` in the draft)");
            }

            let outcome = blogs.add_blog(&new_meta).await?;
            let filename = outcome.filename.unwrap_or_default();
            ctx.display
                .success(&format!("Created \"{}\" ({})", new_meta.title, filename));

            if let Some(draft) = draft.filter(|d| !d.content.is_empty()) {
                let created = blogs
                    .list_blogs()
                    .await?
                    .into_iter()
                    .find(|b| b.filename == filename)
                    .ok_or_else(|| anyhow!("new post {} not found in the list", filename))?;
                let key = BlogKey::from_item(&created)?;
                blogs.update_blog_content(&key, &draft.content).await?;
                ctx.display.success("Uploaded draft body");
            }
        }
        BlogCommand::EditInfo {
            id,
            meta,
            clear_tags,
        } => {
            let (item, key) = locate(ctx, *id).await?;
            let mut updated = BlogMeta::from_item(&item);
            merge_meta(&mut updated, meta, *clear_tags);
            blogs.update_blog_info(&key, &updated).await?;
            ctx.display.success(&format!("Updated \"{}\"", updated.title));
        }
        BlogCommand::EditContent { id, file } => {
            let (item, key) = locate(ctx, *id).await?;
            let body = read_body(file)?;
            blogs.update_blog_content(&key, &body).await?;
            ctx.display
                .success(&format!("Saved content of \"{}\"", item.title));
        }
        BlogCommand::Delete { id, yes } => {
            let (item, key) = locate(ctx, *id).await?;
            if !*yes && !confirm(&format!("Delete \"{}\"? [y/N] ", item.title))? {
                ctx.display.info("Cancelled");
                return Ok(());
            }
            blogs.delete_blog(&key).await?;
            ctx.display.success(&format!("Deleted \"{}\"", item.title));
        }
        BlogCommand::Search {
            keyword,
            category,
            tag,
        } => {
            let query = BlogQuery {
                keyword: keyword.clone(),
                category: category.clone(),
                tag: tag.clone(),
            };
            let list = blogs.list_blogs().await?;
            let hits: Vec<BlogListItem> = search(&list, &query).into_iter().cloned().collect();
            ctx.display.blog_table(&hits);
        }
    }
    Ok(())
}

/// Resolve a post id to its list entry and backend address
async fn locate(ctx: &App, id: i64) -> Result<(BlogListItem, BlogKey)> {
    let item = ctx
        .client
        .blogs()
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow!("no post with id {}", id))?;
    let key = BlogKey::from_item(&item)?;
    Ok((item, key))
}

/// Overlay flags on existing metadata; `replace_tags` drops the old tags first
fn merge_meta(base: &mut BlogMeta, flags: &MetaArgs, replace_tags: bool) {
    if let Some(title) = &flags.title {
        base.title = title.clone();
    }
    if let Some(categories) = &flags.categories {
        base.categories = categories.clone();
    }
    if let Some(saying) = &flags.saying {
        base.saying = saying.clone();
    }
    if replace_tags {
        base.tags.clear();
    }
    for tag in &flags.tags {
        if !base.tags.contains(tag) {
            base.tags.push(tag.clone());
        }
    }
}

fn read_body(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

async fn run_image(cmd: &ImageCommand, ctx: &mut App) -> Result<()> {
    let images = ctx.client.images();
    match cmd {
        ImageCommand::Upload { file, path } => {
            let spinner = ctx.display.spinner("Uploading image...");
            let result = images.upload_image(file, path).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let result = result?;
            if !result.success {
                bail!(result.message);
            }
            ctx.display.upload_result(&result);
        }
        ImageCommand::Get {
            relative_path,
            output,
        } => {
            let bytes = images
                .get_image(relative_path)
                .await?
                .ok_or_else(|| anyhow!("image not found: {}", relative_path))?;
            let target = output
                .clone()
                .unwrap_or_else(|| default_image_target(relative_path));
            std::fs::write(&target, &bytes)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            ctx.display.success(&format!(
                "Saved {} bytes to {}",
                bytes.len(),
                target.display()
            ));
        }
        ImageCommand::Url { relative_path } => {
            println!("{}{}", ctx.client.api().base_url(), image_url(relative_path));
        }
    }
    Ok(())
}

fn default_image_target(relative_path: &str) -> PathBuf {
    let name = relative_path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("image");
    PathBuf::from(name)
}

async fn run_system(cmd: &SystemCommand, ctx: &mut App) -> Result<()> {
    let system = ctx.client.system();
    match cmd {
        SystemCommand::Get => {
            let config = system.get_config().await?;
            ctx.display.system_config(&config);
        }
        SystemCommand::Set { assignments } => {
            let mut config = system.get_config().await?;
            for assignment in assignments {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", assignment))?;
                config.set_field(key.trim(), value.trim())?;
            }
            if !system.update_config(&config).await? {
                bail!("the backend did not accept the settings");
            }
            ctx.display.success("Settings saved");
        }
    }
    Ok(())
}

async fn run_llm(cmd: &LlmCommand, ctx: &mut App) -> Result<()> {
    let llm = ctx.client.llm();
    match cmd {
        LlmCommand::Get => {
            let current = llm.current_llm_type().await?;
            let current = current.trim().trim_matches('"');
            if current.is_empty() || current == "null" {
                ctx.display.info("No LLM selected");
            } else {
                println!("{}", current);
            }
        }
        LlmCommand::Set { llm_type } => {
            let kind: LlmType = match llm_type {
                Some(name) => name.parse()?,
                None => ctx
                    .config
                    .default_llm_type()
                    .ok_or_else(|| anyhow!("no LLM type given and no llm.default_type configured"))?,
            };
            llm.set_llm_type(kind).await?;
            ctx.display.success(&format!("LLM switched to {}", kind));
        }
        LlmCommand::Suggest { text, stream } => {
            if *stream {
                let handle = llm.stream_suggestion(text, ChatRenderer::new());
                if !finish_stream(handle).await {
                    std::process::exit(1);
                }
            } else {
                let spinner = ctx.display.spinner("Thinking...");
                let reply = llm.get_suggestion(text).await;
                if let Some(pb) = spinner {
                    pb.finish_and_clear();
                }
                println!("{}", reply?);
            }
        }
        LlmCommand::Ask { text } => {
            let spinner = ctx.display.spinner("Thinking...");
            let reply = llm.chat(text).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            println!("{}", reply?);
        }
        LlmCommand::Chat { message: Some(text) } => {
            if !finish_stream(llm.stream_chat(text, ChatRenderer::new())).await {
                std::process::exit(1);
            }
        }
        LlmCommand::Chat { message: None } => chat_loop(ctx).await?,
    }
    Ok(())
}

/// Interactive chat: every line is streamed, `/exit` quits
async fn chat_loop(ctx: &mut App) -> Result<()> {
    let llm = ctx.client.llm();
    let mut input = InputHandler::with_history(ctx.config.state_dir().join(HISTORY_FILE))?;
    ctx.display
        .info("Chatting with the writing assistant. Type /exit to quit.");

    while let Some(line) = input.read_line()? {
        if line.is_empty() {
            continue;
        }
        if is_exit_command(&line) {
            break;
        }

        let handle = llm.stream_chat(&line, ChatRenderer::new());
        let outcome = wait_stream(handle).await;
        if let StreamOutcome::Failed(StreamFailure::NotAuthenticated)
        | StreamOutcome::Failed(StreamFailure::Http { status: 401, .. }) = outcome
        {
            break;
        }
    }

    input.save_history()?;
    Ok(())
}

/// Wait for a reply; Ctrl-C closes the stream
async fn wait_stream(handle: Option<StreamHandle>) -> StreamOutcome {
    let mut handle = match handle {
        Some(handle) => handle,
        None => return StreamOutcome::Failed(StreamFailure::NotAuthenticated),
    };

    let finished = tokio::select! {
        outcome = handle.join() => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(outcome) => outcome,
        None => {
            handle.close();
            println!();
            StreamOutcome::Closed
        }
    }
}

async fn finish_stream(handle: Option<StreamHandle>) -> bool {
    !matches!(wait_stream(handle).await, StreamOutcome::Failed(_))
}

async fn run_doctor(ctx: &mut App) -> Result<()> {
    let mut doctor = Doctor::new(ctx.client.clone(), ctx.config.clone());
    if let Some(e) = ctx.config_error.take() {
        doctor = doctor.with_config_error(e);
    }

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    if !Doctor::overall_status(&checks) {
        std::process::exit(1);
    }
    Ok(())
}

fn show_settings(ctx: &App, init: bool) -> Result<()> {
    if init {
        let path = Config::default_path().ok_or_else(|| anyhow!("cannot locate home directory"))?;
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        Config::default().save(&path)?;
        ctx.display
            .success(&format!("Wrote default configuration to {}", path.display()));
        return Ok(());
    }

    ctx.display.section("blogctl configuration");
    println!("  Backend:    {}", ctx.config.server.base_url);
    println!("  Timeout:    {}s", ctx.config.server.timeout_secs);
    println!(
        "  LLM:        {}",
        ctx.config.llm.default_type.as_deref().unwrap_or("(not set)")
    );
    println!("  Verbosity:  {}", ctx.display.verbosity().as_str());
    println!("  State dir:  {}", ctx.config.state_dir().display());
    if let Some(path) = Config::default_path() {
        println!("  Config:     {}", path.display());
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(question)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
