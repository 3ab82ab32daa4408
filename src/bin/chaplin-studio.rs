//! CLI for Chaplin Studio - edit film frames and chat with the director's assistant.

use chaplin_studio::chat::{Conversation, Message, Role};
use chaplin_studio::image::{EditOutcome, EditRequest, HttpPlaceholder, ImageAsset, ImageSession};
use chaplin_studio::{GeminiClient, GenAiClient, ImageModel, RequestLifecycle, StudioConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "chaplin-studio")]
#[command(about = "Edit silent film frames and brainstorm modern remakes with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Image model used for edits
    #[arg(long, global = true, value_enum)]
    image_model: Option<ImageModelArg>,

    /// Chat model used by the assistant
    #[arg(long, global = true)]
    chat_model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image with a text prompt
    Edit(EditArgs),

    /// Ask the director's assistant a single question
    Chat(ChatArgs),

    /// Interactive session with the editor and the assistant side by side
    Studio,

    /// Show the resolved configuration
    Config,
}

#[derive(Args)]
struct EditArgs {
    /// How the image should change
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Input image to edit
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    input: Option<PathBuf>,

    /// Edit the preset placeholder frame instead of a local file
    #[arg(long)]
    preset: bool,
}

#[derive(Args)]
struct ChatArgs {
    /// The message to send
    message: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ImageModelArg> for ImageModel {
    fn from(arg: ImageModelArg) -> Self {
        match arg {
            ImageModelArg::NanoBanana => ImageModel::NanoBanana,
            ImageModelArg::NanoBananaPro => ImageModel::NanoBananaPro,
        }
    }
}

type Pending<T> = Pin<Box<dyn Future<Output = T>>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut builder = StudioConfig::builder();
    if let Some(model) = cli.image_model {
        builder = builder.image_model(model.into());
    }
    if let Some(ref model) = cli.chat_model {
        builder = builder.chat_model(model);
    }
    let config = builder.build()?;

    match cli.command {
        Commands::Edit(args) => edit_image(args, config, cli.json).await?,
        Commands::Chat(args) => chat_once(args, config, cli.json).await?,
        Commands::Studio => run_studio(config).await?,
        Commands::Config => show_config(&config, cli.json)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn edit_image(args: EditArgs, config: StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let placeholder = HttpPlaceholder::from_config(&config);
    let client = GeminiClient::new(config);
    let mut session = ImageSession::new();

    match args.input {
        Some(ref path) => session.load_from_path(path)?,
        None => session.load_from_remote_placeholder(&placeholder).await?,
    }

    let Some(outcome) = session.submit_edit(&client, &args.prompt).await else {
        anyhow::bail!("nothing to do: the prompt is empty");
    };
    match outcome {
        EditOutcome::Edited => {}
        EditOutcome::NoImage => anyhow::bail!("the model returned no image for this prompt"),
        EditOutcome::Stale => anyhow::bail!("the original image changed during the edit"),
        EditOutcome::Failed(e) => return Err(e.into()),
    }

    let Some(edited) = session.edited() else {
        anyhow::bail!("the model returned no image for this prompt");
    };
    let output = output_path(&args.output, edited);
    edited.save(&output)?;

    if json_output {
        let payload = edited.extract()?;
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": output.display().to_string(),
            "mime_type": payload.mime_type,
            "size_bytes": payload.decode()?.len(),
            "model": client.config().image_model.as_str(),
            "prompt": args.prompt,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} via {} ({})",
            output.display(),
            client.name(),
            client.config().image_model
        );
    }

    Ok(())
}

/// Adds the edited image's extension when the output path has none.
fn output_path(requested: &Path, edited: &ImageAsset) -> PathBuf {
    match (requested.extension(), edited.format()) {
        (None, Some(format)) => requested.with_extension(format.extension()),
        _ => requested.to_path_buf(),
    }
}

async fn chat_once(args: ChatArgs, config: StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let client = GeminiClient::new(config);
    let mut conversation = Conversation::new();

    let Some(reply) = conversation.send_message(&client, &args.message).await else {
        anyhow::bail!("nothing to send: the message is empty");
    };
    let reply = reply.text().to_string();
    let success = conversation.lifecycle() == RequestLifecycle::Succeeded;

    if json_output {
        let result = serde_json::json!({
            "type": "chat",
            "success": success,
            "model": client.config().chat_model,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{reply}");
    }

    Ok(())
}

fn show_config(config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let result = serde_json::json!({
            "api_key": config.redacted_api_key(),
            "base_url": config.base_url,
            "image_model": config.image_model.as_str(),
            "chat_model": config.chat_model,
            "placeholder_url": config.placeholder_url,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("API key:         {}", config.redacted_api_key());
        println!("Endpoint:        {}", config.base_url);
        println!("Image model:     {}", config.image_model);
        println!("Chat model:      {}", config.chat_model);
        println!("Placeholder URL: {}", config.placeholder_url);
    }
    Ok(())
}

const STUDIO_HELP: &str = "\
Commands:
  /load <path>    load a frame from disk
  /preset         load the preset frame
  /edit <prompt>  edit the loaded frame
  /save <path>    save the edited frame
  /status         show the editor panel
  /history        show the conversation
  /help           show this help
  /quit           leave the studio
Anything else is sent to the director's assistant.";

/// Waits on a pending request, or forever if there is none.
async fn wait_for<T>(slot: &mut Option<Pending<T>>) -> T {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn run_studio(config: StudioConfig) -> anyhow::Result<()> {
    let placeholder = HttpPlaceholder::from_config(&config);
    let client: Arc<dyn GenAiClient> = Arc::new(GeminiClient::new(config));

    let mut session = ImageSession::new();
    let mut conversation = Conversation::new();
    let mut edit_request: Option<EditRequest> = None;
    let mut pending_edit: Option<Pending<chaplin_studio::Result<Option<ImageAsset>>>> = None;
    let mut pending_chat: Option<Pending<chaplin_studio::Result<String>>> = None;

    println!("Chaplin AI Studio - Silent Film Modernizer\n");
    print_message(&conversation.messages()[0]);
    println!("\n{STUDIO_HELP}\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
                let rest = rest.trim();

                match command {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/help" => println!("{STUDIO_HELP}"),
                    "/status" => print_session(&session),
                    "/history" => conversation.messages().iter().for_each(print_message),
                    "/load" => match session.load_from_path(rest) {
                        Ok(()) => println!("Loaded {rest}"),
                        Err(e) => println!("Could not load {rest}: {e}"),
                    },
                    "/preset" => match session.load_from_remote_placeholder(&placeholder).await {
                        Ok(()) => println!("Loaded preset frame from {}", placeholder.url()),
                        Err(_) => println!("Could not load the preset frame."),
                    },
                    "/save" => match session.edited() {
                        Some(edited) if !rest.is_empty() => {
                            let path = output_path(Path::new(rest), edited);
                            match edited.save(&path) {
                                Ok(()) => println!("Saved {}", path.display()),
                                Err(e) => println!("Could not save {}: {e}", path.display()),
                            }
                        }
                        Some(_) => println!("Usage: /save <path>"),
                        None => println!("Nothing to save yet."),
                    },
                    "/edit" => match session.begin_edit(rest) {
                        None if session.original().is_none() => {
                            println!("Upload a silent film frame or load a preset first.");
                        }
                        None if session.is_editing() => println!("Still generating..."),
                        None => println!("Usage: /edit <prompt>"),
                        Some(Err(_)) => {
                            println!("Failed to edit image. Please try again.");
                            session.acknowledge();
                        }
                        Some(Ok(request)) => {
                            println!("Generating...");
                            let client = Arc::clone(&client);
                            let req = request.clone();
                            pending_edit = Some(Box::pin(async move {
                                client
                                    .request_image_edit(&req.image_base64, &req.mime_type, &req.prompt)
                                    .await
                            }));
                            edit_request = Some(request);
                        }
                    },
                    _ if command.starts_with('/') => println!("Unknown command {command}. Try /help."),
                    _ => match conversation.begin_send(line) {
                        None => println!("Still waiting for the assistant..."),
                        Some(request) => {
                            println!("Thinking...");
                            let client = Arc::clone(&client);
                            pending_chat = Some(Box::pin(async move {
                                client.request_chat_reply(&request.history, &request.message).await
                            }));
                        }
                    },
                }
            }
            result = wait_for(&mut pending_edit) => {
                pending_edit = None;
                if let Some(request) = edit_request.take() {
                    match session.apply_edit(&request, result) {
                        EditOutcome::Edited => {
                            println!("Edit ready for \"{}\". Use /save <path> to keep it.", request.prompt);
                        }
                        EditOutcome::NoImage => {
                            println!("The model returned no image; the previous edit is still shown.");
                        }
                        EditOutcome::Stale => println!("Discarded an edit of a previous frame."),
                        EditOutcome::Failed(_) => println!("Failed to edit image. Please try again."),
                    }
                    session.acknowledge();
                }
            }
            result = wait_for(&mut pending_chat) => {
                pending_chat = None;
                print_message(conversation.apply_reply(result));
                conversation.acknowledge();
            }
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    match message.role() {
        Role::User => println!("{}: {}", message.role().display_name(), message.text()),
        Role::Model => println!("{}:\n{}\n", message.role().display_name(), message.text()),
    }
}

fn print_session(session: &ImageSession) {
    let describe = |asset: &ImageAsset| match asset.extract() {
        Ok(payload) => format!("{} ({} bytes encoded)", payload.mime_type, asset.size()),
        Err(_) => "unrecognized image".to_string(),
    };

    match session.original() {
        Some(original) => println!("Original: {}", describe(original)),
        None => println!("Original: none - upload a silent film frame or load a preset"),
    }
    match (session.edited(), session.edit_prompt()) {
        (Some(edited), Some(prompt)) => println!("Edited:   {} from \"{prompt}\"", describe(edited)),
        (Some(edited), None) => println!("Edited:   {}", describe(edited)),
        (None, _) => println!("Edited:   none"),
    }
    println!("Editor:   {}", session.lifecycle());
}
