use std::path::PathBuf;
use std::process;

use anyhow::Result;
use backlog_wiki_core::client::{BacklogClient, BacklogClientConfig, WikiPage};
use backlog_wiki_core::config::{BacklogConfig, load_installed_config};
use backlog_wiki_core::content::read_page_content;
use backlog_wiki_core::credentials::resolve_api_key;
use backlog_wiki_core::guard::ProjectMismatch;
use backlog_wiki_core::runtime::InstallContext;
use backlog_wiki_core::wiki;
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "backlog_wiki",
    version,
    about = "Manage Backlog wiki pages from exported Markdown files",
    after_help = "Examples:\n  backlog_wiki create 1234567890 \"Release Notes\" docs/release-notes.md\n  backlog_wiki update 123456 \"Release Notes\" docs/release-notes.md --notify\n  backlog_wiki delete 123456\n  backlog_wiki get 123456"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
    Get(GetArgs),
}

#[derive(Debug, Args)]
struct CreateArgs {
    project_id: u64,
    name: String,
    content_file: PathBuf,
    #[arg(long, help = "Send a mail notification for this change")]
    notify: bool,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    wiki_id: u64,
    name: String,
    content_file: PathBuf,
    #[arg(long, help = "Send a mail notification for this change")]
    notify: bool,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    wiki_id: u64,
    #[arg(long, help = "Send a mail notification for this change")]
    notify: bool,
}

#[derive(Debug, Args)]
struct GetArgs {
    wiki_id: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Create(args)) => run_create(args),
        Some(Commands::Update(args)) => run_update(args),
        Some(Commands::Delete(args)) => run_delete(args),
        Some(Commands::Get(args)) => run_get(args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            process::exit(1);
        }
    }
}

fn run_create(args: CreateArgs) -> Result<()> {
    let (config, mut client) = connect()?;
    let guard = config.project_guard();
    let content = read_page_content(&args.content_file)?;

    println!("create wiki");
    println!("project_id: {}", args.project_id);
    println!("name: {}", args.name);
    let page = wiki::create_wiki(
        &mut client,
        &guard,
        args.project_id,
        &args.name,
        &content,
        args.notify,
    )?;
    println!("wiki_id: {}", page.id);
    println!("wiki_name: {}", page.name);
    print_payload(&page)
}

fn run_update(args: UpdateArgs) -> Result<()> {
    let (_, mut client) = connect()?;
    let content = read_page_content(&args.content_file)?;

    println!("update wiki");
    println!("wiki_id: {}", args.wiki_id);
    let page = wiki::update_wiki(&mut client, args.wiki_id, &args.name, &content, args.notify)?;
    println!("wiki_name: {}", page.name);
    println!("project_id: {}", page.project_id);
    print_payload(&page)
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let (config, mut client) = connect()?;
    let guard = config.project_guard();

    println!("delete wiki");
    println!("wiki_id: {}", args.wiki_id);
    let outcome = wiki::delete_wiki(&mut client, &guard, args.wiki_id, args.notify)?;
    println!("wiki_name: {}", outcome.fetched.page.name);
    if let Some(mismatch) = &outcome.fetched.mismatch {
        print_mismatch_warning(mismatch);
    }
    println!("deleted: yes");
    print_payload(&outcome.deleted)
}

fn run_get(args: GetArgs) -> Result<()> {
    let (config, mut client) = connect()?;
    let guard = config.project_guard();

    println!("get wiki");
    println!("wiki_id: {}", args.wiki_id);
    let outcome = wiki::get_wiki(&mut client, &guard, args.wiki_id)?;
    println!("wiki_name: {}", outcome.page.name);
    println!("project_id: {}", outcome.page.project_id);
    if let Some(mismatch) = &outcome.mismatch {
        print_mismatch_warning(mismatch);
    }
    print_payload(&outcome.page)
}

fn connect() -> Result<(BacklogConfig, BacklogClient)> {
    let context = InstallContext::from_process();
    let config = load_installed_config(&context)?;
    let api_key = resolve_api_key(&context)?;
    let client = BacklogClient::new(BacklogClientConfig::from_config(&config, api_key)?)?;
    Ok((config, client))
}

fn print_mismatch_warning(mismatch: &ProjectMismatch) {
    match &mismatch.allowed_project_id {
        Some(allowed) => println!(
            "warning: this wiki belongs to project {} which is not the allowed project ({allowed})",
            mismatch.project_id
        ),
        None => println!(
            "warning: this wiki belongs to project {} and no allowed project id is configured",
            mismatch.project_id
        ),
    }
}

fn print_payload(page: &WikiPage) -> Result<()> {
    println!();
    println!("{}", serde_json::to_string_pretty(&page.raw)?);
    Ok(())
}
