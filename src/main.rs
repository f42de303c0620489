use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use blog_admin_lists::config;
use blog_admin_lists::payload::ItemPayload;
use blog_admin_lists::store::ListStore;
use blog_admin_lists::{Direction, Item, ListEditor, RestListStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Inspect and edit ordered admin lists")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListKind {
    Faq,
    PopularPosts,
    FlexibleContent,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Debug, clap::Args)]
struct Target {
    /// Which list to edit
    #[arg(long, value_enum)]
    list: ListKind,

    /// Container key (category id, subcategory id or page slug)
    #[arg(long)]
    key: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored list
    Show {
        #[command(flatten)]
        target: Target,
    },
    /// Replace the stored list with the items of a YAML file
    Push {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        file: PathBuf,
    },
    /// Swap one item with its neighbour and save
    Move {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        direction: DirectionArg,
    },
    /// Remove one item and save
    Remove {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        id: String,
    },
    /// Print an example config file
    ExampleConfig,
}

enum Action {
    Show,
    Push(PathBuf),
    Move(String, Direction),
    Remove(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let (target, action) = match args.command {
        Command::ExampleConfig => {
            print!("{}", config::example());
            return Ok(());
        }
        Command::Show { target } => (target, Action::Show),
        Command::Push { target, file } => (target, Action::Push(file)),
        Command::Move {
            target,
            id,
            direction,
        } => (target, Action::Move(id, direction.into())),
        Command::Remove { target, id } => (target, Action::Remove(id)),
    };

    let cfg = config::load(Some(&args.config))?;
    let rest = RestListStore::from_config(&cfg)?;
    info!(base_url = %rest.base_url(), "using admin API");
    let store: Arc<dyn ListStore> = Arc::new(rest);

    match target.list {
        ListKind::Faq => run(ListEditor::faq(store, &cfg), &target.key, action).await,
        ListKind::PopularPosts => {
            run(ListEditor::popular_posts(store, &cfg), &target.key, action).await
        }
        ListKind::FlexibleContent => {
            run(ListEditor::flexible_content(store, &cfg), &target.key, action).await
        }
    }
}

async fn run<P: ItemPayload>(mut editor: ListEditor<P>, key: &str, action: Action) -> Result<()> {
    editor.load(key).await?;

    match action {
        Action::Show => {}
        Action::Push(file) => {
            let items = read_items::<P>(&file, &editor.resource().id_field).await?;
            info!(items = items.len(), file = %file.display(), "replacing list");
            editor.replace_items(items)?;
            editor.save().await?;
        }
        Action::Move(id, direction) => {
            editor.move_item(&id, direction)?;
            editor.save().await?;
        }
        Action::Remove(id) => {
            editor.remove_item(&id)?;
            editor.save().await?;
        }
    }

    print_items(&editor)
}

async fn read_items<P: ItemPayload>(file: &Path, id_field: &str) -> Result<Vec<Item<P>>> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let objects: Vec<Map<String, Value>> =
        serde_yaml::from_str(&raw).with_context(|| format!("invalid item list in {}", file.display()))?;
    objects
        .into_iter()
        .map(|obj| Item::from_wire(obj, id_field).context("invalid item"))
        .collect()
}

fn print_items<P: ItemPayload>(editor: &ListEditor<P>) -> Result<()> {
    let id_field = &editor.resource().id_field;
    let items = editor
        .items()
        .iter()
        .map(|item| item.to_display(id_field))
        .collect::<Result<Vec<_>, _>>()?;
    print!("{}", serde_yaml::to_string(&items)?);
    Ok(())
}
