use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use docrepo::cli::{Cli, Commands};
use docrepo::{Container, Entity, Filter, Item};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config()).await?;
    if container.memory_storage() {
        info!("Using in-memory storage; documents are discarded on exit");
    }
    let items = container.repository::<Item>(&cli.collection);

    match cli.command {
        Commands::Create {
            name,
            description,
            price,
        } => {
            let item = Item::new(name, description, price);
            items.create(&item).await?;
            println!("Created item: {}", item.display_line());
        }

        Commands::Get { id } => match items.get(id).await? {
            Some(item) if cli.json => println!("{}", serde_json::to_string_pretty(&item)?),
            Some(item) => print_item(&item),
            None => println!("No item with id {}.", id),
        },

        Commands::List {
            name,
            min_price,
            max_price,
        } => {
            let mut filter = Filter::all();
            if let Some(name) = name {
                filter = filter.and(Filter::eq("name", name));
            }
            if let Some(min) = min_price {
                filter = filter.and(Filter::gte("price", min));
            }
            if let Some(max) = max_price {
                filter = filter.and(Filter::lte("price", max));
            }

            let found = if filter.is_all() {
                items.get_all().await?
            } else {
                items.get_all_filtered(&filter).await?
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else if found.is_empty() {
                println!("No items found.");
            } else {
                println!("Items in {}:\n", cli.collection);
                for item in found {
                    println!("  {}", item.display_line());
                }
            }
        }

        Commands::Update {
            id,
            name,
            description,
            price,
        } => {
            let Some(mut item) = items.get(id).await? else {
                println!("No item with id {}.", id);
                return Ok(());
            };

            if let Some(name) = name {
                item.set_name(name);
            }
            if let Some(description) = description {
                item.set_description(description);
            }
            if let Some(price) = price {
                item.set_price(price);
            }

            items.update(&item).await?;
            println!("Updated item: {}", item.display_line());
        }

        Commands::Remove { id } => {
            items.remove(id).await?;
            println!("Item {} removed.", id);
        }

        Commands::Stats => {
            let total = items.count().await?;
            let backend = if container.memory_storage() {
                "memory".to_string()
            } else {
                container.mongo_settings().redacted()
            };

            println!("DocRepo Statistics");
            println!("==================");
            println!("Backend:    {}", backend);
            println!("Database:   {}", container.database_name());
            println!("Collection: {}", cli.collection);
            println!("Documents:  {}", total);
        }
    }

    Ok(())
}

fn print_item(item: &Item) {
    println!("{} ({})", item.name(), item.id());
    if !item.description().is_empty() {
        println!("  {}", item.description());
    }
    println!("  Price:   {:.2}", item.price());
    println!("  Created: {}", item.created_at());
}
