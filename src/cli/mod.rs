use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::connector::{ContainerConfig, MongoDbSettings, ServiceSettings};

#[derive(Parser)]
#[command(name = "docrepo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print items as JSON documents
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep documents in process memory (lost when the command exits)
    #[arg(long, global = true)]
    pub memory_storage: bool,

    #[arg(long, global = true, env = "MONGODB_HOST", default_value = "localhost")]
    pub mongo_host: String,

    #[arg(long, global = true, env = "MONGODB_PORT", default_value = "27017")]
    pub mongo_port: u16,

    /// Full connection string, overrides host and port
    #[arg(long, global = true, env = "MONGODB_URI")]
    pub mongo_uri: Option<String>,

    /// Service name, also used as the database name
    #[arg(long, global = true, env = "SERVICE_NAME", default_value = "catalog")]
    pub service_name: String,

    #[arg(long, global = true, default_value = "items")]
    pub collection: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn container_config(&self) -> ContainerConfig {
        let mut mongo = MongoDbSettings::new(&self.mongo_host, self.mongo_port);
        if let Some(uri) = &self.mongo_uri {
            mongo = mongo.with_connection_string(uri);
        }

        ContainerConfig {
            mongo,
            service: ServiceSettings::new(&self.service_name),
            memory_storage: self.memory_storage,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long)]
        price: f64,
    },

    Get {
        id: Uuid,
    },

    List {
        /// Only items with exactly this name
        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,
    },

    Update {
        id: Uuid,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        price: Option<f64>,
    },

    Remove {
        id: Uuid,
    },

    Stats,
}
