use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Node {
    /// Node base URL (e.g. http://127.0.0.1:8000)
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    node: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        #[command(flatten)]
        node: Node,
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: f64,
    },
    /// Mine the pending transactions into a new block
    Mine {
        #[command(flatten)]
        node: Node,
    },
    /// Print the node's full chain
    Chain {
        #[command(flatten)]
        node: Node,
    },
    /// Register peers with the node
    Register {
        #[command(flatten)]
        node: Node,
        /// Peer addresses, as URLs or host:port
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// List the peers the node knows about
    Peers {
        #[command(flatten)]
        node: Node,
    },
    /// Ask the node to reconcile its chain with its peers
    Resolve {
        #[command(flatten)]
        node: Node,
    },
    /// Show or change the proof-of-work difficulty
    Difficulty {
        #[command(flatten)]
        node: Node,
        /// New difficulty; omit to show the current one
        set: Option<usize>,
    },
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: f64,
}

#[derive(Serialize)]
struct Peers {
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct NewDifficulty {
    difficulty: usize,
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body: Value = res.json().await?;
    println!("status: {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("node answered {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    debug!(?cli.cmd, "running command");
    let res = match cli.cmd {
        Command::Submit {
            node,
            sender,
            recipient,
            amount,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
            };
            client
                .post(format!("{}/transactions", node.node))
                .json(&tx)
                .send()
                .await?
        }
        Command::Mine { node } => client.get(format!("{}/mine", node.node)).send().await?,
        Command::Chain { node } => client.get(format!("{}/chain", node.node)).send().await?,
        Command::Register { node, peers } => {
            client
                .post(format!("{}/nodes", node.node))
                .json(&Peers { nodes: peers })
                .send()
                .await?
        }
        Command::Peers { node } => client.get(format!("{}/nodes", node.node)).send().await?,
        Command::Resolve { node } => {
            client
                .get(format!("{}/nodes/resolve", node.node))
                .send()
                .await?
        }
        Command::Difficulty { node, set: None } => {
            client
                .get(format!("{}/difficulty", node.node))
                .send()
                .await?
        }
        Command::Difficulty {
            node,
            set: Some(difficulty),
        } => {
            client
                .post(format!("{}/difficulty", node.node))
                .json(&NewDifficulty { difficulty })
                .send()
                .await?
        }
    };
    print_response(res).await
}
