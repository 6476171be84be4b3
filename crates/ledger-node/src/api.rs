use crate::{context::AppState, error::ApiError};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ledger_core::{Block, Difficulty, PeerChain, Transaction};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Deserialize)]
struct RegisterNodes {
    nodes: Option<Vec<String>>,
}

#[derive(Serialize)]
struct Nodes {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    total_nodes: Vec<String>,
}

#[derive(Serialize)]
struct Resolved {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain: Option<Vec<Block>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_chain: Option<Vec<Block>>,
}

#[derive(Serialize)]
struct Mined {
    message: &'static str,
    index: u64,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: f64,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

#[derive(Serialize, Deserialize)]
struct DifficultyBody {
    difficulty: usize,
}

#[derive(Serialize)]
struct DifficultySet {
    message: &'static str,
    difficulty: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/chain", get(full_chain))
        .route("/mine", get(mine))
        .route("/transactions", get(new_transaction).post(new_transaction))
        .route("/nodes", get(list_nodes).post(register_nodes))
        .route("/nodes/resolve", get(consensus))
        .route("/difficulty", get(get_difficulty).post(set_difficulty))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn full_chain(State(ctx): State<AppState>) -> Json<PeerChain> {
    Json(PeerChain::new(ctx.ledger.chain()))
}

/// Runs the proof search on the blocking pool so the runtime keeps serving.
async fn mine(State(ctx): State<AppState>) -> Result<Json<Mined>, ApiError> {
    let worker = ctx.clone();
    let block = tokio::task::spawn_blocking(move || worker.miner.mine(&worker.ledger, &worker.node_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(Mined {
        message: "New Block Forged",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(ctx): State<AppState>,
    Json(tx): Json<TxIn>,
) -> (StatusCode, Json<Message>) {
    let index = ctx.ledger.add_transaction(tx.sender, tx.recipient, tx.amount);
    (
        StatusCode::CREATED,
        Json(Message {
            message: format!("Transaction will be added to Block {index}"),
        }),
    )
}

async fn list_nodes(State(ctx): State<AppState>) -> Json<Nodes> {
    Json(Nodes {
        message: None,
        total_nodes: ctx.registry.read().nodes(),
    })
}

async fn register_nodes(
    State(ctx): State<AppState>,
    Json(body): Json<RegisterNodes>,
) -> Result<(StatusCode, Json<Nodes>), ApiError> {
    let nodes = body
        .nodes
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Error: Please supply a valid list of nodes".into()))?;
    let total_nodes = {
        let mut registry = ctx.registry.write();
        registry.register_all(&nodes)?;
        registry.nodes()
    };
    Ok((
        StatusCode::CREATED,
        Json(Nodes {
            message: Some("New nodes have been added"),
            total_nodes,
        }),
    ))
}

async fn consensus(State(ctx): State<AppState>) -> Json<Resolved> {
    let replaced = ctx.resolve_conflicts().await;
    let chain = ctx.ledger.chain();
    Json(if replaced {
        Resolved {
            message: "Our chain was replaced",
            chain: None,
            new_chain: Some(chain),
        }
    } else {
        Resolved {
            message: "Our chain is authoritative",
            chain: Some(chain),
            new_chain: None,
        }
    })
}

async fn get_difficulty(State(ctx): State<AppState>) -> Json<DifficultyBody> {
    Json(DifficultyBody {
        difficulty: ctx.ledger.difficulty().zeros(),
    })
}

async fn set_difficulty(
    State(ctx): State<AppState>,
    Json(body): Json<DifficultyBody>,
) -> Result<Json<DifficultySet>, ApiError> {
    let difficulty = Difficulty::new(body.difficulty)?;
    ctx.ledger.set_difficulty(difficulty);
    Ok(Json(DifficultySet {
        message: "Difficulty updated",
        difficulty: difficulty.zeros(),
    }))
}
