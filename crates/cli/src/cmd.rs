use crate::env;
use alloy::{
    network::TransactionBuilder,
    primitives::{
        utils::{parse_ether, UnitsError},
        Address, U256,
    },
    signers::Signer,
};
use clap::{Args, Parser, Subcommand};
use oracle_feeds::{default_sources, from_fixed, FeedPusher};
use oracle_runner::{
    expiration_from_now, FunctionRunner, OrderClient, PollConfig, StdoutRunner, TransferParams,
    ValuePolicy, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
};
use oracle_sandbox::{
    builtins::random_u256, randomness_transaction, CallbackPipeline, FunctionRegistry,
    ReqwestTransport, DEFAULT_EXPIRATION_SECONDS,
};
use oracle_types::{
    config::{
        env_utils::load_address, FUNCTION_ID, PUSH_RECEIVER_ADDRESS, RECEIVER_ADDRESS,
        SWITCHBOARD_ADDRESS, TARGET_CONTRACT,
    },
    requests_from_env, RequestConfig,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Fee paid by `create-order`: 0.009 ether.
const DEFAULT_ORDER_FEE: &str = "0.009";

fn ether(value: &str) -> Result<U256, UnitsError> {
    parse_ether(value)
}

/// Oracle function entry points. Batches are written to stdout as
/// `FN_OUT:` lines; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "oracle-fn", version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Emit a `transfer(address,uint256)` call on the target token.
    Transfer(TransferArgs),
    /// Emit a random `uint256` to the randomness receiver.
    Randomness,
    /// Run the configured function for every pending request and emit the
    /// callbacks.
    Callback(CallbackArgs),
    /// Create an order on the params receiver and wait until it is filled.
    CreateOrder(CreateOrderArgs),
    /// Print every feed held by the push receiver.
    PrintFeeds,
    /// Sample exchanges and emit feed updates for the push receiver.
    PushFeeds,
    /// Point the push receiver at the oracle contract and function id.
    UpdateReceiver,
}

#[derive(Debug, Args)]
struct TransferArgs {
    /// Amount in ether.
    #[arg(long, value_parser = ether)]
    amount: Option<U256>,
    /// Token recipient. Defaults to the randomness receiver address.
    #[arg(long)]
    recipient: Option<Address>,
    /// Gas price in wei.
    #[arg(long, default_value_t = DEFAULT_GAS_PRICE)]
    gas_price: u128,
    /// Gas limit.
    #[arg(long, default_value_t = DEFAULT_GAS_LIMIT)]
    gas_limit: u64,
    /// Add `gas_limit * gas_price` to the transaction value.
    #[arg(long)]
    include_gas_budget: bool,
}

#[derive(Debug, Args)]
struct CallbackArgs {
    /// Request configuration file.
    #[arg(long, env = "FUNCTION_CONFIG", value_name = "FILE")]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct CreateOrderArgs {
    /// Fee in ether.
    #[arg(long, value_parser = ether, default_value = DEFAULT_ORDER_FEE)]
    fee: U256,
    /// Give up waiting for the fill after this many seconds.
    #[arg(long, default_value_t = 600, value_name = "SECONDS")]
    timeout: u64,
}

impl Cli {
    pub(crate) async fn run(self) -> eyre::Result<()> {
        match self.command {
            Command::Transfer(args) => transfer(args).await,
            Command::Randomness => randomness().await,
            Command::Callback(args) => callback(args).await,
            Command::CreateOrder(args) => create_order(args).await,
            Command::PrintFeeds => print_feeds().await,
            Command::PushFeeds => push_feeds().await,
            Command::UpdateReceiver => update_receiver().await,
        }
    }
}

async fn transfer(args: TransferArgs) -> eyre::Result<()> {
    let from = Signer::address(&env::signer()?);
    let target = load_address(TARGET_CONTRACT)?;
    let recipient = match args.recipient {
        Some(recipient) => recipient,
        None => load_address(RECEIVER_ADDRESS)?,
    };
    let chain_id = env::chain_id_opt()?.ok_or_else(|| eyre::eyre!("CHAIN_ID is not set"))?;

    let policy = if args.include_gas_budget {
        ValuePolicy::IncludeGasBudget
    } else {
        ValuePolicy::AmountOnly
    };
    let mut params = TransferParams::new(from, target, recipient, chain_id)
        .with_gas_price(args.gas_price)
        .with_gas_limit(args.gas_limit)
        .with_value_policy(policy);
    if let Some(amount) = args.amount {
        params = params.with_amount(amount);
    }

    info!(%from, %target, %recipient, value = %params.value(), "emitting transfer");
    StdoutRunner::stdout()
        .emit(
            vec![params.build()],
            expiration_from_now(DEFAULT_EXPIRATION_SECONDS),
            params.gas_limit().to_string(),
        )
        .await?;
    Ok(())
}

async fn randomness() -> eyre::Result<()> {
    let receiver = load_address(RECEIVER_ADDRESS)?;
    let mut tx = randomness_transaction(receiver, random_u256());
    if let Some(chain_id) = env::chain_id_opt()? {
        tx = tx.with_chain_id(chain_id);
    }

    info!(%receiver, "emitting randomness");
    StdoutRunner::stdout()
        .emit(
            vec![tx],
            expiration_from_now(DEFAULT_EXPIRATION_SECONDS),
            DEFAULT_GAS_LIMIT.to_string(),
        )
        .await?;
    Ok(())
}

async fn callback(args: CallbackArgs) -> eyre::Result<()> {
    let config = RequestConfig::load(&args.config)?;
    let requests = requests_from_env(&config)?;
    let receiver = load_address(RECEIVER_ADDRESS)?;

    let mut pipeline = CallbackPipeline::new(
        &FunctionRegistry::with_builtins(),
        config,
        Arc::new(ReqwestTransport::new()),
        receiver,
    )?;
    if let Some(chain_id) = env::chain_id_opt()? {
        pipeline = pipeline.with_chain_id(chain_id);
    }

    let emitted = pipeline.run(StdoutRunner::stdout(), &requests).await?;
    info!(requests = requests.len(), emitted, "callback run complete");
    Ok(())
}

async fn create_order(args: CreateOrderArgs) -> eyre::Result<()> {
    let receiver = load_address(RECEIVER_ADDRESS)?;
    let function_id = load_address(FUNCTION_ID)?;
    let poll = PollConfig::new().with_timeout(Duration::from_secs(args.timeout));
    let client = OrderClient::new(receiver, env::wallet_provider()?, poll);

    if client.ensure_initialized(function_id).await? {
        info!(%function_id, "receiver initialized");
    }

    let created = client.create_order(args.fee).await?;
    let status = client.await_filled(created.orderId).await?;
    info!(
        order_id = %created.orderId,
        call_id = %created.callId,
        filled = status.filled,
        "order filled"
    );
    Ok(())
}

async fn print_feeds() -> eyre::Result<()> {
    let address = load_address(PUSH_RECEIVER_ADDRESS)?;
    let pusher = FeedPusher::new(address, env::read_provider()?, Vec::new());

    for feed in pusher.feeds().await? {
        let value = feed.latest_value();
        let shown = from_fixed(value).map_or_else(|| value.to_string(), |d| d.to_string());
        println!("{}\t{}\t{}", feed.name(), feed.id(), shown);
    }
    Ok(())
}

async fn push_feeds() -> eyre::Result<()> {
    let address = load_address(PUSH_RECEIVER_ADDRESS)?;
    let pusher = FeedPusher::new(address, env::read_provider()?, default_sources());

    let plan = pusher.run(StdoutRunner::stdout()).await?;
    if plan.is_empty() {
        info!("no feed changed enough to push");
    }
    Ok(())
}

async fn update_receiver() -> eyre::Result<()> {
    let address = load_address(PUSH_RECEIVER_ADDRESS)?;
    let switchboard = load_address(SWITCHBOARD_ADDRESS)?;
    let function_id = load_address(FUNCTION_ID)?;

    FeedPusher::new(address, env::wallet_provider()?, Vec::new())
        .configure(switchboard, function_id)
        .await?;
    Ok(())
}
