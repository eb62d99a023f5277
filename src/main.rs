//! LinguaFrame command-line entrypoint.
//!
//! Commands:
//! - `status` - Wallet connection, chain and payment token
//! - `pay` - Direct USDC transfer, waits for one confirmation
//! - `fetch` - GET a URL, paying with x402 if the server asks
//! - `translate` - Preview translation of a text
//! - `languages` - Supported target languages
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON config file (default `config.json`)
//! - `EVM_PRIVATE_KEY` connects a local wallet
//! - `OTEL_*` variables enable trace and metric export

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use linguaframe::config::Config;
use linguaframe::desk::PaymentDesk;
use linguaframe::telemetry::Telemetry;
use linguaframe::translate::{Language, PreviewTranslator, Translator};
use linguaframe_chain_eip155::chain::ChecksummedAddress;
use linguaframe_chain_eip155::networks::usdc_on_chain;
use linguaframe_chain_eip155::wallet::{Eip155LocalWallet, WalletSession};
use linguaframe_chain_eip155::PaymentSubmitter;
use linguaframe_reqwest::ClientOptions;
use linguaframe_types::payment::{PaymentRequest, PaymentResult};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "linguaframe")]
#[command(about = "Pay-per-use translation with USDC on Base", version)]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show wallet connection, chain and payment token
    Status,
    /// Send USDC (or another ERC-20) and wait for one confirmation
    Pay {
        /// Decimal amount, e.g. `1.50`
        #[arg(long, default_value = "1")]
        amount: String,
        #[arg(long, default_value = "")]
        recipient: String,
        /// Token contract; defaults to USDC on the configured chain
        #[arg(long)]
        token: Option<String>,
        /// Defaults to the configured chain
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// GET a URL, paying for it if the server answers 402
    Fetch { url: String },
    /// Translate English text
    Translate {
        #[arg(long, short, default_value = "es")]
        to: Language,
        text: String,
    },
    /// List supported target languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli_args = CliArgs::parse();
    let _telemetry = Telemetry::init();

    let config = Config::load(&cli_args.config)?;
    let chain = config.chain_reference()?;

    let session = Arc::new(WalletSession::new());
    if let Some(private_key) = config.signer() {
        let wallet = Eip155LocalWallet::from_private_key(private_key, chain, config.rpc()?)?
            .with_receipt_timeout(config.receipt_timeout());
        session.connect(wallet);
    }

    let mut client_options = ClientOptions::default().with_timeout(config.http_timeout());
    if let Some(base_url) = config.api_base_url() {
        client_options = client_options.with_base_url(base_url);
    }
    let desk = PaymentDesk::new(session)
        .with_submitter(PaymentSubmitter::default())
        .with_client_options(client_options);

    tracing::debug!(
        app = config.app_name(),
        walletconnect_configured = !config.wallet_connect_project_id().is_empty(),
        onchainkit_demo_key = config.onchain_kit_api_key() == "cdp_demo_key",
        "Configuration loaded"
    );

    match cli_args.command {
        Command::Status => {
            match desk.address() {
                Some(address) => println!("Connected: {}", ChecksummedAddress(address).short()),
                None => println!("Not connected"),
            }
            let chain_id = chain.as_chain_id();
            match chain_id.as_network_name() {
                Some(name) => println!("Chain: {chain_id} ({name})"),
                None => println!("Chain: {chain_id}"),
            }
            match usdc_on_chain(chain) {
                Some(usdc) => println!("Token: USDC {}", usdc.address),
                None => println!("Token: none known for this chain"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Pay {
            amount,
            recipient,
            token,
            chain_id,
        } => {
            if recipient.trim().is_empty() {
                eprintln!("Please enter a recipient address");
                return Ok(ExitCode::FAILURE);
            }
            let chain_id = chain_id.unwrap_or(chain.inner());
            let mut request = PaymentRequest::new(amount, recipient, chain_id);
            if let Some(token) = token {
                request = request.with_token(token);
            }
            let result = desk.handle_payment(&request).await;
            print_payment_result(&result, chain_id);
            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Fetch { url } => {
            let Some(client) = desk.create_client() else {
                eprintln!("Please connect your wallet first");
                return Ok(ExitCode::FAILURE);
            };
            match client.get(&url).await {
                Ok(response) => {
                    if let Some(settlement) = &response.settlement {
                        eprintln!(
                            "Paid: {}",
                            settlement.transaction.as_deref().unwrap_or("(no transaction)")
                        );
                    }
                    match response.json::<Value>() {
                        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                        Err(_) => println!("{}", response.text()),
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    eprintln!("{error}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Translate { to, text } => {
            match PreviewTranslator::default().translate(&text, to).await {
                Ok(translation) => {
                    println!("{}", translation.text);
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    eprintln!("{error}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Languages => {
            for language in Language::ALL {
                println!("{}  {}", language.code(), language.name());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_payment_result(result: &PaymentResult, chain_id: u64) {
    match result {
        PaymentResult::Success {
            transaction_hash,
            confirmations,
        } => {
            println!("Payment successful!");
            println!("Transaction: {transaction_hash}");
            println!("Confirmations: {confirmations}");
            if let Some(url) = result.explorer_url(chain_id) {
                println!("View on BaseScan: {url}");
            }
        }
        PaymentResult::Failure { error } => eprintln!("Payment failed: {error}"),
    }
}
