use anyhow::anyhow;
use clap::Parser;
use itertools::Itertools;
use log::{error, info, warn};
use num_traits::One;
use rational_complex::derivative::arithmetic_derivative_with;
use rational_complex::oracle::DEFAULT_PRIMALITY_ROUNDS;
use rational_complex::{Cancellation, Factorizer, FactorizerConfig, RationalComplex, parse};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tokio::select;
use tokio::signal::ctrl_c;
use tokio::sync::broadcast::Sender;
use tokio::task;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ratcx")]
#[command(about = "Evaluates one rational complex expression per input line")]
struct Args {
    /// Print each value with this many digits after the radix point instead of exactly
    #[arg(long)]
    precision: Option<usize>,

    /// Print the arithmetic derivative of each value
    #[arg(long, conflicts_with = "factor")]
    derive: bool,

    /// Print the prime factors of each value, which must be an integer
    #[arg(long)]
    factor: bool,

    #[arg(long, default_value_t = DEFAULT_PRIMALITY_ROUNDS)]
    primality_rounds: usize,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn render(&self, value: &RationalComplex) -> String {
        match self.precision {
            Some(precision) => value.to_fixed_string(precision),
            None => value.to_string(),
        }
    }
}

async fn evaluate_line(
    line: &str,
    args: &Args,
    factorizer: &Arc<Factorizer>,
    mut cancel: Cancellation,
) -> anyhow::Result<String> {
    let value = parse(line)?;
    if args.factor {
        if !value.is_real() || !value.re().denom().is_one() {
            return Err(anyhow!("{value} is not an integer"));
        }
        let factors = factorizer
            .factor_cancellable(value.re().numer(), cancel)
            .await
            .ok_or_else(|| anyhow!("factoring {value} was cancelled"))?;
        Ok(format!("[{}]", factors.to_signed_vec().iter().join(", ")))
    } else if args.derive {
        let factorizer = Arc::clone(factorizer);
        let derivative = task::spawn_blocking(move || {
            arithmetic_derivative_with(&factorizer, &value, &mut cancel)
        })
        .await??;
        Ok(args.render(&derivative))
    } else {
        Ok(args.render(&value))
    }
}

async fn forward_interrupt(sender: Sender<()>) {
    if let Err(e) = ctrl_c().await {
        error!("Failed to listen for SIGINT: {e}");
        return;
    }
    warn!("Received SIGINT; cancelling");
    if let Err(e) = sender.send(()) {
        error!("Error sending cancellation signal: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    simple_log::console(args.log_level.as_str()).map_err(|e| anyhow!(e))?;
    let factorizer = Arc::new(Factorizer::from_config(&FactorizerConfig {
        primality_rounds: args.primality_rounds,
        ..FactorizerConfig::default()
    }));
    let (interrupt_sender, mut cancel) = Cancellation::new();
    task::spawn(forward_interrupt(interrupt_sender));
    info!("Reading expressions from standard input");

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        let line = select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match evaluate_line(&line, &args, &factorizer, cancel.clone()).await {
            Ok(output) => println!("{output}"),
            Err(e) => println!("{e}"),
        }
    }
    Ok(())
}
