//! Simulation server
//!
//! Runs a full market simulation: several listed symbols, a market maker
//! providing liquidity, a momentum trader taking it, periodic portfolio
//! and market reports, and Prometheus metrics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

use market_simulator::metrics::MetricsReporter;
use market_simulator::{Exchange, MomentumStrategy, SimulatorMetrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("starting market simulation server");

    if let Err(e) = install_prometheus() {
        error!(error = %e, "failed to install Prometheus recorder; metrics disabled");
    }

    let metrics = Arc::new(SimulatorMetrics::new());
    let reporter = MetricsReporter::new(Arc::clone(&metrics), Duration::from_secs(5));
    tokio::spawn(async move { reporter.run().await });

    let exchange = Arc::new(Exchange::new());

    let listings = [("AAPL", 150.0), ("GOOGL", 2800.0), ("MSFT", 300.0), ("TSLA", 250.0)];
    for (symbol, price) in listings {
        exchange.add_symbol(symbol, price);
    }

    // liquidity provider
    let mut maker_positions = HashMap::new();
    for (symbol, _) in listings {
        maker_positions.insert(symbol.to_string(), 400);
    }
    let maker_id = exchange.add_market_maker(5_000_000.0, &maker_positions);
    info!(participant = %maker_id, "market maker registered");

    // momentum trader
    let symbols: Vec<String> = listings.iter().map(|(s, _)| s.to_string()).collect();
    exchange.add_participant("momentum_1", 250_000.0);
    exchange.add_strategy(Box::new(MomentumStrategy::new(
        "momentum_1",
        &symbols,
        10,
        0.002,
        50,
    )));

    // wire observers into the metrics
    {
        let metrics = Arc::clone(&metrics);
        exchange.on_trade(move |trade| metrics.record_trade(trade.quantity));
    }
    {
        let metrics = Arc::clone(&metrics);
        exchange.on_order_rejection(move |_, _| metrics.record_order_rejected());
    }
    {
        let metrics = Arc::clone(&metrics);
        exchange.on_market_data(move |_| metrics.record_tick());
    }

    exchange.start()?;
    info!("simulation running; press ctrl-c to stop");

    // periodic market and portfolio reports
    let reporting = Arc::clone(&exchange);
    let report_metrics = Arc::clone(&metrics);
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(10));
        loop {
            ticker.tick().await;

            let mut resting = 0usize;
            for (symbol, summary) in reporting.market_summary() {
                info!(
                    "{} | last {:.2} | bid {:.2} / ask {:.2} | spread {:.2}",
                    symbol, summary.current_price, summary.bid, summary.ask, summary.spread
                );
                resting += summary
                    .depth
                    .bids
                    .iter()
                    .chain(summary.depth.asks.iter())
                    .map(|level| level.order_count)
                    .sum::<usize>();
            }
            report_metrics.set_resting_orders(resting as u64);

            for (pid, summary) in reporting.portfolio_summary() {
                info!(
                    "{} | cash {:.2} | value {:.2} | pnl {:+.2}",
                    pid, summary.cash, summary.portfolio_value, summary.pnl
                );
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    exchange.stop();

    let final_summary = exchange.portfolio_summary();
    info!(
        trades = exchange.trade_history().len(),
        "final portfolio summary: {}",
        serde_json::to_string_pretty(&final_summary)?
    );

    Ok(())
}

fn install_prometheus() -> Result<(), Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let addr: std::net::SocketAddr = "0.0.0.0:9090".parse()?;
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Prometheus metrics listening on http://{addr}/metrics");
    Ok(())
}
