//! End-of-run report formatting.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::arena::Arena;
use crate::config::PRICE_MULTIPLIER;
use crate::order::{Order, OrderMessage};
use crate::order_book::OrderBook;
use crate::stats::EngineStats;

/// Render a fixed-point price as a decimal string.
pub fn format_price(fixed: i64) -> String {
    let whole = fixed / PRICE_MULTIPLIER;
    let frac = (fixed % PRICE_MULTIPLIER).abs();
    format!("{}.{:04}", whole, frac)
}

/// Print the final statistics table to stdout.
pub fn print_report(stats: &EngineStats, elapsed: Duration, arena: &Arena, book: &OrderBook) {
    let received = stats.orders_received.load(Ordering::Relaxed);
    let processed = stats.orders_processed.load(Ordering::Relaxed);
    let fills = stats.total_fills.load(Ordering::Relaxed);
    let ring_full = stats.ring_buffer_full_count.load(Ordering::Relaxed);
    let pool_dry = stats.pool_exhausted_count.load(Ordering::Relaxed);

    let secs = elapsed.as_secs_f64();
    let throughput = if secs > 0.0 { processed as f64 / secs } else { 0.0 };
    let mean_latency_ns = if throughput > 0.0 { 1e9 / throughput } else { 0.0 };

    println!();
    println!("================================================================");
    println!("  pulse-lob matching engine - final report");
    println!("================================================================");
    println!();
    println!("   {:<30} {:>20}", "orders received", received);
    println!("   {:<30} {:>20}", "orders processed", processed);
    println!("   {:<30} {:>20}", "total fills (units)", fills);
    println!("   {:<30} {:>20}", "matches", book.match_count());
    println!("   {:<30} {:>20}", "cancels honored", book.cancel_count());
    println!("   {:<30} {:>17.2} s", "elapsed", secs);
    println!("   {:<30} {:>14.0} ops/s", "throughput", throughput);
    println!("   {:<30} {:>17.0} ns", "mean latency (derived)", mean_latency_ns);
    println!();
    println!("   {:<30} {:>20}", "ring-full retries", ring_full);
    println!("   {:<30} {:>20}", "pool-exhausted drops", pool_dry);
    println!(
        "   {:<30} {:>13.2} / {:.0} MB",
        "arena used",
        arena.used() as f64 / (1024.0 * 1024.0),
        arena.capacity() as f64 / (1024.0 * 1024.0),
    );
    println!(
        "   {:<30} {:>18} B",
        "order record",
        std::mem::size_of::<Order>()
    );
    println!(
        "   {:<30} {:>18} B",
        "ring envelope",
        std::mem::size_of::<OrderMessage>()
    );
    println!(
        "   {:<30} {:>20}",
        "best bid",
        book.best_bid_price().map_or("-".into(), format_price)
    );
    println!(
        "   {:<30} {:>20}",
        "best ask",
        book.best_ask_price().map_or("-".into(), format_price)
    );
    println!("================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(1_000_000), "100.0000");
        assert_eq!(format_price(1_000_050), "100.0050");
        assert_eq!(format_price(5), "0.0005");
        assert_eq!(format_price(0), "0.0000");
    }
}
