/*!
 * Compat Probe - Main Entry Point
 *
 * Reports which path each primitive resolved to on this host and runs a
 * short self test:
 * - Wait/wake round trip across two threads
 * - 64-byte random fill
 *
 * Pass `--json` for machine-readable output.
 */

use ai_os_compat::{
    address_waiter, init_tracing, random_generator, RandomCapabilities, WaitCapabilities,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Serialize)]
struct ProbeReport {
    wait_strategy: &'static str,
    wait: WaitCapabilities,
    random_provider: &'static str,
    random: RandomCapabilities,
    wake_latency_ms: u64,
    random_sample: String,
}

fn wait_wake_round_trip() -> miette::Result<Duration> {
    let flag = Arc::new(AtomicU32::new(0));

    let writer = {
        let flag = flag.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            flag.store(1, Ordering::Release);
            address_waiter().wake_all(flag.as_ref());
        })
    };

    let start = Instant::now();
    address_waiter().wait(flag.as_ref(), 0, 5000u32)?;
    let elapsed = start.elapsed();

    writer
        .join()
        .map_err(|_| miette::miette!("writer thread panicked"))?;
    Ok(elapsed)
}

fn main() -> miette::Result<()> {
    init_tracing();

    let json = std::env::args().skip(1).any(|arg| arg == "--json");

    info!("Resolving compat capabilities...");
    let wait = *address_waiter().capabilities();
    let random = *random_generator().capabilities();

    let latency = wait_wake_round_trip()?;

    let mut sample = [0u8; 64];
    random_generator().fill(&mut sample)?;

    let report = ProbeReport {
        wait_strategy: address_waiter().strategy_name(),
        wait,
        random_provider: random.provider_name(),
        random,
        wake_latency_ms: latency.as_millis() as u64,
        random_sample: sample.iter().map(|b| format!("{:02x}", b)).collect(),
    };

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| miette::miette!("{}", e))?;
        println!("{}", out);
    } else {
        println!("wait strategy   : {}", report.wait_strategy);
        match report.wait.native {
            Some(native) => println!("native module   : {}", native.module),
            None => println!(
                "fallback        : {} every {:?}",
                report.wait.config.fallback, report.wait.config.poll_interval
            ),
        }
        println!("keyed event     : {}", report.wait.keyed_event.is_some());
        println!("random provider : {}", report.random_provider);
        println!("max chunk       : {}", report.random.max_chunk);
        println!("wake latency    : {} ms", report.wake_latency_ms);
        println!("random sample   : {}", report.random_sample);
    }

    Ok(())
}
