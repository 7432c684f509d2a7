//! `driftid` generates drift-compensated 64-bit IDs from the command line and
//! decodes existing IDs back into their fields.
//!
//! ```bash
//! driftid --worker-id 3 generate --count 5
//! DRIFTID_WORKER_ID=3 driftid generate --count 2 --json
//! driftid decode 2369518717321989 --json
//! ```

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use config::{CliArgs, CliConfig, Clock, Command};
use driftid::{Config, Generator, IdGenerator, IdParts};
use serde::Serialize;

// mimalloc outperforms the musl allocator by a wide margin.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// One ID with its decoded fields, as printed by `--json`.
#[derive(Serialize)]
struct DecodedId {
    id: u64,
    #[serde(flatten)]
    parts: IdParts,
    timestamp_ms: u64,
}

impl DecodedId {
    fn new(config: &Config, id: u64) -> Self {
        let parts = config.decode(id);
        Self {
            id,
            parts,
            timestamp_ms: config.timestamp_millis(&parts),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    telemetry::init_tracing()?;
    tracing::debug!(?config, "starting");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match config.command {
        Command::Generate { count, json } => {
            let generator = Generator::new(config.generator, Clock::from(config.clock));
            tracing::debug!(
                configured = %config.generator.method(),
                active = %generator.active_method(),
                worker_id = config.generator.worker_id(),
                "generator ready"
            );

            generate(&generator, &config.generator, count, json, &mut out)?;
        }
        Command::Decode { ids, json } => {
            for id in ids {
                write_id(&mut out, &config.generator, id, json)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Writes `count` fresh IDs, each as soon as it is generated.
fn generate(
    generator: &impl IdGenerator,
    config: &Config,
    count: usize,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for _ in 0..count {
        let id = generator.try_next_id()?;
        write_id(out, config, id, json)?;
    }
    Ok(())
}

fn write_id(out: &mut impl Write, config: &Config, id: u64, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &DecodedId::new(config, id))?;
        writeln!(out)?;
    } else {
        let parts = config.decode(id);
        writeln!(
            out,
            "{id}\t{parts}\ttimestamp_ms={}",
            config.timestamp_millis(&parts)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftid::{Error, Options};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Hands out `1, 2, ...` and fails once `limit` IDs have been issued.
    struct LimitedGenerator {
        issued: AtomicU64,
        limit: u64,
    }

    impl IdGenerator for LimitedGenerator {
        fn try_next_id(&self) -> driftid::Result<u64> {
            let next = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
            if next > self.limit {
                return Err(Error::Accelerator("exhausted".into()));
            }
            Ok(next)
        }
    }

    fn config() -> Config {
        Options::default().validate().unwrap()
    }

    #[test]
    fn generate_writes_each_id_before_the_next_is_requested() {
        let generator = LimitedGenerator {
            issued: AtomicU64::new(0),
            limit: 2,
        };
        let mut out = Vec::new();

        let err = generate(&generator, &config(), 5, false, &mut out).unwrap_err();
        assert!(err.to_string().contains("exhausted"), "{err}");

        let written = String::from_utf8(out).unwrap();
        let ids: Vec<&str> = written
            .lines()
            .map(|line| line.split('\t').next().unwrap())
            .collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(generator.issued.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn json_lines_carry_decoded_fields() {
        let config = Options::default().with_worker_id(3).validate().unwrap();
        let id = config.encode(100, 5);
        let mut out = Vec::new();
        write_id(&mut out, &config, id, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["id"], id);
        assert_eq!(value["time_tick"], 100);
        assert_eq!(value["worker_id"], 3);
        assert_eq!(value["sequence"], 5);
        assert_eq!(value["timestamp_ms"], config.base_time() + 100);
    }
}
