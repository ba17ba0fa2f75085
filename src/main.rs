// wallpool - rotating desktop wallpaper pool
// Each run either advances to the next stored Pexels photo or, when the
// pool is nearly exhausted, fetches a fresh batch.

use colored::*;
use log::{error, info, warn};

mod cli;
mod config;
mod driver;
mod error;
mod fetch;
mod ledger;
mod persist;
mod pexels;
mod pool;
mod queries;
mod rotation;
mod setter;

use clap::Parser;

use cli::{Args, Command};
use config::Config;
use driver::{Decision, Outcome, RotationDriver};
use error::{Result, WallpoolError};
use fetch::{fetch_batch, BatchReport, Fetcher};
use ledger::HashLedger;
use pexels::PexelsClient;
use pool::ImagePool;
use queries::QueryTerms;
use rotation::{count_unseen, next_wallpaper, RotationPointer};
use setter::CommandSetter;

// ============================================================================
// Main Application
// ============================================================================
struct WallpoolCli {
    config: Config,
    pool: ImagePool,
    pointer: RotationPointer,
    setter: CommandSetter,
}

impl WallpoolCli {
    fn new(config: Config) -> Result<Self> {
        let pool = ImagePool::new(&config.pictures_dir);
        pool.ensure_dir().map_err(|e| {
            WallpoolError::persistence(&config.pictures_dir, format!("cannot create directory: {}", e))
        })?;

        Ok(WallpoolCli {
            pointer: RotationPointer::new(&config.pointer_file),
            setter: CommandSetter::new(&config.switch_cmd),
            pool,
            config,
        })
    }

    fn driver(&self) -> RotationDriver<'_> {
        RotationDriver {
            pool: &self.pool,
            pointer: &self.pointer,
            setter: &self.setter,
            threshold: self.config.threshold,
            batch_size: self.config.batch_size,
        }
    }

    // ========================================================================
    // ROTATE Command - advance or refill
    // ========================================================================
    fn rotate(&self, dry_run: bool) -> Result<()> {
        // The ledger is written straight back as an integrity check. A
        // corrupt ledger still allows rotating, but not fetching.
        let ledger = match HashLedger::load(&self.config.hashes_file) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                error!("Error loading image hashes: {}", e);
                Err(e)
            }
        };

        let driver = self.driver();
        if dry_run {
            match driver.plan()? {
                Decision::NeedsFetch { unseen } => info!(
                    "Dry run: {} unseen, would fetch {} images",
                    unseen, self.config.batch_size
                ),
                Decision::HasBacklog { unseen, next } => info!(
                    "Dry run: {} unseen, would set {}",
                    unseen,
                    next.map(|n| n.file_name).unwrap_or_else(|| "nothing".into())
                ),
            }
            return Ok(());
        }

        if let Ok(ledger) = &ledger {
            if let Err(e) = ledger.save() {
                warn!("Error saving image hashes: {}", e);
            }
        }

        let outcome = driver.run(|size| {
            let ledger = ledger?;
            let report = self.fetch(&ledger, size);
            if let Err(e) = ledger.save() {
                error!("Error saving image hashes: {}", e);
            }
            report
        })?;

        match outcome {
            Outcome::Fetched(report) => {
                if report.primary.is_none() {
                    warn!("Primary fetch failed, wallpaper unchanged");
                }
                println!(
                    "{}",
                    format!("✓ Downloaded {} new wallpapers", report.stored.len()).green()
                );
            }
            Outcome::Rotated(image) => {
                println!("{}", format!("✓ Wallpaper set: {}", image.file_name).green());
            }
            Outcome::NothingToRotate => {
                println!("{}", "! Nothing to rotate to".cyan());
            }
        }
        Ok(())
    }

    fn fetch(&self, ledger: &HashLedger, size: usize) -> Result<BatchReport> {
        let source = PexelsClient::new(self.config.require_api_key()?, &self.config.endpoint)?;
        let queries = QueryTerms::load(&self.config.queries_file)?;
        info!("Loaded {} query terms", queries.len());

        let fetcher = Fetcher {
            source: &source,
            queries: &queries,
            ledger,
            pool: &self.pool,
            pointer: &self.pointer,
            setter: &self.setter,
        };
        fetch_batch(&fetcher, size)
    }

    // ========================================================================
    // STATUS Command
    // ========================================================================
    fn status(&self) -> Result<()> {
        let listing = self.pool.listing()?;
        let current = self.pointer.current()?;
        let unseen = count_unseen(&listing, current.as_deref());
        let next = next_wallpaper(&listing, current.as_deref());

        println!();
        println!("{}", "+------------------------------------------+".cyan());
        println!("{}", "|             Wallpool Status              |".cyan().bold());
        println!("{}", "+------------------------------------------+".cyan());
        println!("{} {}", "Directory:".cyan(), self.pool.dir().display());
        println!("{} {}", "Total wallpapers:".cyan(), listing.len().to_string().bright_green());
        println!("{} {}", "Unseen:".cyan(), unseen.to_string().bright_green());
        match HashLedger::load(&self.config.hashes_file) {
            Ok(ledger) => println!("{} {}", "Known images:".cyan(), ledger.len().to_string().bright_green()),
            Err(e) => println!("{} {}", "Known images:".cyan(), format!("unreadable ({})", e).red()),
        }
        println!(
            "{} {}",
            "Current:".cyan(),
            current.as_deref().unwrap_or("(none)")
        );
        println!(
            "{} {}",
            "Next:".cyan(),
            next.map(|n| n.file_name.as_str()).unwrap_or("(none)")
        );
        if unseen < self.config.threshold {
            println!("{}", "→ Next run will fetch new visuals".bright_cyan());
        }
        println!();
        Ok(())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let cli = match Config::from_args(&args).and_then(WallpoolCli::new) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", format!("[ ERROR ] Error initializing: {}", e).red());
            std::process::exit(1);
        }
    };

    let result = match args.command.clone().unwrap_or_default() {
        Command::Rotate { dry_run } => cli.rotate(dry_run),
        Command::Status => cli.status(),
    };

    if let Err(e) = result {
        eprintln!("{}", format!("[ ERROR ] {}", e).red());
        std::process::exit(1);
    }
}
