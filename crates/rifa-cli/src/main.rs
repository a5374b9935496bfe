use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rifa_cli::{find_project_root, generate_seed, CliError, Config};
use rifa_core::{
    compute_integrity_hash, DrawEvent, PublishedDraw, SeededGenerator, ShortfallPolicy,
    TicketStatus, Verification,
};
use rifa_store::{
    issue_tickets, DataLock, DrawRequest, DrawService, MemoryStore, TicketHolder, TicketStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rifa")]
#[command(about = "Seeded raffle draws with verifiable results", long_about = None)]
struct Cli {
    /// Path to rifa project root
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a rifa.yml in the project directory
    Init(InitArgs),
    /// Issue new available tickets for a campaign
    Issue(IssueArgs),
    /// List the tickets of a campaign
    Tickets(TicketsArgs),
    /// Draw winners and commit the result
    Draw(DrawArgs),
    /// Show the draw history of a campaign
    History(HistoryArgs),
    /// Verify a recorded or published draw
    Verify(VerifyArgs),
    /// Claim an assigned ticket
    Claim(TicketArgs),
    /// Void an available ticket
    Cancel(TicketArgs),
    /// Compute an integrity digest
    Hash(HashArgs),
    /// Print the first values of a seeded sequence
    Sequence(SequenceArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Default campaign written to rifa.yml
    #[arg(long)]
    campaign: Option<String>,
}

#[derive(Parser)]
struct IssueArgs {
    #[arg(long)]
    campaign: Option<String>,

    /// Number of tickets to issue
    #[arg(long, short = 'n')]
    count: u32,

    /// Student the tickets are handed to
    #[arg(long)]
    student: Option<String>,

    /// Class of the student
    #[arg(long)]
    class: Option<String>,
}

#[derive(Parser)]
struct TicketsArgs {
    #[arg(long)]
    campaign: Option<String>,

    /// Only show tickets with this status
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
}

#[derive(Parser)]
struct DrawArgs {
    #[arg(long)]
    campaign: Option<String>,

    /// Draw seed (generated from the current time when omitted)
    #[arg(long)]
    seed: Option<String>,

    /// Number of winners (defaults to draw.winners in rifa.yml)
    #[arg(long, short = 'n')]
    winners: Option<usize>,

    /// Draw the whole pool when it is smaller than the winner count
    #[arg(long)]
    accept_fewer: bool,

    /// Write the published draw record to this file
    #[arg(long)]
    publish: Option<PathBuf>,
}

#[derive(Parser)]
struct HistoryArgs {
    #[arg(long)]
    campaign: Option<String>,

    /// Print published records as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct VerifyArgs {
    /// Published draw record (JSON)
    #[arg(long, conflicts_with_all = ["campaign", "sequence"])]
    file: Option<PathBuf>,

    #[arg(long)]
    campaign: Option<String>,

    /// Draw sequence number within the campaign (defaults to the latest)
    #[arg(long)]
    sequence: Option<u32>,

    /// Seed for records that withhold it
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Parser)]
struct TicketArgs {
    /// Ticket code
    code: String,

    #[arg(long)]
    campaign: Option<String>,
}

#[derive(Parser)]
struct HashArgs {
    #[arg(long)]
    seed: String,

    #[arg(long)]
    campaign: String,

    /// Winner codes in draw order
    winners: Vec<String>,
}

#[derive(Parser)]
struct SequenceArgs {
    #[arg(long)]
    seed: String,

    /// Number of values to print
    #[arg(long, short = 'n', default_value = "10")]
    count: usize,

    /// Print raw 32-bit states instead of floats
    #[arg(long)]
    raw: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Available,
    Assigned,
    Redeemed,
    Canceled,
}

impl From<StatusArg> for TicketStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Available => TicketStatus::Available,
            StatusArg::Assigned => TicketStatus::Assigned,
            StatusArg::Redeemed => TicketStatus::Redeemed,
            StatusArg::Canceled => TicketStatus::Canceled,
        }
    }
}

/// Located project: root directory and configuration.
struct Project {
    dir: PathBuf,
    config: Config,
}

impl Project {
    fn open(start_dir: &Path) -> Result<Self> {
        let dir = find_project_root(start_dir)
            .with_context(|| format!("Failed to find project root from {:?}", start_dir))?;
        let config = Config::load(&dir).with_context(|| "Failed to load rifa.yml configuration")?;
        Ok(Self { dir, config })
    }

    fn campaign(&self, flag: Option<String>) -> Result<String> {
        self.config.resolve_campaign(flag)
    }

    fn data_path(&self) -> PathBuf {
        self.config.data_path(&self.dir)
    }

    /// Lock file that mutating commands hold from load to save.
    fn data_lock(&self) -> Result<DataLock> {
        let data_path = self.data_path();
        DataLock::open(&data_path)
            .with_context(|| format!("Failed to open lock for {:?}", data_path))
    }

    fn load_store(&self) -> Result<Arc<MemoryStore>> {
        let data_path = self.data_path();
        let store = MemoryStore::open(&data_path)
            .with_context(|| format!("Failed to open ticket store at {:?}", data_path))?;
        Ok(Arc::new(store))
    }

    fn save(&self, store: &MemoryStore) -> Result<()> {
        let data_path = self.data_path();
        store
            .save(&data_path)
            .with_context(|| format!("Failed to save ticket store to {:?}", data_path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init(args) => init(&cli.project_dir, args),
        Commands::Issue(args) => issue(&cli.project_dir, args).await,
        Commands::Tickets(args) => tickets(&cli.project_dir, args).await,
        Commands::Draw(args) => run_draw(&cli.project_dir, args).await,
        Commands::History(args) => history(&cli.project_dir, args).await,
        Commands::Verify(args) => verify(&cli.project_dir, args).await,
        Commands::Claim(args) => claim(&cli.project_dir, args).await,
        Commands::Cancel(args) => cancel(&cli.project_dir, args).await,
        Commands::Hash(args) => hash(args),
        Commands::Sequence(args) => sequence(args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn init(project_dir: &Path, args: InitArgs) -> Result<()> {
    let config = Config::init(project_dir, args.campaign)
        .with_context(|| format!("Failed to initialize project in {:?}", project_dir))?;

    println!("Created {}", project_dir.join(rifa_cli::CONFIG_FILE).display());
    if let Some(campaign) = &config.campaign {
        println!("Default campaign: {}", campaign);
    }
    Ok(())
}

async fn issue(project_dir: &Path, args: IssueArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let mut lock = project.data_lock()?;
    let _guard = lock.try_acquire(&campaign)?;
    let store = project.load_store()?;
    let holder = TicketHolder {
        student_id: args.student,
        class_name: args.class,
    };

    let issued = issue_tickets(
        store.as_ref(),
        &campaign,
        args.count,
        &project.config.tickets,
        &holder,
    )
    .await
    .with_context(|| format!("Failed to issue tickets for campaign '{}'", campaign))?;

    project.save(&store)?;

    match (issued.first(), issued.last()) {
        (Some(first), Some(last)) => println!(
            "✓ Issued {} tickets for {} ({} .. {})",
            issued.len(),
            campaign,
            first.code,
            last.code
        ),
        _ => println!("No tickets issued"),
    }
    Ok(())
}

async fn tickets(project_dir: &Path, args: TicketsArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let filter = args.status.map(TicketStatus::from);

    let store = project.load_store()?;
    let tickets = store.tickets(&campaign).await?;
    let mut shown = 0;
    for ticket in tickets
        .iter()
        .filter(|t| filter.map_or(true, |status| t.status == status))
    {
        let holder = match (&ticket.student_id, &ticket.class_name) {
            (Some(student), Some(class)) => format!("{} ({})", student, class),
            (Some(student), None) => student.clone(),
            _ => String::new(),
        };
        println!("{:<12} {:<10} {}", ticket.code, ticket.status, holder);
        shown += 1;
    }

    println!("\n{} of {} tickets", shown, tickets.len());
    Ok(())
}

async fn run_draw(project_dir: &Path, args: DrawArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let mut lock = project.data_lock()?;
    let _guard = lock.try_acquire(&campaign)?;
    let store = project.load_store()?;

    let seed = args
        .seed
        .unwrap_or_else(|| generate_seed(Utc::now(), &mut rand::thread_rng()));
    let shortfall = if args.accept_fewer {
        ShortfallPolicy::AcceptFewer
    } else {
        project.config.draw.shortfall
    };
    let request = DrawRequest::new(
        &campaign,
        &seed,
        args.winners.unwrap_or(project.config.draw.winners),
    )
    .with_shortfall(shortfall);

    let service = DrawService::new(store.clone());
    let event = service
        .run_draw(&request)
        .await
        .with_context(|| format!("Draw failed for campaign '{}'", campaign))?;

    // The draw only counts once the snapshot is on disk
    project.save(&store)?;

    print_event(&event);

    if let Some(path) = args.publish {
        let published = event.publish(project.config.draw.disclose_seed);
        std::fs::write(&path, serde_json::to_string_pretty(&published)?)
            .with_context(|| format!("Failed to write published draw to {:?}", path))?;
        println!("\nPublished record: {}", path.display());
    }

    Ok(())
}

async fn history(project_dir: &Path, args: HistoryArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let events = project.load_store()?.draw_events(&campaign).await?;

    if args.json {
        let published: Vec<PublishedDraw> = events
            .iter()
            .map(|event| event.publish(project.config.draw.disclose_seed))
            .collect();
        println!("{}", serde_json::to_string_pretty(&published)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No draws recorded for {}", campaign);
    }
    for event in &events {
        print_event(event);
        println!();
    }
    Ok(())
}

async fn verify(project_dir: &Path, args: VerifyArgs) -> Result<()> {
    let published = match &args.file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read draw record {:?}", path))?;
            serde_json::from_str::<PublishedDraw>(&content)
                .with_context(|| format!("Invalid draw record {:?}", path))?
        }
        None => {
            let project = Project::open(project_dir)?;
            let campaign = project.campaign(args.campaign)?;
            let events = project.load_store()?.draw_events(&campaign).await?;

            let event = match args.sequence {
                Some(sequence) => events
                    .iter()
                    .find(|e| e.sequence == sequence)
                    .ok_or_else(|| CliError::DrawNotFound {
                        campaign: campaign.clone(),
                        sequence,
                    })?,
                None => events.last().ok_or_else(|| CliError::NoDraws {
                    campaign: campaign.clone(),
                })?,
            };
            event.publish(true)
        }
    };

    let outcome = published.verify(args.seed.as_deref())?;
    println!(
        "Draw {} of {} ({} winners)",
        published.sequence,
        published.campaign_id,
        published.winners.len()
    );

    match outcome {
        Verification::Verified => {
            println!("✓ Verified: winners and digest reproduce from the seed");
            Ok(())
        }
        Verification::DigestMismatch { expected, recorded } => {
            Err(CliError::VerificationFailed {
                reason: format!("digest mismatch (recorded {}, computed {})", recorded, expected),
            }
            .into())
        }
        Verification::WinnersMismatch { expected, recorded } => {
            Err(CliError::VerificationFailed {
                reason: format!(
                    "winners mismatch (recorded {}, replayed {})",
                    recorded.join(", "),
                    expected.join(", ")
                ),
            }
            .into())
        }
        Verification::SeedWithheld => Err(CliError::VerificationFailed {
            reason: "record withholds its seed; pass --seed".to_string(),
        }
        .into()),
    }
}

async fn claim(project_dir: &Path, args: TicketArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let mut lock = project.data_lock()?;
    let _guard = lock.try_acquire(&campaign)?;
    let store = project.load_store()?;

    let ticket = store
        .redeem_ticket(&campaign, &args.code)
        .await
        .with_context(|| format!("Failed to claim ticket '{}'", args.code))?;
    project.save(&store)?;

    println!("✓ {} is now {}", ticket.code, ticket.status);
    Ok(())
}

async fn cancel(project_dir: &Path, args: TicketArgs) -> Result<()> {
    let project = Project::open(project_dir)?;
    let campaign = project.campaign(args.campaign)?;
    let mut lock = project.data_lock()?;
    let _guard = lock.try_acquire(&campaign)?;
    let store = project.load_store()?;

    let ticket = store
        .cancel_ticket(&campaign, &args.code)
        .await
        .with_context(|| format!("Failed to cancel ticket '{}'", args.code))?;
    project.save(&store)?;

    println!("✓ {} is now {}", ticket.code, ticket.status);
    Ok(())
}

fn hash(args: HashArgs) -> Result<()> {
    println!(
        "{}",
        compute_integrity_hash(&args.seed, &args.winners, &args.campaign)
    );
    Ok(())
}

fn sequence(args: SequenceArgs) -> Result<()> {
    let mut rng = SeededGenerator::new(&args.seed);
    for _ in 0..args.count {
        if args.raw {
            println!("{}", rng.next_state());
        } else {
            println!("{}", rng.next_f64());
        }
    }
    Ok(())
}

fn print_event(event: &DrawEvent) {
    println!("{}", "=".repeat(60));
    println!("Draw {} · {}", event.sequence, event.campaign_id);
    println!("{}", "=".repeat(60));
    println!("Seed:     {}", event.seed);
    println!("Drawn at: {}", event.drawn_at.to_rfc3339());
    println!("Pool:     {} eligible tickets", event.eligible.len());
    println!(
        "Winners:  {}",
        event
            .winners
            .iter()
            .enumerate()
            .map(|(i, code)| format!("{}. {}", i + 1, code))
            .collect::<Vec<_>>()
            .join(" → ")
    );
    if event.shortfall() > 0 {
        println!(
            "Shortfall: {} of {} requested winners could not be drawn",
            event.shortfall(),
            event.requested
        );
    }
    println!("Digest:   {}", event.digest);
}
