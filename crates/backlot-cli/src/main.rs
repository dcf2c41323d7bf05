#![forbid(unsafe_code)]

use backlot_funnel::{
    diagnose, AnalysisView, CheckStatus, Funnel, FunnelConfig, Resolution, ViewState,
};
use backlot_model::{LeadId, LeadRecord, LeadSubmission, NewLead};
use backlot_store::{provision, LeadStore, StepStatus, StoreError, StoreErrorKind};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const REGION_NOTICE: &str = "Note: Our services are currently only available in Massachusetts.";

#[derive(Parser)]
#[command(name = "backlot")]
#[command(about = "Backlot lead-funnel operations CLI")]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a contact + address form and print the issued id
    Submit {
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        zip: Option<String>,
        /// Literal address; overrides assembly from components
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// Resolve a property analysis, falling back to the local mirror
    Resolve {
        #[arg(long)]
        id: Option<String>,
        /// Render mirror data immediately; the server fetch upgrades it
        #[arg(long, default_value_t = false)]
        skip_loading: bool,
    },
    /// Provision the hosted store (table, trigger, row security)
    Setup,
    /// Diagnose the configured deployment
    Doctor,
}

/// Stand-in store used when the endpoint env vars are absent, so the
/// mirror-backed paths keep working offline. Every operation fails the
/// way an unreachable store would.
struct UnconfiguredStore;

impl UnconfiguredStore {
    fn error() -> StoreError {
        StoreError::new(
            StoreErrorKind::Connectivity,
            "store not configured; set BACKLOT_STORE_URL and BACKLOT_STORE_ANON_KEY",
        )
    }
}

impl LeadStore for UnconfiguredStore {
    fn check_connectivity(&self) -> Result<(), StoreError> {
        Err(Self::error())
    }
    fn insert_lead(&self, _lead: &NewLead) -> Result<LeadRecord, StoreError> {
        Err(Self::error())
    }
    fn fetch_lead(&self, _id: &LeadId) -> Result<LeadRecord, StoreError> {
        Err(Self::error())
    }
    fn find_satellite_image(&self, _address: &str) -> Result<Option<String>, StoreError> {
        Err(Self::error())
    }
    fn delete_lead(&self, _id: &LeadId) -> Result<(), StoreError> {
        Err(Self::error())
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_funnel(config: FunnelConfig) -> Arc<Funnel> {
    let store: Arc<dyn LeadStore> = match config.build_store() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(error = %err, "falling back to mirror-only operation");
            Arc::new(UnconfiguredStore)
        }
    };
    Arc::new(Funnel::new(config, store))
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    let config = FunnelConfig::from_env();

    match cli.command {
        Commands::Submit {
            ref street,
            ref city,
            ref state,
            ref zip,
            ref address,
            ref first_name,
            ref last_name,
            ref email,
        } => {
            let form = LeadSubmission {
                address: address.clone(),
                street: street.clone(),
                city: city.clone(),
                state: state.clone(),
                zip_code: zip.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email: email.clone(),
            };
            run_submit(&cli, build_funnel(config), &form)
        }
        Commands::Resolve {
            ref id,
            skip_loading,
        } => {
            let id = id.as_deref().and_then(|raw| LeadId::parse(raw).ok());
            run_resolve(&cli, build_funnel(config), id, skip_loading)
        }
        Commands::Setup => run_setup(&cli, &config),
        Commands::Doctor => run_doctor(&cli, &config),
    }
}

fn run_submit(cli: &Cli, funnel: Arc<Funnel>, form: &LeadSubmission) -> ProcessExitCode {
    match funnel.submit(form) {
        Ok(receipt) => {
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "lead_id": receipt.lead_id,
                        "address": receipt.address,
                        "service_available": receipt.service_available,
                    })
                );
            } else if !cli.quiet {
                println!("Submitted: {}", receipt.address);
                println!("Submission id: {}", receipt.lead_id);
                if receipt.service_available {
                    println!("We'll analyze your property and get back to you soon.");
                } else {
                    println!("{REGION_NOTICE}");
                }
            }
            ProcessExitCode::SUCCESS
        }
        Err(err) => {
            fail(cli, "submission failed", &err.to_string());
            ProcessExitCode::FAILURE
        }
    }
}

fn run_resolve(
    cli: &Cli,
    funnel: Arc<Funnel>,
    id: Option<LeadId>,
    skip_loading: bool,
) -> ProcessExitCode {
    let view = AnalysisView::new(Arc::clone(&funnel));
    view.load(id, skip_loading);
    let first = view.state();
    render_state(cli, &first);

    if skip_loading {
        view.wait_for_upgrade();
        let settled = view.state();
        if settled != first {
            if !cli.quiet && !cli.json {
                println!("--- updated from server ---");
            }
            render_state(cli, &settled);
        }
        return exit_for_state(&settled);
    }
    exit_for_state(&first)
}

fn exit_for_state(state: &ViewState) -> ProcessExitCode {
    match state {
        ViewState::Error(_) => ProcessExitCode::FAILURE,
        _ => ProcessExitCode::SUCCESS,
    }
}

fn render_state(cli: &Cli, state: &ViewState) {
    match state {
        ViewState::Loading => {}
        ViewState::Available(resolution) => {
            if cli.json {
                print_resolution_json(state.as_str(), resolution);
            } else if !cli.quiet {
                print_record(resolution);
            }
        }
        ViewState::Unavailable(resolution) => {
            if cli.json {
                print_resolution_json(state.as_str(), resolution);
            } else if !cli.quiet {
                println!("Property analysis for {}", resolution.record.address);
                println!("{REGION_NOTICE}");
            }
        }
        ViewState::Error(message) => fail(cli, "resolution failed", message),
        _ => {}
    }
}

fn print_resolution_json(state: &str, resolution: &Resolution) {
    println!(
        "{}",
        json!({
            "state": state,
            "source": resolution.source.as_str(),
            "record": resolution.record,
        })
    );
}

fn print_record(resolution: &Resolution) {
    let record = &resolution.record;
    println!("Property analysis for {}", record.address);
    if resolution.source == backlot_funnel::ResolutionSource::Mirror {
        println!("(showing locally saved data; the full analysis is still processing)");
    }
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  Lot size:     {}", field(&record.lot_size));
    println!("  Zoning:       {}", field(&record.zoning));
    println!("  ADU allowed:  {}", if record.allows_adu { "yes" } else { "no" });
    println!("  Max ADU size: {}", field(&record.max_adu_size));
    println!(
        "  Setbacks:     front {}, back {}, sides {}",
        field(&record.setback_front),
        field(&record.setback_back),
        field(&record.setback_sides)
    );
    for note in &record.additional_notes {
        println!("  - {note}");
    }
    if let Some(url) = &record.satellite_image_url {
        println!("  Satellite image: {url}");
    }
    println!(
        "  Map: {}",
        backlot_funnel::imagery::maps_search_url(&record.address)
    );
}

fn run_setup(cli: &Cli, config: &FunnelConfig) -> ProcessExitCode {
    let store = match config.build_store() {
        Ok(store) => store,
        Err(err) => {
            fail(cli, "setup needs a configured store", &err.to_string());
            return ProcessExitCode::from(2);
        }
    };
    let report = provision(&store);
    if cli.json {
        let steps: Vec<_> = report
            .steps
            .iter()
            .map(|s| json!({"name": s.name, "status": s.status.as_str(), "detail": s.detail}))
            .collect();
        println!("{}", json!({"steps": steps, "succeeded": report.succeeded()}));
    } else if !cli.quiet {
        for step in &report.steps {
            println!("[{}] {}: {}", step.status.as_str(), step.name, step.detail);
        }
        if report.succeeded() {
            println!("Setup completed. Try submitting a property again.");
        } else if report
            .steps
            .iter()
            .any(|s| s.status == StepStatus::Manual)
        {
            println!("Some steps need manual SQL; see the details above.");
        }
    }
    if report.succeeded() {
        ProcessExitCode::SUCCESS
    } else {
        ProcessExitCode::FAILURE
    }
}

fn run_doctor(cli: &Cli, config: &FunnelConfig) -> ProcessExitCode {
    let store = match config.build_store() {
        Ok(store) => store,
        Err(err) => {
            fail(cli, "doctor needs a configured store", &err.to_string());
            return ProcessExitCode::from(2);
        }
    };
    let report = diagnose(&store, config);
    if cli.json {
        let checks: Vec<_> = report
            .checks
            .iter()
            .map(|c| json!({"name": c.name, "status": c.status.as_str(), "detail": c.detail}))
            .collect();
        println!("{}", json!({"checks": checks, "healthy": report.healthy()}));
    } else if !cli.quiet {
        for check in &report.checks {
            let marker = match check.status {
                CheckStatus::Passed => "ok",
                CheckStatus::Warned => "warn",
                CheckStatus::Failed => "FAIL",
                other => other.as_str(),
            };
            println!("[{marker}] {}: {}", check.name, check.detail);
        }
    }
    if report.healthy() {
        ProcessExitCode::SUCCESS
    } else {
        ProcessExitCode::FAILURE
    }
}

fn fail(cli: &Cli, label: &str, message: &str) {
    if cli.json {
        println!("{}", json!({"error": {"label": label, "message": message}}));
    } else {
        eprintln!("{label}: {message}");
    }
}
