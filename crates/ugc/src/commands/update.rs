//! `ugc update` command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tokio_util::sync::CancellationToken;
use ugc_config::{BackoffKind, CliSettings, Config, PollingConfig, SimulationConfig};
use ugc_platform::{AppId, ItemId, Platform, ResultCode, SimulatedPlatform, UpdateStatus};
use ugc_publish::{
    Backoff, DependencyChanges, ItemIdentity, ItemOrchestrator, Poller, PublishConfig,
    UpdateOutcome, UpdateRequest,
};

use crate::error::CliError;
use crate::output::Output;

/// Platform implementation to publish through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Backend {
    /// In-process platform configured by the `[simulation]` section.
    Simulated,
}

/// Arguments for the update command.
#[derive(Args)]
pub(crate) struct UpdateArgs {
    /// Application id (overrides config).
    #[arg(short = 'a', long, env = "UGC_APP_ID")]
    app_id: Option<u32>,

    /// Workshop item id to update (overrides config).
    #[arg(short = 'w', long, env = "UGC_WORKSHOP_ID")]
    workshop_id: Option<u64>,

    /// Create a new item instead of updating an existing one.
    #[arg(short = 'n', long)]
    new: bool,

    /// Text file with the item description.
    #[arg(short = 'd', long)]
    description: Option<PathBuf>,

    /// Preview image, at most 1 MB.
    #[arg(short = 'p', long)]
    preview: Option<PathBuf>,

    /// Directory with the item content.
    #[arg(short = 'c', long)]
    content: Option<PathBuf>,

    /// Item title.
    #[arg(short = 't', long)]
    title: Option<String>,

    /// Visibility: 0 public, 1 friends only, 2 private, 3 unlisted.
    #[arg(short = 'v', long, allow_negative_numbers = true)]
    visibility: Option<i64>,

    /// Comma-separated tags. An empty string clears them.
    #[arg(short = 'T', long)]
    tags: Option<String>,

    /// Text file with the patch note.
    #[arg(short = 'P', long = "patchnote")]
    patch_note: Option<PathBuf>,

    /// Language code of the title and description (see `ugc languages`).
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// App ids the item should depend on.
    #[arg(long, value_delimiter = ',')]
    add_app_dependency: Vec<u32>,

    /// App ids the item should no longer depend on.
    #[arg(long, value_delimiter = ',')]
    remove_app_dependency: Vec<u32>,

    /// Workshop item ids the item should depend on.
    #[arg(long, value_delimiter = ',')]
    add_item_dependency: Vec<u64>,

    /// Workshop item ids the item should no longer depend on.
    #[arg(long, value_delimiter = ',')]
    remove_item_dependency: Vec<u64>,

    /// Path to configuration file (default: auto-discover ugc.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Platform backend.
    #[arg(long, value_enum, default_value_t = Backend::Simulated)]
    backend: Backend,

    /// Print the outcome as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short = 'V', long)]
    pub(crate) verbose: bool,
}

impl UpdateArgs {
    /// Execute the update command.
    ///
    /// Succeeds whenever the update job reaches its terminal status, even if
    /// the platform reported the submission as failed.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the run stops early.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            app_id: self.app_id,
            workshop_id: self.workshop_id,
            language: self.language.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let identity = ItemIdentity {
            app_id: AppId(config.item_resolved.app_id.unwrap_or(0)),
            item_id: ItemId(config.item_resolved.workshop_id.unwrap_or(0)),
            is_new: self.new,
        };
        let request = self.build_request(config.item_resolved.language.clone());
        let platform = create_platform(self.backend, &config.simulation)?;

        let cancel = CancellationToken::new();
        cancel_on_ctrlc(cancel.clone());

        if identity.is_new {
            output.info(&format!("Creating a new item for app {}...", identity.app_id));
        } else {
            output.info(&format!(
                "Updating item {} for app {}...",
                identity.item_id, identity.app_id
            ));
        }

        let outcome = ItemOrchestrator::new(platform.as_ref(), publish_config(&config.polling))
            .with_cancel(cancel)
            .run(identity, &request)?;

        if self.json {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &outcome)?;
            writeln!(stdout)?;
        } else {
            print_update_result(&output, &outcome);
        }

        Ok(())
    }

    fn build_request(&self, language: Option<String>) -> UpdateRequest {
        UpdateRequest {
            description: self.description.clone(),
            preview: self.preview.clone(),
            content: self.content.clone(),
            title: self.title.clone(),
            visibility: self.visibility,
            tags: self.tags.clone(),
            language,
            app_dependencies: DependencyChanges {
                add: self.add_app_dependency.iter().copied().map(AppId).collect(),
                remove: self.remove_app_dependency.iter().copied().map(AppId).collect(),
            },
            item_dependencies: DependencyChanges {
                add: self.add_item_dependency.iter().copied().map(ItemId).collect(),
                remove: self.remove_item_dependency.iter().copied().map(ItemId).collect(),
            },
            patch_note: self.patch_note.clone(),
        }
    }
}

fn create_platform(
    backend: Backend,
    simulation: &SimulationConfig,
) -> Result<Box<dyn Platform>, CliError> {
    match backend {
        Backend::Simulated => Ok(Box::new(simulated_platform(simulation)?)),
    }
}

fn simulated_platform(simulation: &SimulationConfig) -> Result<SimulatedPlatform, CliError> {
    let agreement = simulation.needs_user_agreement;
    let mut platform = SimulatedPlatform::new()
        .with_create_result(ResultCode::OK, agreement)
        .with_submit_result(ResultCode::OK, agreement);

    if let Some(pumps) = simulation.completion_pumps {
        platform = platform.with_completion_pumps(pumps);
    }
    if let Some(item_id) = simulation.issued_item_id {
        platform = platform.with_issued_item_id(ItemId(item_id));
    }
    if let Some(progress) = &simulation.progress {
        let statuses = progress
            .iter()
            .map(|name| name.parse::<UpdateStatus>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CliError::Validation(format!("simulation.progress: {err}")))?;
        platform = platform.with_progress(statuses);
    }

    Ok(platform)
}

fn publish_config(polling: &PollingConfig) -> PublishConfig {
    let backoff = match polling.backoff {
        BackoffKind::Fixed => Backoff::Fixed,
        BackoffKind::Exponential => Backoff::Exponential {
            max: polling.max_interval(),
        },
    };
    PublishConfig {
        creation: Poller {
            interval: polling.interval(),
            backoff,
            timeout: polling.creation_timeout(),
        },
        update: Poller {
            interval: polling.interval(),
            backoff,
            timeout: polling.update_timeout(),
        },
        outcome_grace: polling.outcome_grace(),
    }
}

/// Cancel in-progress waits on Ctrl+C. The session still closes.
fn cancel_on_ctrlc(cancel: CancellationToken) {
    if let Err(err) = ctrlc::set_handler(move || cancel.cancel()) {
        tracing::warn!(error = %err, "Failed to install Ctrl+C handler");
    }
}

fn print_update_result(output: &Output, outcome: &UpdateOutcome) {
    if outcome.created {
        output.highlight(&format!("\nCreated item {}", outcome.item_id));
    } else {
        output.highlight(&format!("\nUpdated item {}", outcome.item_id));
    }

    let statuses: Vec<String> = outcome.observed.iter().map(ToString::to_string).collect();
    if statuses.is_empty() {
        output.field("Progress", "no status reported");
    } else {
        output.field("Progress", &statuses.join(" -> "));
    }

    output.submit_outcome(&outcome.submit);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: UpdateArgs,
    }

    fn parse(args: &[&str]) -> UpdateArgs {
        let mut argv = vec!["ugc"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&[
            "-a", "123", "-w", "999", "-t", "Hello", "-v", "1", "-T", "x, y", "-L", "french",
        ]);

        assert_eq!(args.app_id, Some(123));
        assert_eq!(args.workshop_id, Some(999));
        assert!(!args.new);

        let request = args.build_request(args.language.clone());
        assert_eq!(
            request,
            UpdateRequest {
                title: Some("Hello".to_owned()),
                visibility: Some(1),
                tags: Some("x, y".to_owned()),
                language: Some("french".to_owned()),
                ..UpdateRequest::default()
            }
        );
    }

    #[test]
    fn test_negative_visibility_accepted_by_parser() {
        let args = parse(&["-a", "1", "-v", "-1"]);
        assert_eq!(args.visibility, Some(-1));
    }

    #[test]
    fn test_dependency_lists() {
        let args = parse(&[
            "--add-app-dependency",
            "10,20",
            "--remove-item-dependency",
            "7",
            "--remove-item-dependency",
            "8",
        ]);

        let request = args.build_request(None);

        assert_eq!(request.app_dependencies.add, vec![AppId(10), AppId(20)]);
        assert!(request.app_dependencies.remove.is_empty());
        assert_eq!(request.item_dependencies.remove, vec![ItemId(7), ItemId(8)]);
    }

    #[test]
    fn test_new_and_patchnote_flags() {
        let args = parse(&["-n", "-P", "notes.txt", "-V", "--json"]);

        assert!(args.new);
        assert!(args.verbose);
        assert!(args.json);
        assert_eq!(args.patch_note, Some(PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_publish_config_from_polling() {
        let polling = PollingConfig {
            interval_ms: 200,
            backoff: BackoffKind::Exponential,
            max_interval_ms: 1600,
            creation_timeout_secs: 30,
            update_timeout_secs: 90,
            outcome_grace_ms: 700,
        };

        let config = publish_config(&polling);

        assert_eq!(
            config.update,
            Poller {
                interval: Duration::from_millis(200),
                backoff: Backoff::Exponential {
                    max: Duration::from_millis(1600)
                },
                timeout: Duration::from_secs(90),
            }
        );
        assert_eq!(config.creation.timeout, Duration::from_secs(30));
        assert_eq!(config.outcome_grace, Duration::from_millis(700));
    }

    #[test]
    fn test_simulated_platform_rejects_unknown_status() {
        let simulation = SimulationConfig {
            progress: Some(vec!["uploading".to_owned()]),
            ..SimulationConfig::default()
        };

        let err = simulated_platform(&simulation).err().unwrap();

        assert!(err.to_string().contains("unknown update status: uploading"));
    }

    #[test]
    fn test_simulated_platform_from_config_runs() {
        let simulation = SimulationConfig {
            completion_pumps: Some(2),
            progress: Some(vec!["preparing_config".to_owned()]),
            needs_user_agreement: false,
            issued_item_id: Some(55),
        };
        let platform = simulated_platform(&simulation).unwrap();
        let config = PublishConfig {
            creation: Poller::fixed(Duration::from_millis(1), Duration::from_secs(5)),
            update: Poller::fixed(Duration::from_millis(1), Duration::from_secs(5)),
            outcome_grace: Duration::from_millis(50),
        };

        let outcome = ItemOrchestrator::new(&platform, config)
            .run(ItemIdentity::create(AppId(9)), &UpdateRequest::default())
            .unwrap();

        assert_eq!(outcome.item_id, ItemId(55));
        assert_eq!(outcome.observed, vec![UpdateStatus::PreparingConfig]);
    }
}
