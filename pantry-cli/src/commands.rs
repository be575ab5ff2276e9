//! Command handlers
//!
//! Command output goes to stdout; diagnostics go through tracing.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use pantry_common::config::{
    normalize_base_url, write_toml_config, ConfigOverrides, Settings, TomlConfig,
};
use pantry_common::time;
use pantry_core::builder::{DraftEdits, RecordBuilder};
use pantry_core::capture::{CaptureOutcome, CaptureSession, FileImageSource};
use pantry_core::classifier::classify;
use pantry_core::credential::{CredentialProvider, EnvCredential, ENV_TOKEN};
use pantry_core::error::{RemoteError, StoreError};
use pantry_core::extraction::{ExtractionClient, HttpExtractionClient};
use pantry_core::gateway::HttpSyncGateway;
use pantry_core::model::CaptureSource;
use pantry_core::recipe::ingredient_query;
use pantry_core::store::IngredientStore;
use pantry_core::waste::WasteReport;
use pantry_core::{Draft, Ingredient};
use std::path::PathBuf;
use std::sync::Arc;

/// Remote clients and the local inventory for one invocation
pub struct App {
    store: IngredientStore,
    builder: RecordBuilder,
    extractor: Arc<dyn ExtractionClient>,
}

impl App {
    pub fn new(settings: &Settings) -> Result<Self> {
        let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredential);
        if credentials.current().is_none() {
            bail!("Not signed in: set {} to your session token", ENV_TOKEN);
        }

        let gateway = HttpSyncGateway::new(
            settings.api_base_url.as_str(),
            settings.request_timeout,
            Arc::clone(&credentials),
        )
        .context("Failed to create API client")?;
        let extractor = HttpExtractionClient::new(
            settings.api_base_url.as_str(),
            settings.request_timeout,
            credentials,
        )
        .context("Failed to create image analysis client")?;

        Ok(Self {
            store: IngredientStore::new(Arc::new(gateway)),
            builder: RecordBuilder::new(settings.default_quantity.as_str()),
            extractor: Arc::new(extractor),
        })
    }

    async fn fetch(&self) -> Result<Vec<Ingredient>> {
        self.store
            .refresh()
            .await
            .map_err(|e| store_failure("Failed to fetch ingredients", e))
    }

    pub async fn list(&self) -> Result<()> {
        let items = self.fetch().await?;
        if items.is_empty() {
            println!("No ingredients yet");
            return Ok(());
        }

        let today = time::today_local();
        for item in &items {
            println!("{}", list_row(item, today));
        }
        Ok(())
    }

    pub async fn waste(&self, as_of: Option<NaiveDate>, json: bool) -> Result<()> {
        let items = self.fetch().await?;
        let report = WasteReport::build(&items, as_of.unwrap_or_else(time::today_local));

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Waste report for {}", report.as_of);
        if report.is_empty() {
            println!("No ingredients yet");
            return Ok(());
        }
        println!("{}", waste_summary(&report));
        for entry in &report.entries {
            println!(
                "{:>6}  {:<24} {:<14} {}",
                entry.ingredient.id,
                entry.ingredient.name,
                entry.classification.risk,
                entry.classification.describe()
            );
        }
        Ok(())
    }

    /// Analyze `image`, show the resulting draft and save it when `confirmed`
    pub async fn scan(
        &self,
        image: PathBuf,
        source: CaptureSource,
        edits: DraftEdits,
        confirmed: bool,
    ) -> Result<()> {
        let session = CaptureSession::new(
            Arc::new(FileImageSource::new(Some(image))),
            Arc::clone(&self.extractor),
        );
        let outcome = session.capture(source).await.context("Failed to read image")?;

        let extraction = match &outcome {
            CaptureOutcome::Cancelled | CaptureOutcome::Superseded { .. } => {
                println!("Capture cancelled");
                return Ok(());
            }
            CaptureOutcome::ExtractionFailed { error, .. } => {
                println!("Image analysis failed ({}), continuing with manual entry", error);
                None
            }
            CaptureOutcome::Extracted { result, .. } => {
                if !result.labels.is_empty() {
                    println!("Detected: {}", result.labels.join(", "));
                }
                Some(result)
            }
        };

        let draft = self.builder.build(extraction, edits);
        print_draft(&draft);

        if !confirmed {
            println!("Not saved. Re-run with --yes to add this ingredient.");
            return Ok(());
        }
        self.save(draft).await
    }

    pub async fn add(&self, edits: DraftEdits) -> Result<()> {
        let draft = self.builder.build(None, edits);
        self.save(draft).await
    }

    async fn save(&self, draft: Draft) -> Result<()> {
        let saved = self
            .store
            .commit(draft)
            .await
            .map_err(|e| store_failure("Failed to save ingredient", e))?;
        println!("Saved #{} {}", saved.id, saved.name);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.fetch().await?;
        let Some(item) = self.store.get(id).await else {
            bail!("No ingredient with id {}", id);
        };

        self.store
            .delete(id)
            .await
            .map_err(|e| store_failure(&format!("Failed to delete {}", item.name), e))?;
        println!("Deleted #{} {}", id, item.name);
        Ok(())
    }

    pub async fn recipe_query(&self) -> Result<()> {
        let items = self.fetch().await?;
        match ingredient_query(&items) {
            Some(query) => println!("{}", query),
            None => println!("No ingredients available"),
        }
        Ok(())
    }
}

/// Attach `action` to a store failure, telling the user when retrying may help
fn store_failure(action: &str, error: StoreError) -> anyhow::Error {
    let hint = if error.remote().is_some_and(RemoteError::is_retryable) {
        " (temporary failure, try again)"
    } else {
        ""
    };
    anyhow!(error).context(format!("{}{}", action, hint))
}

/// One inventory line; status uses the same calendar-day count as the waste report
fn list_row(item: &Ingredient, today: NaiveDate) -> String {
    format!(
        "{:>6}  {:<24} {:<10} {:<12} {}",
        item.id,
        item.name,
        item.quantity,
        item.expiry_date.as_deref().unwrap_or("-"),
        classify(item, today).describe()
    )
}

fn waste_summary(report: &WasteReport) -> String {
    let counts = report.counts;
    format!(
        "expired: {}  expiring soon: {}  fresh: {}  unknown: {}  needs attention: {}",
        counts.expired,
        counts.expiring_soon,
        counts.fresh,
        counts.unknown,
        report.at_risk().count()
    )
}

fn print_draft(draft: &Draft) {
    let show = |value: &str| if value.is_empty() { "(empty)".to_string() } else { value.to_string() };
    println!("  name:     {}", show(&draft.name));
    println!("  quantity: {}", show(&draft.quantity));
    println!(
        "  expiry:   {}",
        draft.expiry_date.as_deref().map(show).unwrap_or_else(|| "(none)".to_string())
    );
}

/// Write the built-in defaults (plus any `--api-url`) to the config file
pub fn init_config(overrides: &ConfigOverrides, force: bool) -> Result<()> {
    let path = overrides
        .config_file()
        .context("No config directory on this platform, pass --config")?;
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let defaults = Settings::default();
    let api_base_url = match &overrides.api_base_url {
        Some(url) => normalize_base_url(url)?,
        None => defaults.api_base_url,
    };
    let config = TomlConfig {
        api_base_url: Some(api_base_url),
        request_timeout_secs: Some(defaults.request_timeout.as_secs()),
        default_quantity: Some(defaults.default_quantity),
        logging: defaults.logging,
    };

    write_toml_config(&config, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
