//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, GenerationArgs};
use crate::cli::presentation::{
    format_package_json, format_package_text, format_result_json, format_result_text,
};
use crate::config::{ConfigLoader, QuillConfig};
use crate::error::GenerationError;
use crate::formats::ContentFormat;
use crate::generation::package::{generate_package, PackagePiece};
use crate::generation::request::GenerationRequest;
use crate::generation::GenerationOrchestrator;
use crate::provider::{BackendFactory, GenerativeBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runtime context for CLI execution: workspace, config path, and the merged config.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: QuillConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, GenerationError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    /// Context over an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: QuillConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(
        &self,
        command: &Commands,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError> {
        let started = Instant::now();
        let result = match command {
            Commands::Generate { content, args } => self.handle_generate(*content, args, cancel).await,
            Commands::Package {
                formats,
                concurrency,
                args,
            } => {
                self.handle_package(formats, *concurrency, args, cancel)
                    .await
            }
            Commands::Config { command } => self.handle_config(command),
        };
        info!(
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn handle_generate(
        &self,
        content: ContentFormat,
        args: &GenerationArgs,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError> {
        self.config.clone().validated()?;
        let brief = read_brief(args)?;
        let orchestrator = self.orchestrator(args)?;
        let request = self.build_request(content, &brief, args);

        let result = orchestrator.generate_with_cancel(request, cancel).await?;
        Ok(match args.format.as_str() {
            "json" => format_result_json(&result),
            _ => format_result_text(&result),
        })
    }

    async fn handle_package(
        &self,
        formats: &[ContentFormat],
        concurrency: Option<usize>,
        args: &GenerationArgs,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError> {
        self.config.clone().validated()?;
        let brief = read_brief(args)?;
        let orchestrator = self.orchestrator(args)?;

        let formats: Vec<ContentFormat> = if formats.is_empty() {
            ContentFormat::ALL.to_vec()
        } else {
            formats.to_vec()
        };
        let pieces = formats
            .iter()
            .map(|format| PackagePiece::new(format.key(), self.build_request(*format, &brief, args)))
            .collect();
        let concurrency = concurrency.unwrap_or(self.config.generation.package_concurrency);

        let report = generate_package(&orchestrator, pieces, concurrency, cancel).await?;
        Ok(match args.format.as_str() {
            "json" => format_package_json(&report),
            _ => format_package_text(&report),
        })
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, GenerationError> {
        match command {
            ConfigCommands::Show { format } => match format.as_str() {
                "json" => serde_json::to_string_pretty(&self.config).map_err(|e| {
                    GenerationError::ConfigError(format!("Failed to serialize configuration: {}", e))
                }),
                _ => self.config.to_toml_string(),
            },
            ConfigCommands::Init {
                path,
                global,
                force,
            } => {
                let target = match (path, global) {
                    (Some(path), _) => path.clone(),
                    (None, true) => ConfigLoader::global_config_path().ok_or_else(|| {
                        GenerationError::ConfigError(
                            "Cannot locate a home directory for the global config".to_string(),
                        )
                    })?,
                    (None, false) => workspace_config_path(&self.workspace_root),
                };
                ConfigLoader::write_default(&target, *force)?;
                Ok(format!("Wrote default configuration to {}", target.display()))
            }
        }
    }

    fn backend(&self, args: &GenerationArgs) -> Result<Arc<dyn GenerativeBackend>, GenerationError> {
        match &args.replay {
            Some(path) => BackendFactory::replay(path),
            None => BackendFactory::create(&self.config.provider),
        }
    }

    fn orchestrator(&self, args: &GenerationArgs) -> Result<GenerationOrchestrator, GenerationError> {
        Ok(GenerationOrchestrator::new(self.backend(args)?)
            .with_policy(self.config.generation.invoke_policy()))
    }

    /// Request for one format with configured defaults and command-line overrides applied.
    pub fn build_request(
        &self,
        content: ContentFormat,
        brief: &str,
        args: &GenerationArgs,
    ) -> GenerationRequest {
        let defaults = &self.config.generation;
        let candidates = if args.models.is_empty() {
            defaults.model_candidates.clone()
        } else {
            args.models.clone()
        };
        let system = args.system.as_deref().unwrap_or(&defaults.system_prompt);
        let structured = args.structured || defaults.structured;

        content
            .request(candidates, system, brief, structured)
            .with_params(defaults.params())
            .with_token_budget(args.token_budget.unwrap_or(defaults.token_budget))
            .with_max_segments(args.max_segments.unwrap_or(defaults.max_segments))
            .with_continuation_marker(defaults.continuation_marker.clone())
    }
}

fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join("config").join("quill.toml")
}

fn read_brief(args: &GenerationArgs) -> Result<String, GenerationError> {
    let brief = match (&args.brief, &args.brief_file) {
        (Some(brief), _) => brief.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            GenerationError::InvalidRequest(format!(
                "Failed to read brief file {}: {}",
                path.display(),
                e
            ))
        })?,
        (None, None) => {
            return Err(GenerationError::InvalidRequest(
                "A brief is required (--brief or --brief-file)".to_string(),
            ))
        }
    };
    if brief.trim().is_empty() {
        return Err(GenerationError::InvalidRequest("The brief is empty".to_string()));
    }
    Ok(brief)
}
