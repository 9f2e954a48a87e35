//! Wires configuration, credentials and backends into one [`App`].

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sheetpilot_core::{
    AnalysisMode, Analyzer, ApplyPipeline, Config, CredentialsConfig, DocumentBackend, Gateway,
    ModelBackend, Refiner, SheetSource, config::process_env,
};
use sheetpilot_google::{GoogleAuth, GoogleDocs, GoogleSheets};
use sheetpilot_llm::MessagesClient;
use tracing::{debug, info};

use crate::GlobalArgs;

/// Everything a command needs, built once per invocation.
#[derive(Debug, Clone)]
pub struct App {
    pub gateway: Arc<Gateway>,
    pub model: Arc<dyn ModelBackend>,
    pub mode: AnalysisMode,
    pub max_tokens: u32,
    pipeline: ApplyPipeline,
}

impl App {
    pub fn bootstrap(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global)?;
        let credentials =
            CredentialsConfig::resolve(process_env).context("failed to load credentials")?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("sheetpilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let gateway = build_gateway(&config, credentials.as_ref(), &http)?;
        if gateway.is_demo() {
            info!("no spreadsheet configured, running in demo mode");
        }

        let model = MessagesClient::new(
            http,
            config.model_api_key(credentials.as_ref(), process_env),
            config.model.model.clone(),
            config.model.endpoint.as_deref(),
        );
        debug!(model = model.model(), "model backend ready");

        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(model),
            config.analysis.mode,
            config.model.max_tokens,
        ))
    }

    pub fn new(
        gateway: Arc<Gateway>,
        model: Arc<dyn ModelBackend>,
        mode: AnalysisMode,
        max_tokens: u32,
    ) -> Self {
        Self {
            pipeline: ApplyPipeline::new(Arc::clone(&gateway)),
            gateway,
            model,
            mode,
            max_tokens,
        }
    }

    pub fn analyzer(&self, mode: AnalysisMode) -> Analyzer {
        Analyzer::new(Arc::clone(&self.gateway), Arc::clone(&self.model), mode)
            .with_max_tokens(self.max_tokens)
    }

    pub fn refiner(&self) -> Refiner {
        Refiner::new(Arc::clone(&self.model))
    }

    /// The process-wide apply pipeline; clones share its receipt lock.
    pub fn pipeline(&self) -> ApplyPipeline {
        self.pipeline.clone()
    }

    /// The configured mode unless `requested` names another one.
    pub fn mode_or_default(&self, requested: Option<&str>) -> Result<AnalysisMode> {
        match requested {
            Some(mode) => mode.parse().map_err(anyhow::Error::msg),
            None => Ok(self.mode),
        }
    }
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => {
            let mut config = Config::load(path)
                .with_context(|| format!("failed to load config: {}", path.display()))?;
            config
                .apply_env_overrides(process_env)
                .context("invalid environment override")?;
            config
        }
        None => Config::load_resolved().context("failed to resolve project config")?,
    };

    if let Some(id) = &global.spreadsheet_id {
        config.spreadsheet.id = Some(id.clone());
    }
    if let Some(id) = &global.document_id {
        config.document.id = Some(id.clone());
    }
    Ok(config)
}

fn build_gateway(
    config: &Config,
    credentials: Option<&CredentialsConfig>,
    http: &reqwest::Client,
) -> Result<Gateway> {
    let spreadsheet_id = config.spreadsheet_id();
    let document_id = config.document_id();
    if spreadsheet_id.is_none() && document_id.is_none() {
        return Ok(Gateway::demo());
    }

    let Some(access_token) = config.google_access_token(credentials, process_env) else {
        bail!(
            "no Google access token found: set {} or add [credentials.google] access_token",
            config.google.access_token_env
        );
    };
    let auth = GoogleAuth {
        access_token,
        project_id: config.google.project_id.clone(),
    };

    let sheets = match spreadsheet_id {
        Some(id) => {
            let backend = GoogleSheets::new(
                http.clone(),
                auth.clone(),
                id,
                config.google.sheets_endpoint.as_deref(),
            )
            .context("failed to set up the spreadsheet backend")?;
            SheetSource::Live(Arc::new(backend))
        }
        None => SheetSource::Demo,
    };

    let documents = match document_id {
        Some(id) => {
            let backend = GoogleDocs::new(
                http.clone(),
                auth,
                id,
                config.google.docs_endpoint.as_deref(),
            )
            .context("failed to set up the document backend")?;
            Some(Arc::new(backend) as Arc<dyn DocumentBackend>)
        }
        None => None,
    };

    Ok(Gateway::new(sheets, documents))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_load_config_applies_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetpilot.toml");
        fs::write(
            &path,
            r#"
[spreadsheet]
id = "from-file"

[analysis]
mode = "single-source"
"#,
        )
        .unwrap();

        let global = GlobalArgs {
            config: Some(path),
            spreadsheet_id: Some("from-cli".into()),
            document_id: Some("doc-cli".into()),
        };
        let config = load_config(&global).unwrap();

        assert_eq!(config.spreadsheet_id(), Some("from-cli"));
        assert_eq!(config.document_id(), Some("doc-cli"));
    }

    #[test]
    fn test_load_config_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            config: Some(dir.path().join("absent.toml")),
            ..GlobalArgs::default()
        };
        let err = load_config(&global).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }

    #[test]
    fn test_app_hands_out_one_shared_pipeline() {
        let app = App::new(
            Arc::new(Gateway::demo()),
            Arc::new(sheetpilot_llm::MessagesClient::new(
                reqwest::Client::new(),
                None,
                "test-model",
                None,
            )),
            AnalysisMode::SingleSource,
            1024,
        );

        assert!(app.pipeline().shares_ledger_with(&app.pipeline()));
        assert!(app.clone().pipeline().shares_ledger_with(&app.pipeline()));
    }

    #[test]
    fn test_build_gateway_without_ids_is_demo() {
        let gateway =
            build_gateway(&Config::default(), None, &reqwest::Client::new()).unwrap();
        assert!(gateway.is_demo());
    }

    #[test]
    fn test_build_gateway_uses_credentials_file_token() {
        let mut config = Config::default();
        config.spreadsheet.id = Some("sheet-1".into());
        config.google.access_token_env = "SHEETPILOT_TEST_UNSET_TOKEN_VAR".into();

        let credentials: CredentialsConfig = toml::from_str(
            r#"
[credentials.google]
access_token = "ya29.from-file"
"#,
        )
        .unwrap();

        let gateway =
            build_gateway(&config, Some(&credentials), &reqwest::Client::new()).unwrap();
        assert!(!gateway.is_demo());
    }

    #[test]
    fn test_build_gateway_without_token_fails() {
        let mut config = Config::default();
        config.document.id = Some("doc-1".into());
        config.google.access_token_env = "SHEETPILOT_TEST_UNSET_TOKEN_VAR".into();

        let err = build_gateway(&config, None, &reqwest::Client::new()).unwrap_err();
        assert!(err.to_string().contains("SHEETPILOT_TEST_UNSET_TOKEN_VAR"));
    }
}
