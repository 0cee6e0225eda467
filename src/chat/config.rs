//! Configuration types for the chat front end.
//!
//! This module provides CLI argument parsing via `arrrg`, YAML settings files,
//! and the resolved [`ChatConfig`] a session runs with.

use std::fs;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::DEFAULT_ENDPOINT;
use crate::error::{Error, Result};
use crate::types::DEFAULT_CONTEXT_WINDOW;

/// Integration the widget was deployed with.
pub const DEFAULT_INTEGRATION_ID: &str = "ro7";

/// Query parameter value that puts the page into installation mode.
const INSTALLATION_MODE: &str = "installation";

/// Command-line arguments for the climino-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML file with settings; flags override it.
    #[arrrg(optional, "YAML settings file", "FILE")]
    pub config: Option<String>,

    /// Streaming endpoint.
    #[arrrg(optional, "Streaming endpoint (default: Gooey.AI integrations/stream)", "URL")]
    pub endpoint: Option<String>,

    /// Integration to talk to.
    #[arrrg(optional, "Integration id (default: ro7)", "ID")]
    pub integration_id: Option<String>,

    /// Number of prior turns sent with each request.
    #[arrrg(optional, "Prior turns sent as context (default: 10)", "TURNS")]
    pub context_turns: Option<u32>,

    /// URL of the page embedding the widget.
    #[arrrg(optional, "Page URL; type=installation enables installation mode", "URL")]
    pub page_url: Option<String>,

    /// Force installation mode.
    #[arrrg(flag, "Installation mode: keep the prompt focused")]
    pub installation: bool,

    /// Log outgoing requests to stderr.
    #[arrrg(flag, "Log requests and stream locations to stderr")]
    pub verbose: bool,

    /// Also log every stream event to stderr.
    #[arrrg(flag, "Log every stream event to stderr (implies --verbose)")]
    pub log_events: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// Every field has a default, so a settings file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Endpoint that starts streamed responses.
    pub endpoint: String,

    /// Identifier of the hosted integration.
    pub integration_id: String,

    /// How many prior turns accompany each request.
    pub context_turns: usize,

    /// Label shown before user messages.
    pub user_label: String,

    /// Label shown before bot messages.
    pub bot_label: String,

    /// Placeholder shown while the response is pending.
    pub pending_indicator: String,

    /// Shown when the service does not hand back a stream.
    pub connection_error: String,

    /// Shown when the stream fails before any text arrived.
    pub network_error: String,

    /// Keep the input focused; interrupts do not end the program.
    pub installation_mode: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Log requests to stderr.
    pub log_requests: bool,

    /// Log every stream event to stderr.  Implies `log_requests`.
    pub log_events: bool,

    /// Optional overall request timeout in seconds.  `None` means no timeout.
    pub timeout_secs: Option<u64>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            integration_id: DEFAULT_INTEGRATION_ID.to_string(),
            context_turns: DEFAULT_CONTEXT_WINDOW,
            user_label: "tu: ".to_string(),
            bot_label: "Climino: ".to_string(),
            pending_indicator: "...".to_string(),
            connection_error: "Errore di connessione.".to_string(),
            network_error: "Errore di rete.".to_string(),
            installation_mode: false,
            use_color: true,
            log_requests: false,
            log_events: false,
            timeout_secs: None,
        }
    }

    /// Load settings from a YAML file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config {}", path.display()), err)
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can be used to talk to the service.
    pub fn validate(&self) -> Result<()> {
        if self.integration_id.trim().is_empty() {
            return Err(Error::validation(
                "integration id must not be empty",
                Some("integration_id".to_string()),
            ));
        }
        Url::parse(&self.endpoint).map_err(|err| {
            Error::validation(
                format!("endpoint is not a valid URL: {err}"),
                Some("endpoint".to_string()),
            )
        })?;
        Ok(())
    }

    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Sets the streaming endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the integration id.
    pub fn with_integration_id(mut self, integration_id: impl Into<String>) -> Self {
        self.integration_id = integration_id.into();
        self
    }

    /// Sets the number of prior turns sent as context.
    pub fn with_context_turns(mut self, turns: usize) -> Self {
        self.context_turns = turns;
        self
    }

    /// Enables or disables installation mode.
    pub fn with_installation_mode(mut self, enabled: bool) -> Self {
        self.installation_mode = enabled;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => ChatConfig::from_file(path)?,
            None => ChatConfig::new(),
        };
        if let Some(endpoint) = args.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(integration_id) = args.integration_id {
            config.integration_id = integration_id;
        }
        if let Some(turns) = args.context_turns {
            config.context_turns = turns as usize;
        }
        if let Some(page_url) = &args.page_url {
            config.installation_mode |= is_installation_page(page_url)?;
        }
        config.installation_mode |= args.installation;
        config.log_events |= args.log_events;
        config.log_requests |= args.verbose || config.log_events;
        if args.no_color {
            config.use_color = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// True if the page URL asks for installation mode (`?type=installation`).
///
/// Relative URLs such as `?type=installation` are accepted.
pub fn is_installation_page(page_url: &str) -> Result<bool> {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost/")?.join(page_url)?
        }
        Err(err) => return Err(err.into()),
    };
    Ok(url
        .query_pairs()
        .any(|(key, value)| key == "type" && value == INSTALLATION_MODE))
}
