//! Doctor command for client diagnostics
//!
//! Checks the local configuration, the backend connection, the stored
//! session and the state directory.

use colored::*;
use std::path::PathBuf;

use crate::api::BlogManagerClient;
use crate::config::Config;
use crate::errors::ClientError;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics
pub struct Doctor {
    client: BlogManagerClient,
    config: Config,
    config_error: Option<String>,
    state_dir: PathBuf,
}

impl Doctor {
    pub fn new(client: BlogManagerClient, config: Config) -> Self {
        let state_dir = config.state_dir();
        Self {
            client,
            config,
            config_error: None,
            state_dir,
        }
    }

    /// Record that the config file could not be loaded; defaults are in use
    pub fn with_config_error(mut self, error: impl Into<String>) -> Self {
        self.config_error = Some(error.into());
        self
    }

    pub fn with_state_dir(mut self, state_dir: PathBuf) -> Self {
        self.state_dir = state_dir;
        self
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_config(),
            self.check_backend().await,
            self.check_session(),
            self.check_llm_type().await,
            self.check_state_dir(),
        ]
    }

    /// Check 1: local configuration
    fn check_config(&self) -> HealthCheck {
        if let Some(e) = &self.config_error {
            return HealthCheck::new("Config", HealthStatus::Fail(e.clone()));
        }
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Config", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Config", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 2: backend answers at all
    async fn check_backend(&self) -> HealthCheck {
        let api = self.client.api();
        let url = match api.url(&["api", "blogs", "lists"]) {
            Ok(url) => url,
            Err(e) => return HealthCheck::new("Backend", HealthStatus::Fail(e.to_string())),
        };

        match api.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                HealthCheck::new("Backend", HealthStatus::Pass)
            }
            Ok(response) => HealthCheck::new(
                "Backend",
                HealthStatus::Warn(format!(
                    "{} answered with HTTP {}",
                    api.base_url(),
                    response.status().as_u16()
                )),
            ),
            Err(e) => HealthCheck::new(
                "Backend",
                HealthStatus::Fail(format!("Cannot reach {}: {}", api.base_url(), e)),
            ),
        }
    }

    /// Check 3: stored session
    fn check_session(&self) -> HealthCheck {
        let store = self.client.session();
        match (store.get_token(), store.get_user()) {
            (Some(_), Some(_)) => HealthCheck::new("Session", HealthStatus::Pass),
            (Some(_), None) => HealthCheck::new(
                "Session",
                HealthStatus::Warn("Token stored without user record".to_string()),
            ),
            _ => HealthCheck::new(
                "Session",
                HealthStatus::Warn("Not logged in (run `blogctl login`)".to_string()),
            ),
        }
    }

    /// Check 4: an LLM backend is selected
    async fn check_llm_type(&self) -> HealthCheck {
        if !self.client.session().is_authenticated() {
            return HealthCheck::new(
                "LLM",
                HealthStatus::Warn("Skipped, not logged in".to_string()),
            );
        }

        match self.client.llm().current_llm_type().await {
            Ok(kind) if is_unset_llm(&kind) => HealthCheck::new(
                "LLM",
                HealthStatus::Warn("No LLM selected (run `blogctl llm set`)".to_string()),
            ),
            Ok(_) => HealthCheck::new("LLM", HealthStatus::Pass),
            Err(ClientError::Unauthorized) => HealthCheck::new(
                "LLM",
                HealthStatus::Fail("Session expired, log in again".to_string()),
            ),
            Err(e) => HealthCheck::new("LLM", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 5: state directory writable
    fn check_state_dir(&self) -> HealthCheck {
        if let Err(e) = std::fs::create_dir_all(&self.state_dir) {
            return HealthCheck::new(
                "State Dir",
                HealthStatus::Fail(format!("Cannot create {}: {}", self.state_dir.display(), e)),
            );
        }

        let probe = self.state_dir.join(".blogctl_probe");
        match std::fs::write(&probe, "probe") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
                HealthCheck::new("State Dir", HealthStatus::Pass)
            }
            Err(_) => HealthCheck::new(
                "State Dir",
                HealthStatus::Fail(format!("No write permission in {}", self.state_dir.display())),
            ),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "blogctl diagnostics".bold().cyan());
        println!("{:<12} {}", "Check", "Status");
        println!("{}", "=".repeat(50));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow().to_string(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red().to_string(),
            };
            println!("{:<12} {}", check.name, status);
        }

        println!();
    }

    /// No check failed
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// `/llm/get` answers the literal `null` when nothing is selected
fn is_unset_llm(body: &str) -> bool {
    let trimmed = body.trim().trim_matches('"');
    trimmed.is_empty() || trimmed == "null"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn doctor(dir: &TempDir) -> Doctor {
        // Port 9 (discard) is closed on test machines
        let session = SessionStore::new(dir.path());
        let client =
            BlogManagerClient::new("http://127.0.0.1:9", Duration::from_secs(1), session).unwrap();
        Doctor::new(client, Config::default()).with_state_dir(dir.path().join("state"))
    }

    #[test]
    fn test_unset_llm_detection() {
        assert!(is_unset_llm("null"));
        assert!(is_unset_llm("\"null\""));
        assert!(is_unset_llm(""));
        assert!(!is_unset_llm("XModel"));
    }

    #[test]
    fn test_overall_status() {
        let warn_only = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Warn("w".to_string())),
        ];
        assert!(Doctor::overall_status(&warn_only));

        let failing = vec![HealthCheck::new("a", HealthStatus::Fail("f".to_string()))];
        assert!(!Doctor::overall_status(&failing));
    }

    #[test]
    fn test_config_error_fails_check() {
        let dir = TempDir::new().unwrap();
        let doctor = doctor(&dir).with_config_error("bad toml");
        assert_eq!(
            doctor.check_config().status,
            HealthStatus::Fail("bad toml".to_string())
        );
    }

    #[test]
    fn test_missing_session_warns() {
        let dir = TempDir::new().unwrap();
        let check = doctor(&dir).check_session();
        assert!(matches!(check.status, HealthStatus::Warn(_)));
    }

    #[test]
    fn test_state_dir_created_and_writable() {
        let dir = TempDir::new().unwrap();
        let doctor = doctor(&dir);
        assert_eq!(doctor.check_state_dir().status, HealthStatus::Pass);
        assert!(dir.path().join("state").is_dir());
    }

    #[tokio::test]
    async fn test_llm_check_skipped_without_login() {
        let dir = TempDir::new().unwrap();
        let check = doctor(&dir).check_llm_type().await;
        assert!(matches!(check.status, HealthStatus::Warn(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails() {
        let dir = TempDir::new().unwrap();
        let check = doctor(&dir).check_backend().await;
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }
}
