use foosball_api::client::{DEFAULT_BRANCH, GITHUB_API, GithubConfig};
use log::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: LevelFilter,
    /// `None` when token or repository is missing; the app then keeps its
    /// tables in memory only.
    pub github: Option<GithubConfig>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { full_screen: false, log_level: LevelFilter::Info, github: None }
    }
}

impl AppSettings {
    /// Read settings from the environment, after merging a local `.env`.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let log_level = get("FOOSTUI_LOG")
            .and_then(|level| level.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);

        let github = match (get("GITHUB_TOKEN"), get("GITHUB_REPO")) {
            (Some(token), Some(repo)) => Some(GithubConfig {
                token,
                repo,
                branch: get("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                api_url: get("FOOSTUI_API_URL").unwrap_or_else(|| GITHUB_API.to_string()),
            }),
            _ => None,
        };

        Self { full_screen: false, log_level, github }
    }

    /// Where the tables live, for the title bar.
    pub fn store_label(&self) -> String {
        match &self.github {
            Some(cfg) => format!("{}@{}", cfg.repo, cfg.branch),
            None => "in-memory (not saved)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn github_needs_token_and_repo() {
        assert!(settings(&[("GITHUB_TOKEN", "t")]).github.is_none());
        assert!(settings(&[("GITHUB_REPO", "office/foosball")]).github.is_none());
        assert!(settings(&[("GITHUB_TOKEN", " "), ("GITHUB_REPO", "office/foosball")]).github.is_none());
    }

    #[test]
    fn branch_and_api_url_have_defaults() {
        let s = settings(&[("GITHUB_TOKEN", "t"), ("GITHUB_REPO", "office/foosball")]);
        let cfg = s.github.unwrap();
        assert_eq!(cfg.branch, "main");
        assert_eq!(cfg.api_url, "https://api.github.com");
        assert_eq!(s.log_level, LevelFilter::Info);
    }

    #[test]
    fn overrides_are_respected() {
        let s = settings(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPO", "office/foosball"),
            ("GITHUB_BRANCH", "scores"),
            ("FOOSTUI_LOG", "debug"),
        ]);
        assert_eq!(s.store_label(), "office/foosball@scores");
        assert_eq!(s.log_level, LevelFilter::Debug);
    }

    #[test]
    fn bad_log_level_falls_back_to_info() {
        assert_eq!(settings(&[("FOOSTUI_LOG", "loud")]).log_level, LevelFilter::Info);
    }
}
