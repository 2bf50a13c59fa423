use crate::config::WebDriverSettings;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

const USER_AGENT_TEMPLATE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36";

/// Chrome launch options for one session.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    pub disable_images: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub binary: Option<String>,
    pub extra_args: Vec<String>,
}

impl ChromeOptions {
    /// Picks a user agent and window size at random, as a returning visitor would vary.
    pub fn randomized<R: Rng>(settings: &WebDriverSettings, rng: &mut R) -> Self {
        let version = settings
            .user_agent_versions
            .choose(rng)
            .map(String::as_str)
            .unwrap_or("120.0.0.0");

        Self {
            headless: settings.headless,
            disable_images: settings.disable_images,
            user_agent: user_agent_for(version),
            window_size: (rng.gen_range(1050..=1200), rng.gen_range(800..=1000)),
            binary: settings.chrome_binary.clone(),
            extra_args: settings.extra_args.clone(),
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
                "--log-level=3",
                "--silent",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));
        args.push(format!("--user-agent={}", self.user_agent));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// `alwaysMatch` capabilities for the new-session request.
    pub fn to_capabilities(&self) -> Value {
        let mut chrome = json!({
            "args": self.args(),
            "excludeSwitches": ["enable-automation", "enable-logging"],
            "useAutomationExtension": false,
        });
        if self.disable_images {
            chrome["prefs"] = json!({ "profile.managed_default_content_settings.images": 2 });
        }
        if let Some(binary) = &self.binary {
            chrome["binary"] = json!(binary);
        }

        json!({
            "browserName": "chrome",
            "pageLoadStrategy": "normal",
            "goog:chromeOptions": chrome,
        })
    }
}

pub fn user_agent_for(version: &str) -> String {
    USER_AGENT_TEMPLATE.replace("{version}", version)
}
