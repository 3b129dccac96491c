use std::{collections::HashMap, fs};

/// Runtime settings.
///
/// The advance listener speaks the simplest possible protocol: clients open
/// a TCP connection and send newline-delimited text; every non-empty line is
/// one advance pulse, its payload is ignored. The control surface is plain
/// HTTP/JSON on `rpc_bind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_bind: String,
    pub advance_bind: String,
    pub patterns_dir: String,
    pub template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_bind: "0.0.0.0:8001".into(),
            advance_bind: "0.0.0.0:4002".into(),
            patterns_dir: "patterns".into(),
            template: "patterns/orig_pattern1.jpg".into(),
        }
    }
}

/// Defaults, then `slm.toml` if present, then `SLM_*` environment overrides.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("slm.toml") {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings);

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("rpc_bind") {
            settings.rpc_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("advance_bind") {
            settings.advance_bind = v.clone();
        }
        if let Some(v) = file_cfg.get("patterns_dir") {
            settings.patterns_dir = v.clone();
        }
        if let Some(v) = file_cfg.get("template") {
            settings.template = v.clone();
        }
    }
}

fn apply_env_overrides(settings: &mut Settings) {
    apply_env_from(settings, |key| std::env::var(key).ok());
}

fn apply_env_from(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SLM_RPC_BIND") {
        settings.rpc_bind = v;
    }
    if let Some(v) = var("SLM_ADVANCE_BIND") {
        settings.advance_bind = v;
    }
    if let Some(v) = var("SLM_PATTERNS_DIR") {
        settings.patterns_dir = v;
    }
    if let Some(v) = var("SLM_TEMPLATE") {
        settings.template = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_device_ports() {
        let settings = Settings::default();
        assert_eq!(settings.rpc_bind, "0.0.0.0:8001");
        assert_eq!(settings.advance_bind, "0.0.0.0:4002");
        assert_eq!(settings.patterns_dir, "patterns");
    }

    #[test]
    fn file_overrides_replace_only_named_keys() {
        let mut settings = Settings::default();
        apply_file_overrides(
            &mut settings,
            "rpc_bind = \"127.0.0.1:9001\"\npatterns_dir = \"/srv/patterns\"\n",
        );
        assert_eq!(settings.rpc_bind, "127.0.0.1:9001");
        assert_eq!(settings.patterns_dir, "/srv/patterns");
        assert_eq!(settings.advance_bind, "0.0.0.0:4002");
    }

    #[test]
    fn malformed_file_leaves_defaults_untouched() {
        let mut settings = Settings::default();
        apply_file_overrides(&mut settings, "rpc_bind = [not toml");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_win_over_defaults() {
        let mut settings = Settings::default();
        apply_env_from(&mut settings, |key| {
            (key == "SLM_ADVANCE_BIND").then(|| "127.0.0.1:14002".to_string())
        });
        assert_eq!(settings.advance_bind, "127.0.0.1:14002");
        assert_eq!(settings.rpc_bind, Settings::default().rpc_bind);
    }
}
