//! `unbait config ...`: the options page.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use unbait_engine::{load_default_prompt, FileSettingsStore, Settings, SettingsStore, SettingsUpdate};
use unbait_logging::unbait_warn;

use crate::cli::ConfigAction;

/// Name of the default prompt resource looked up next to the settings file.
const PROMPT_FILE_NAME: &str = "default_prompt.txt";

/// Open the settings file, resolving the default prompt resource first.
pub(crate) fn open_store(settings_path: &Path, prompt_file: Option<&Path>) -> FileSettingsStore {
    let sibling = settings_path
        .parent()
        .map(|dir| dir.join(PROMPT_FILE_NAME))
        .filter(|path| path.is_file());
    let prompt_path: Option<PathBuf> = prompt_file.map(Path::to_path_buf).or(sibling);
    let default_prompt = load_default_prompt(prompt_path.as_deref());
    FileSettingsStore::new(settings_path, default_prompt)
}

/// Settings as stored, or defaults when the file is unusable.
pub(crate) fn current_settings(store: &FileSettingsStore) -> Settings {
    store.load().unwrap_or_else(|err| {
        unbait_warn!("Ignoring unreadable settings {:?}: {}", store.path(), err);
        store.defaults()
    })
}

pub(crate) fn run(store: &FileSettingsStore, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", describe(&current_settings(store)));
        }
        ConfigAction::Set {
            provider,
            model,
            api_key,
            system_prompt,
        } => {
            let update = SettingsUpdate {
                provider,
                model,
                api_key,
                system_prompt,
            };
            if update.is_empty() {
                bail!("nothing to change; pass at least one of --provider, --model, --api-key, --system-prompt");
            }
            let settings = update.apply(current_settings(store));
            store
                .save(&settings)
                .with_context(|| format!("saving settings to {:?}", store.path()))?;
            println!("Settings saved successfully!");
        }
        ConfigAction::ResetPrompt => {
            let mut settings = current_settings(store);
            settings.system_prompt = store.default_prompt().to_string();
            store
                .save(&settings)
                .with_context(|| format!("saving settings to {:?}", store.path()))?;
            println!("System prompt reset to default.");
        }
    }
    Ok(())
}

fn describe(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "provider:      {}", settings.provider);
    if settings.model.trim().is_empty() {
        let _ = writeln!(out, "model:         ({})", settings.provider.model_hint());
    } else {
        let _ = writeln!(out, "model:         {}", settings.model);
    }
    let _ = writeln!(out, "api key:       {}", settings.masked_api_key());
    let _ = writeln!(out, "system prompt: {}", settings.system_prompt);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use unbait_engine::{Provider, BUNDLED_DEFAULT_PROMPT};

    #[test]
    fn prompt_next_to_settings_overrides_bundled_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("unbait_settings.ron");
        assert_eq!(
            open_store(&settings_path, None).default_prompt(),
            BUNDLED_DEFAULT_PROMPT.trim_end()
        );

        fs::write(dir.path().join(PROMPT_FILE_NAME), "Local prompt.\n").unwrap();
        assert_eq!(open_store(&settings_path, None).default_prompt(), "Local prompt.");
    }

    #[test]
    fn set_then_show_masks_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir.path().join("s.ron"), None);
        run(
            &store,
            ConfigAction::Set {
                provider: Some(Provider::Anthropic),
                model: Some(String::new()),
                api_key: Some("sk-ant-123456".to_string()),
                system_prompt: None,
            },
        )
        .unwrap();

        let settings = current_settings(&store);
        assert_eq!(settings.provider, Provider::Anthropic);
        assert_eq!(settings.api_key, "sk-ant-123456");

        let shown = describe(&settings);
        assert!(shown.contains("provider:      anthropic"));
        assert!(shown.contains("api key:       *********3456"));
        assert!(shown.contains("claude-3-5-haiku-20241022"));
    }

    #[test]
    fn empty_prompt_and_reset_restore_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir.path().join("s.ron"), None);
        run(
            &store,
            ConfigAction::Set {
                provider: None,
                model: None,
                api_key: None,
                system_prompt: Some("Be terse.".to_string()),
            },
        )
        .unwrap();
        assert_eq!(current_settings(&store).system_prompt, "Be terse.");

        run(&store, ConfigAction::ResetPrompt).unwrap();
        assert_eq!(current_settings(&store).system_prompt, store.default_prompt());

        run(
            &store,
            ConfigAction::Set {
                provider: None,
                model: None,
                api_key: None,
                system_prompt: Some(String::new()),
            },
        )
        .unwrap();
        assert_eq!(current_settings(&store).system_prompt, store.default_prompt());
    }

    #[test]
    fn set_without_changes_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir.path().join("s.ron"), None);
        assert!(run(
            &store,
            ConfigAction::Set {
                provider: None,
                model: None,
                api_key: None,
                system_prompt: None,
            },
        )
        .is_err());
        assert!(!store.path().exists());
    }
}
