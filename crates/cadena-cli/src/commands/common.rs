//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use cadena_config::{AutoSave, ChainCollection, EngineFactory, FileRepository, Settings, paths};
use cadena_core::{
    AudioEngine, Chain, ChainId, DistortionPreset, EffectSlot, EffectType, EqFilterType, Param,
    ReverbPreset, SLOT_COUNT, SlotId,
};
use cadena_io::{OfflineEngine, WavLoader};
use clap::Args;

/// Options accepted by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Saved-chains file, overriding the settings
    #[arg(long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Settings from `--config` or the default location, with `--data-file`
    /// applied.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let path = self.config.clone().unwrap_or_else(paths::settings_path);
        let mut settings = Settings::load_or_default(&path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        if let Some(data_file) = &self.data_file {
            settings.data_file.clone_from(data_file);
        }
        Ok(settings)
    }
}

/// Engine used for every chain the CLI opens.
pub fn engine_factory() -> EngineFactory {
    Box::new(|| Box::new(OfflineEngine::new()) as Box<dyn AudioEngine>)
}

/// Loaded settings and chains for one command invocation.
pub struct Session {
    /// Effective settings.
    pub settings: Settings,
    /// The saved chains.
    pub chains: ChainCollection<FileRepository>,
    autosave: AutoSave,
}

impl Session {
    /// Loads settings and the saved chains.
    pub fn open(global: &GlobalArgs) -> anyhow::Result<Self> {
        let settings = global.settings()?;
        let repo = FileRepository::new(&settings.data_file);
        let chains = ChainCollection::load_all(repo, engine_factory(), Box::new(WavLoader))
            .with_context(|| format!("loading chains from {}", settings.data_file.display()))?;
        let autosave = AutoSave::new(settings.autosave_delay());
        Ok(Self {
            settings,
            chains,
            autosave,
        })
    }

    /// Resolves a chain by position, id or name.
    pub fn resolve(&self, key: &str) -> anyhow::Result<ChainId> {
        self.chains
            .find(key)
            .map(|c| c.id().clone())
            .ok_or_else(|| {
                anyhow::anyhow!("Chain '{key}' not found. Use 'cadena list' to see saved chains.")
            })
    }

    /// The chain `key` refers to.
    pub fn chain(&self, key: &str) -> anyhow::Result<&Chain> {
        let id = self.resolve(key)?;
        self.chains
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("Chain '{key}' not found"))
    }

    /// Applies `edit` to a chain and saves it if anything changed.
    ///
    /// The chain is saved even when `edit` fails, since a failed source load
    /// still changes what the chain remembers.
    pub fn edit<T>(
        &mut self,
        key: &str,
        edit: impl FnOnce(&mut Chain) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let id = self.resolve(key)?;
        let chain = self
            .chains
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Chain '{key}' not found"))?;

        self.autosave.track(chain);
        let result = edit(chain);
        self.autosave.observe(chain, Instant::now());

        let written = self.autosave.flush(self.chains.repository_mut())?;
        tracing::debug!("saved {written} chain(s)");
        result
    }
}

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!(
            "Invalid parameter format: '{}' (expected key=value)",
            s
        )),
    }
}

/// Id of the slot at a 1-based position.
pub fn slot_id(chain: &Chain, position: usize) -> anyhow::Result<SlotId> {
    position
        .checked_sub(1)
        .and_then(|i| chain.slot_at(i))
        .map(EffectSlot::id)
        .ok_or_else(|| anyhow::anyhow!("Slot {position} out of range (1-{SLOT_COUNT})"))
}

/// 0-based index for a 1-based slot position.
pub fn slot_index(position: usize) -> anyhow::Result<usize> {
    match position {
        1..=SLOT_COUNT => Ok(position - 1),
        _ => anyhow::bail!("Slot {position} out of range (1-{SLOT_COUNT})"),
    }
}

/// Parses an effect name as typed on the command line.
pub fn parse_effect(name: &str) -> anyhow::Result<EffectType> {
    EffectType::from_id(&name.to_ascii_lowercase()).ok_or_else(|| {
        anyhow::anyhow!("Unknown effect '{name}'. Use 'cadena effects' to see available effects.")
    })
}

/// Resolves a parameter key for `effect`.
pub fn parse_param(effect: EffectType, key: &str) -> anyhow::Result<Param> {
    Param::from_key(key)
        .filter(|p| effect.params().contains(p))
        .ok_or_else(|| {
            let known: Vec<&str> = effect.params().iter().map(|p| p.key()).collect();
            anyhow::anyhow!(
                "{effect} has no parameter '{key}' (expected one of: {})",
                known.join(", ")
            )
        })
}

/// Parses a parameter value: a number, or for presets and filter types
/// also a name.
pub fn parse_value(effect: EffectType, param: Param, raw: &str) -> anyhow::Result<f64> {
    if let Ok(value) = raw.trim().parse::<f64>() {
        if !value.is_finite() {
            anyhow::bail!("Invalid value '{raw}' for {param}: must be a finite number");
        }
        return Ok(value);
    }
    let index = match (effect, param) {
        (EffectType::Reverb, Param::Preset) => ReverbPreset::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(raw))
            .map(|p| p.index()),
        (EffectType::Distortion, Param::Preset) => DistortionPreset::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(raw))
            .map(|p| p.index()),
        (EffectType::Equalizer, Param::FilterType) => EqFilterType::ALL
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(raw))
            .map(|f| f.index()),
        _ => None,
    };
    index
        .map(|i| i as f64)
        .ok_or_else(|| anyhow::anyhow!("Invalid value '{raw}' for {param}"))
}

/// Applies `key=value` settings to the effect in `slot`, printing each
/// resulting value.
pub fn apply_params(
    chain: &mut Chain,
    slot: SlotId,
    params: &[(String, String)],
) -> anyhow::Result<()> {
    let Some(effect) = chain.slot(slot).and_then(EffectSlot::effect_type) else {
        anyhow::bail!("Slot is empty");
    };
    for (key, raw) in params {
        let param = parse_param(effect, key)?;
        let value = parse_value(effect, param, raw)?;
        if !chain.set_parameter(slot, param, value) {
            anyhow::bail!("Invalid value '{raw}' for {param}");
        }
        let applied = chain
            .slot(slot)
            .and_then(|s| s.kind().param(param))
            .unwrap_or(value);
        println!("  {param} = {applied}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("preset=Large hall 2").unwrap(),
            ("preset".to_string(), "Large hall 2".to_string())
        );
        assert_eq!(parse_key_val("a=b=c").unwrap().1, "b=c");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=5").is_err());
    }

    #[test]
    fn values_accept_names_for_indexed_params() {
        assert_eq!(
            parse_value(EffectType::Reverb, Param::Preset, "large hall 2").unwrap(),
            12.0
        );
        assert_eq!(
            parse_value(EffectType::Equalizer, Param::FilterType, "Parametric").unwrap(),
            0.0
        );
        assert_eq!(
            parse_value(EffectType::Delay, Param::Feedback, "-20.5").unwrap(),
            -20.5
        );
        assert!(parse_value(EffectType::Delay, Param::Feedback, "loud").is_err());
        for raw in ["nan", "inf", "-infinity"] {
            assert!(parse_value(EffectType::Reverb, Param::WetDryMix, raw).is_err());
        }
    }

    #[test]
    fn params_are_checked_against_effect() {
        assert_eq!(
            parse_param(EffectType::Delay, "DELAYTIME").unwrap(),
            Param::DelayTime
        );
        let err = parse_param(EffectType::Reverb, "feedback").unwrap_err();
        assert!(err.to_string().contains("preset, wetDryMix"));
    }

    #[test]
    fn effects_parse_case_insensitively() {
        assert_eq!(parse_effect("EQUALISER").unwrap(), EffectType::Equalizer);
        assert!(parse_effect("flanger").is_err());
    }

    #[test]
    fn slot_positions_are_one_based() {
        assert_eq!(slot_index(1).unwrap(), 0);
        assert_eq!(slot_index(6).unwrap(), 5);
        assert!(slot_index(0).is_err());
        assert!(slot_index(7).is_err());
    }
}
