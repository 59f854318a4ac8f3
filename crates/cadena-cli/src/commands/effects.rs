//! Effect listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use cadena_core::{
    DEFAULT_NYQUIST, DistortionPreset, EffectKind, EffectType, EqFilterType, Param, ReverbPreset,
};
use clap::Args;

use super::common::parse_effect;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

fn description(effect: EffectType) -> &'static str {
    match effect {
        EffectType::Reverb => "Factory room and hall reverbs",
        EffectType::Distortion => "Factory distortion, decimation and ring-mod presets",
        EffectType::Delay => "Feedback delay with low-pass filter",
        EffectType::Equalizer => "Single-band parametric/shelving equalizer",
    }
}

fn unit(param: Param) -> &'static str {
    match param {
        Param::WetDryMix | Param::Feedback => "%",
        Param::PreGain | Param::Gain => "dB",
        Param::DelayTime => "s",
        Param::LowPassCutoff | Param::Frequency => "Hz",
        Param::Bandwidth => "oct",
        Param::Preset | Param::FilterType => "",
    }
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let Some(name) = &args.effect else {
        println!("Available Effects");
        println!("=================");
        println!();
        for &effect in EffectType::ALL {
            println!("  {:12} - {}", effect.id(), description(effect));
        }
        println!();
        println!("Use 'cadena effects <name>' for detailed parameter info.");
        return Ok(());
    };

    let effect = parse_effect(name)?;
    let defaults = EffectKind::new(effect);

    println!("{}", effect.name());
    println!("{}", "=".repeat(effect.name().len()));
    println!();
    println!("{}", description(effect));
    println!();

    println!("Parameters:");
    println!();
    println!("  {:14}  {:10}  {}", "Name", "Default", "Range");
    println!("  {:14}  {:10}  {}", "----", "-------", "-----");
    for &param in effect.params() {
        let default = defaults.param(param).unwrap_or_default();
        let range = effect
            .param_range(param, DEFAULT_NYQUIST)
            .map(|r| format!("{} to {} {}", r.start(), r.end(), unit(param)))
            .unwrap_or_default();
        println!("  {:14}  {:10}  {}", param.key(), default, range.trim_end());
    }

    let names: Vec<&str> = match effect {
        EffectType::Reverb => ReverbPreset::ALL.iter().map(|p| p.name()).collect(),
        EffectType::Distortion => DistortionPreset::ALL.iter().map(|p| p.name()).collect(),
        EffectType::Equalizer => EqFilterType::ALL.iter().map(|f| f.name()).collect(),
        EffectType::Delay => Vec::new(),
    };
    if !names.is_empty() {
        println!();
        println!(
            "{}:",
            if effect == EffectType::Equalizer {
                "Filter types"
            } else {
                "Presets"
            }
        );
        for (i, name) in names.iter().enumerate() {
            println!("  {i:>2}  {name}");
        }
    }

    println!();
    println!("Example usage:");
    println!();
    let example: Vec<String> = effect
        .params()
        .iter()
        .take(2)
        .map(|&p| format!("--param {}={}", p.key(), defaults.param(p).unwrap_or_default()))
        .collect();
    println!("  cadena insert 1 {} {}", effect.id(), example.join(" "));

    Ok(())
}
