//! Effect descriptors: the closed set of effect kinds a slot can hold.
//!
//! [`EffectKind`] is a tagged variant carrying each effect's parameters and
//! bypass flag. Every consumer (routing filter, codec, CLI summaries) matches
//! on it exhaustively, so adding a kind is a compile error until every site
//! handles it.
//!
//! Parameter ranges follow the platform audio units the saved data was
//! produced with:
//!
//! | Effect | Parameter | Range |
//! |---|---|---|
//! | Reverb | preset | 0..=12 |
//! | Reverb, Distortion, Delay | wet/dry mix | 0..=100 % |
//! | Distortion | preset | 0..=21 |
//! | Distortion | pre-gain | -80..=20 dB |
//! | Delay | feedback | -100..=100 % |
//! | Delay | delay time | 0..=2 s |
//! | Delay | low-pass cutoff | 10..=Nyquist Hz |
//! | Equalizer | filter type | 0..=10 |
//! | Equalizer | bandwidth | 0.05..=5 octaves |
//! | Equalizer | frequency | 20..=Nyquist Hz |
//! | Equalizer | gain | -96..=24 dB |

use std::fmt;
use std::ops::RangeInclusive;

macro_rules! indexed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in index order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Looks up a value by its persisted index.
            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            /// Persisted index of this value.
            pub fn index(self) -> usize {
                self as usize
            }

            /// Human-readable name.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

indexed_enum! {
    /// Reverb factory preset.
    ReverbPreset {
        SmallRoom => "Small room",
        MediumRoom => "Medium room",
        LargeRoom => "Large room",
        MediumHall => "Medium hall",
        LargeHall => "Large hall",
        Plate => "Plate",
        MediumChamber => "Medium chamber",
        LargeChamber => "Large chamber",
        Cathedral => "Cathedral",
        LargeRoom2 => "Large room 2",
        MediumHall2 => "Medium hall 2",
        MediumHall3 => "Medium hall 3",
        LargeHall2 => "Large hall 2",
    }
}

indexed_enum! {
    /// Distortion factory preset.
    DistortionPreset {
        DrumsBitBrush => "Drums bit brush",
        DrumsBufferBeats => "Drums buffer beats",
        DrumsLoFi => "Drums lo fi",
        MultiBrokenSpeaker => "Multi broken speaker",
        MultiCellphoneConcert => "Multi cell phone speaker",
        MultiDecimated1 => "Multi decimated 1",
        MultiDecimated2 => "Multi decimated 2",
        MultiDecimated3 => "Multi decimated 3",
        MultiDecimated4 => "Multi decimated 4",
        MultiDistortedFunk => "Multi distorted funk",
        MultiDistortedCubed => "Multi distorted cube",
        MultiDistortedSquared => "Multi distorted squared",
        MultiEcho1 => "Multi echo 1",
        MultiEcho2 => "Multi echo 2",
        MultiEchoTight1 => "Multi echo tight 1",
        MultiEchoTight2 => "Multi echo tight 2",
        MultiEverythingIsBroken => "Multi everything is broken",
        SpeechAlienChatter => "Speech alien chatter",
        SpeechCosmicInterference => "Speech cosmic interference",
        SpeechGoldenPi => "Speech golden pi",
        SpeechRadioTower => "Speech radio tower",
        SpeechWaves => "Speech waves",
    }
}

indexed_enum! {
    /// Equalizer band filter type.
    EqFilterType {
        Parametric => "Parametric",
        LowPass => "Low pass",
        HighPass => "High pass",
        ResonantLowPass => "Resonant low pass",
        ResonantHighPass => "Resonant high pass",
        BandPass => "Band pass",
        BandStop => "Band stop",
        LowShelf => "Low shelf",
        HighShelf => "High shelf",
        ResonantLowShelf => "Resonant low shelf",
        ResonantHighShelf => "Resonant high shelf",
    }
}

/// The effect tag without parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectType {
    /// Reverb.
    Reverb,
    /// Distortion.
    Distortion,
    /// Delay.
    Delay,
    /// Single-band equalizer.
    Equalizer,
}

impl EffectType {
    /// Every effect type, in menu order.
    pub const ALL: &'static [EffectType] = &[
        EffectType::Reverb,
        EffectType::Distortion,
        EffectType::Delay,
        EffectType::Equalizer,
    ];

    /// Lowercase identifier, also used as the persisted bank `"type"`.
    pub fn id(self) -> &'static str {
        match self {
            EffectType::Reverb => "reverb",
            EffectType::Distortion => "distortion",
            EffectType::Delay => "delay",
            EffectType::Equalizer => "equalizer",
        }
    }

    /// Parses an identifier as produced by [`id()`](Self::id).
    ///
    /// The British spelling `equaliser` is accepted as well.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "reverb" => Some(EffectType::Reverb),
            "distortion" => Some(EffectType::Distortion),
            "delay" => Some(EffectType::Delay),
            "equalizer" | "equaliser" => Some(EffectType::Equalizer),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            EffectType::Reverb => "Reverb",
            EffectType::Distortion => "Distortion",
            EffectType::Delay => "Delay",
            EffectType::Equalizer => "Equalizer",
        }
    }

    /// Parameters this effect type exposes, in editor order.
    pub fn params(self) -> &'static [Param] {
        match self {
            EffectType::Reverb => &[Param::Preset, Param::WetDryMix],
            EffectType::Distortion => &[Param::Preset, Param::PreGain, Param::WetDryMix],
            EffectType::Delay => &[
                Param::Feedback,
                Param::DelayTime,
                Param::LowPassCutoff,
                Param::WetDryMix,
            ],
            EffectType::Equalizer => &[
                Param::FilterType,
                Param::Bandwidth,
                Param::Frequency,
                Param::Gain,
            ],
        }
    }

    /// Valid range of `param` for this effect type, or `None` if the effect
    /// does not have that parameter.
    ///
    /// `nyquist` bounds the frequency-like parameters.
    pub fn param_range(self, param: Param, nyquist: f64) -> Option<RangeInclusive<f64>> {
        if !self.params().contains(&param) {
            return None;
        }
        let range = match (self, param) {
            (EffectType::Reverb, Param::Preset) => 0.0..=(ReverbPreset::ALL.len() - 1) as f64,
            (EffectType::Distortion, Param::Preset) => {
                0.0..=(DistortionPreset::ALL.len() - 1) as f64
            }
            (_, Param::Preset) => return None,
            (_, Param::WetDryMix) => 0.0..=100.0,
            (_, Param::PreGain) => -80.0..=20.0,
            (_, Param::Feedback) => -100.0..=100.0,
            (_, Param::DelayTime) => 0.0..=2.0,
            (_, Param::LowPassCutoff) => 10.0..=nyquist.max(10.0),
            (_, Param::FilterType) => 0.0..=(EqFilterType::ALL.len() - 1) as f64,
            (_, Param::Bandwidth) => 0.05..=5.0,
            (_, Param::Frequency) => 20.0..=nyquist.max(20.0),
            (_, Param::Gain) => -96.0..=24.0,
        };
        Some(range)
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An editable effect parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// Factory preset index (reverb, distortion).
    Preset,
    /// Wet/dry mix in percent.
    WetDryMix,
    /// Distortion pre-gain in dB.
    PreGain,
    /// Delay feedback in percent.
    Feedback,
    /// Delay time in seconds.
    DelayTime,
    /// Delay low-pass cutoff in Hz.
    LowPassCutoff,
    /// Equalizer filter type index.
    FilterType,
    /// Equalizer bandwidth in octaves.
    Bandwidth,
    /// Equalizer centre/corner frequency in Hz.
    Frequency,
    /// Equalizer gain in dB.
    Gain,
}

impl Param {
    /// Every parameter.
    pub const ALL: &'static [Param] = &[
        Param::Preset,
        Param::WetDryMix,
        Param::PreGain,
        Param::Feedback,
        Param::DelayTime,
        Param::LowPassCutoff,
        Param::FilterType,
        Param::Bandwidth,
        Param::Frequency,
        Param::Gain,
    ];

    /// Identifier used in the persisted bank maps and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Param::Preset => "preset",
            Param::WetDryMix => "wetDryMix",
            Param::PreGain => "preGain",
            Param::Feedback => "feedback",
            Param::DelayTime => "delayTime",
            Param::LowPassCutoff => "lowPassCutoff",
            Param::FilterType => "filter",
            Param::Bandwidth => "bandwidth",
            Param::Frequency => "frequency",
            Param::Gain => "gain",
        }
    }

    /// Parses a key as produced by [`key()`](Self::key). Case-insensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reverb parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ReverbParams {
    /// Factory preset.
    pub preset: ReverbPreset,
    /// Wet/dry mix, 0..=100.
    pub wet_dry_mix: f32,
    /// Bypass flag.
    pub bypass: bool,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            preset: ReverbPreset::SmallRoom,
            wet_dry_mix: 50.0,
            bypass: false,
        }
    }
}

/// Distortion parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DistortionParams {
    /// Factory preset.
    pub preset: DistortionPreset,
    /// Pre-gain in dB, -80..=20.
    pub pre_gain: f32,
    /// Wet/dry mix, 0..=100.
    pub wet_dry_mix: f32,
    /// Bypass flag.
    pub bypass: bool,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            preset: DistortionPreset::DrumsBitBrush,
            pre_gain: -6.0,
            wet_dry_mix: 50.0,
            bypass: false,
        }
    }
}

/// Delay parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DelayParams {
    /// Feedback in percent, -100..=100.
    pub feedback: f32,
    /// Delay time in seconds, 0..=2.
    pub delay_time: f64,
    /// Low-pass cutoff in Hz, 10..=Nyquist.
    pub low_pass_cutoff: f32,
    /// Wet/dry mix, 0..=100.
    pub wet_dry_mix: f32,
    /// Bypass flag.
    pub bypass: bool,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            feedback: 50.0,
            delay_time: 1.0,
            low_pass_cutoff: 15000.0,
            wet_dry_mix: 100.0,
            bypass: false,
        }
    }
}

/// One equalizer band.
#[derive(Clone, Debug, PartialEq)]
pub struct EqBand {
    /// Filter type.
    pub filter_type: EqFilterType,
    /// Bandwidth in octaves, 0.05..=5.
    pub bandwidth: f32,
    /// Frequency in Hz, 20..=Nyquist.
    pub frequency: f32,
    /// Gain in dB, -96..=24.
    pub gain: f32,
    /// Per-band bypass.
    pub bypass: bool,
}

impl Default for EqBand {
    fn default() -> Self {
        Self {
            filter_type: EqFilterType::Parametric,
            bandwidth: 0.5,
            frequency: 1000.0,
            gain: 0.0,
            bypass: false,
        }
    }
}

/// Equalizer parameters.
///
/// The model holds a list of bands but editors and persistence only ever use
/// the first one. Bypass lives on that band: the engine-level bypass switch
/// does not silence an equalizer.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualizerParams {
    bands: Vec<EqBand>,
}

impl EqualizerParams {
    /// Creates an equalizer with a single band.
    pub fn new(band: EqBand) -> Self {
        Self { bands: vec![band] }
    }

    /// Creates an equalizer with `count` default bands (at least one).
    pub fn with_band_count(count: usize) -> Self {
        Self {
            bands: vec![EqBand::default(); count.max(1)],
        }
    }

    /// The band editors and persistence operate on.
    pub fn band(&self) -> &EqBand {
        &self.bands[0]
    }

    /// Mutable access to the first band.
    pub fn band_mut(&mut self) -> &mut EqBand {
        &mut self.bands[0]
    }

    /// All bands.
    pub fn bands(&self) -> &[EqBand] {
        &self.bands
    }
}

impl Default for EqualizerParams {
    fn default() -> Self {
        Self::new(EqBand::default())
    }
}

/// What a slot holds: nothing, or exactly one effect with its parameters.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum EffectKind {
    /// No effect in this slot.
    #[default]
    Empty,
    /// Reverb.
    Reverb(ReverbParams),
    /// Distortion.
    Distortion(DistortionParams),
    /// Delay.
    Delay(DelayParams),
    /// Equalizer.
    Equalizer(EqualizerParams),
}

impl EffectKind {
    /// A freshly inserted effect of the given type with its default parameters.
    pub fn new(effect: EffectType) -> Self {
        match effect {
            EffectType::Reverb => EffectKind::Reverb(ReverbParams::default()),
            EffectType::Distortion => EffectKind::Distortion(DistortionParams::default()),
            EffectType::Delay => EffectKind::Delay(DelayParams::default()),
            EffectType::Equalizer => EffectKind::Equalizer(EqualizerParams::default()),
        }
    }

    /// The effect type, or `None` for [`EffectKind::Empty`].
    pub fn effect_type(&self) -> Option<EffectType> {
        match self {
            EffectKind::Empty => None,
            EffectKind::Reverb(_) => Some(EffectType::Reverb),
            EffectKind::Distortion(_) => Some(EffectType::Distortion),
            EffectKind::Delay(_) => Some(EffectType::Delay),
            EffectKind::Equalizer(_) => Some(EffectType::Equalizer),
        }
    }

    /// Returns `true` for [`EffectKind::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, EffectKind::Empty)
    }

    /// Bypass state. For the equalizer this is the first band's bypass.
    /// Always `false` for an empty slot.
    pub fn is_bypassed(&self) -> bool {
        match self {
            EffectKind::Empty => false,
            EffectKind::Reverb(p) => p.bypass,
            EffectKind::Distortion(p) => p.bypass,
            EffectKind::Delay(p) => p.bypass,
            EffectKind::Equalizer(p) => p.band().bypass,
        }
    }

    /// Sets the bypass state. No-op for an empty slot.
    pub fn set_bypass(&mut self, bypass: bool) {
        match self {
            EffectKind::Empty => {}
            EffectKind::Reverb(p) => p.bypass = bypass,
            EffectKind::Distortion(p) => p.bypass = bypass,
            EffectKind::Delay(p) => p.bypass = bypass,
            EffectKind::Equalizer(p) => p.band_mut().bypass = bypass,
        }
    }

    /// Reads a parameter, or `None` if this kind has no such parameter.
    pub fn param(&self, param: Param) -> Option<f64> {
        let value = match (self, param) {
            (EffectKind::Reverb(p), Param::Preset) => p.preset.index() as f64,
            (EffectKind::Reverb(p), Param::WetDryMix) => f64::from(p.wet_dry_mix),
            (EffectKind::Distortion(p), Param::Preset) => p.preset.index() as f64,
            (EffectKind::Distortion(p), Param::PreGain) => f64::from(p.pre_gain),
            (EffectKind::Distortion(p), Param::WetDryMix) => f64::from(p.wet_dry_mix),
            (EffectKind::Delay(p), Param::Feedback) => f64::from(p.feedback),
            (EffectKind::Delay(p), Param::DelayTime) => p.delay_time,
            (EffectKind::Delay(p), Param::LowPassCutoff) => f64::from(p.low_pass_cutoff),
            (EffectKind::Delay(p), Param::WetDryMix) => f64::from(p.wet_dry_mix),
            (EffectKind::Equalizer(p), Param::FilterType) => p.band().filter_type.index() as f64,
            (EffectKind::Equalizer(p), Param::Bandwidth) => f64::from(p.band().bandwidth),
            (EffectKind::Equalizer(p), Param::Frequency) => f64::from(p.band().frequency),
            (EffectKind::Equalizer(p), Param::Gain) => f64::from(p.band().gain),
            _ => return None,
        };
        Some(value)
    }

    /// Writes a parameter.
    ///
    /// Returns `false` and leaves the kind untouched when it has no such
    /// parameter (editor bindings are generic and can fire for the wrong kind
    /// while the slot is changing). Preset and filter indices are rounded;
    /// an index with no matching preset is also ignored, as is a non-finite
    /// `value`.
    pub fn set_param(&mut self, param: Param, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let index = value.round().max(0.0) as usize;
        match (self, param) {
            (EffectKind::Reverb(p), Param::Preset) => match ReverbPreset::from_index(index) {
                Some(preset) => p.preset = preset,
                None => return false,
            },
            (EffectKind::Reverb(p), Param::WetDryMix) => p.wet_dry_mix = value as f32,
            (EffectKind::Distortion(p), Param::Preset) => {
                match DistortionPreset::from_index(index) {
                    Some(preset) => p.preset = preset,
                    None => return false,
                }
            }
            (EffectKind::Distortion(p), Param::PreGain) => p.pre_gain = value as f32,
            (EffectKind::Distortion(p), Param::WetDryMix) => p.wet_dry_mix = value as f32,
            (EffectKind::Delay(p), Param::Feedback) => p.feedback = value as f32,
            (EffectKind::Delay(p), Param::DelayTime) => p.delay_time = value,
            (EffectKind::Delay(p), Param::LowPassCutoff) => p.low_pass_cutoff = value as f32,
            (EffectKind::Delay(p), Param::WetDryMix) => p.wet_dry_mix = value as f32,
            (EffectKind::Equalizer(p), Param::FilterType) => {
                match EqFilterType::from_index(index) {
                    Some(filter) => p.band_mut().filter_type = filter,
                    None => return false,
                }
            }
            (EffectKind::Equalizer(p), Param::Bandwidth) => p.band_mut().bandwidth = value as f32,
            (EffectKind::Equalizer(p), Param::Frequency) => p.band_mut().frequency = value as f32,
            (EffectKind::Equalizer(p), Param::Gain) => p.band_mut().gain = value as f32,
            _ => return false,
        }
        true
    }

    /// One-line description, e.g. `Reverb: Large room, mix 25%`.
    pub fn summary(&self) -> String {
        let bypass = if self.is_bypassed() { " [bypassed]" } else { "" };
        match self {
            EffectKind::Empty => "(empty)".to_string(),
            EffectKind::Reverb(p) => {
                format!("Reverb: {}, mix {:.0}%{bypass}", p.preset, p.wet_dry_mix)
            }
            EffectKind::Distortion(p) => format!(
                "Distortion: {}, pre-gain {:.2} dB, mix {:.0}%{bypass}",
                p.preset, p.pre_gain, p.wet_dry_mix
            ),
            EffectKind::Delay(p) => format!(
                "Delay: feedback {:.0}%, time {:.2} s, LP cutoff {:.0} Hz, mix {:.0}%{bypass}",
                p.feedback, p.delay_time, p.low_pass_cutoff, p.wet_dry_mix
            ),
            EffectKind::Equalizer(p) => {
                let band = p.band();
                format!(
                    "Equalizer: {}, bandwidth {:.2}, {:.0} Hz, gain {:.1} dB{bypass}",
                    band.filter_type, band.bandwidth, band.frequency, band.gain
                )
            }
        }
    }
}
