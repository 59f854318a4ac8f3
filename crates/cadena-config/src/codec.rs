//! Mapping between [`ChainParts`] and stored [`ChainRecord`]s.
//!
//! Decoding never fails. A bank with an unknown `"type"` becomes an empty
//! slot; a missing or unparsable value falls back to the default a freshly
//! inserted effect of that type would have, and is logged.

use std::path::{Path, PathBuf};

use cadena_core::{
    Chain, ChainId, ChainParts, DelayParams, DistortionParams, DistortionPreset, EffectKind,
    EffectType, EqBand, EqFilterType, EqualizerParams, Param, ReverbParams, ReverbPreset,
};

use crate::record::{BankMap, ChainRecord};

/// Key selecting the bank's effect type.
pub const TYPE_KEY: &str = "type";
/// Bank `"type"` of an empty slot.
pub const EMPTY_TYPE: &str = "empty";
/// Key of the bypass flag.
pub const BYPASS_KEY: &str = "bypass";

const BYPASS_ON: &str = "On";
const BYPASS_OFF: &str = "Off";

/// Encodes a chain's persisted state.
pub fn encode_chain(chain: &Chain) -> ChainRecord {
    encode(&chain.to_parts())
}

/// Encodes persisted state into the stored record shape.
pub fn encode(parts: &ChainParts) -> ChainRecord {
    ChainRecord {
        id: parts.id.as_str().to_string(),
        name: parts.name.clone(),
        volume: parts.volume,
        last_opened_file: parts.source_ref.as_deref().map(path_to_file_url),
        banks: parts.slots.iter().map(encode_bank).collect(),
    }
}

/// Decodes a stored record.
///
/// The slot list is returned as stored; padding to the chain's capacity
/// happens in [`Chain::from_parts`].
pub fn decode(record: &ChainRecord) -> ChainParts {
    ChainParts {
        id: ChainId::from(record.id.as_str()),
        name: record.name.clone(),
        volume: record.volume,
        source_ref: record.last_opened_file.as_deref().map(file_url_to_path),
        slots: record.banks.iter().map(decode_bank).collect(),
    }
}

/// Encodes one slot.
pub fn encode_bank(kind: &EffectKind) -> BankMap {
    let mut bank = BankMap::new();
    let Some(effect) = kind.effect_type() else {
        bank.insert(TYPE_KEY.into(), EMPTY_TYPE.into());
        return bank;
    };
    bank.insert(TYPE_KEY.into(), effect.id().into());

    let mut put = |param: Param, value: String| {
        bank.insert(param.key().into(), value);
    };
    match kind {
        EffectKind::Empty => {}
        EffectKind::Reverb(p) => {
            put(Param::Preset, p.preset.index().to_string());
            put(Param::WetDryMix, fmt_f32(p.wet_dry_mix));
        }
        EffectKind::Distortion(p) => {
            put(Param::Preset, p.preset.index().to_string());
            put(Param::PreGain, fmt_f32(p.pre_gain));
            put(Param::WetDryMix, fmt_f32(p.wet_dry_mix));
        }
        EffectKind::Delay(p) => {
            put(Param::Feedback, fmt_f32(p.feedback));
            put(Param::DelayTime, format!("{:?}", p.delay_time));
            put(Param::LowPassCutoff, fmt_f32(p.low_pass_cutoff));
            put(Param::WetDryMix, fmt_f32(p.wet_dry_mix));
        }
        EffectKind::Equalizer(p) => {
            let band = p.band();
            put(Param::FilterType, band.filter_type.index().to_string());
            put(Param::Bandwidth, fmt_f32(band.bandwidth));
            put(Param::Frequency, fmt_f32(band.frequency));
            put(Param::Gain, fmt_f32(band.gain));
        }
    }
    let bypass = if kind.is_bypassed() { BYPASS_ON } else { BYPASS_OFF };
    bank.insert(BYPASS_KEY.into(), bypass.into());
    bank
}

/// Decodes one slot, substituting defaults for anything missing or
/// malformed.
pub fn decode_bank(bank: &BankMap) -> EffectKind {
    let type_id = bank.get(TYPE_KEY).map(String::as_str).unwrap_or(EMPTY_TYPE);
    let Some(effect) = EffectType::from_id(type_id) else {
        if type_id != EMPTY_TYPE {
            tracing::warn!("unknown bank type '{type_id}', using an empty slot");
        }
        return EffectKind::Empty;
    };

    let fields = Fields { bank, effect };
    let bypass = bank.get(BYPASS_KEY).is_some_and(|v| v == BYPASS_ON);

    match effect {
        EffectType::Reverb => {
            let d = ReverbParams::default();
            EffectKind::Reverb(ReverbParams {
                preset: fields
                    .index(Param::Preset)
                    .and_then(ReverbPreset::from_index)
                    .unwrap_or(d.preset),
                wet_dry_mix: fields.f32(Param::WetDryMix, d.wet_dry_mix),
                bypass,
            })
        }
        EffectType::Distortion => {
            let d = DistortionParams::default();
            EffectKind::Distortion(DistortionParams {
                preset: fields
                    .index(Param::Preset)
                    .and_then(DistortionPreset::from_index)
                    .unwrap_or(d.preset),
                pre_gain: fields.f32(Param::PreGain, d.pre_gain),
                wet_dry_mix: fields.f32(Param::WetDryMix, d.wet_dry_mix),
                bypass,
            })
        }
        EffectType::Delay => {
            let d = DelayParams::default();
            EffectKind::Delay(DelayParams {
                feedback: fields.f32(Param::Feedback, d.feedback),
                delay_time: fields.f64(Param::DelayTime, d.delay_time),
                low_pass_cutoff: fields.f32(Param::LowPassCutoff, d.low_pass_cutoff),
                wet_dry_mix: fields.f32(Param::WetDryMix, d.wet_dry_mix),
                bypass,
            })
        }
        EffectType::Equalizer => {
            let d = EqBand::default();
            EffectKind::Equalizer(EqualizerParams::new(EqBand {
                filter_type: fields
                    .index(Param::FilterType)
                    .and_then(EqFilterType::from_index)
                    .unwrap_or(d.filter_type),
                bandwidth: fields.f32(Param::Bandwidth, d.bandwidth),
                frequency: fields.f32(Param::Frequency, d.frequency),
                gain: fields.f32(Param::Gain, d.gain),
                bypass,
            }))
        }
    }
}

struct Fields<'a> {
    bank: &'a BankMap,
    effect: EffectType,
}

impl Fields<'_> {
    fn raw(&self, param: Param) -> Option<&str> {
        let value = self.bank.get(param.key()).map(|v| v.trim());
        if value.is_none() {
            tracing::warn!("{} bank missing '{}', using default", self.effect.id(), param);
        }
        value
    }

    fn parsed<T: std::str::FromStr>(&self, param: Param) -> Option<T> {
        let raw = self.raw(param)?;
        let value = raw.parse().ok();
        if value.is_none() {
            tracing::warn!(
                "{} bank has unparsable '{}' = {raw:?}, using default",
                self.effect.id(),
                param
            );
        }
        value
    }

    fn f32(&self, param: Param, default: f32) -> f32 {
        self.parsed::<f32>(param)
            .filter(|v| v.is_finite())
            .map_or(default, |v| self.clamped(param, f64::from(v)) as f32)
    }

    fn f64(&self, param: Param, default: f64) -> f64 {
        self.parsed::<f64>(param)
            .filter(|v| v.is_finite())
            .map_or(default, |v| self.clamped(param, v))
    }

    /// Clamps to the parameter's range. The source is not known here, so
    /// Nyquist-bound maxima are left open.
    fn clamped(&self, param: Param, value: f64) -> f64 {
        let Some(range) = self.effect.param_range(param, f64::INFINITY) else {
            return value;
        };
        let clamped = value.clamp(*range.start(), *range.end());
        if clamped != value {
            tracing::warn!(
                "{} bank '{}' = {value} out of range, using {clamped}",
                self.effect.id(),
                param
            );
        }
        clamped
    }

    fn index(&self, param: Param) -> Option<usize> {
        self.parsed::<usize>(param)
    }
}

/// Shortest round-trip decimal form, keeping `.0` on whole numbers.
pub fn fmt_f32(value: f32) -> String {
    format!("{value:?}")
}

// --- file URLs ---------------------------------------------------------------

const FILE_SCHEME: &str = "file://";

/// Converts a path to a `file://` URL, percent-encoding reserved bytes.
pub fn path_to_file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut url = String::with_capacity(FILE_SCHEME.len() + raw.len() + 1);
    url.push_str(FILE_SCHEME);
    if !raw.starts_with('/') {
        url.push('/');
    }
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || b"/-._~!$&'()*+,;=:@".contains(&byte) {
            url.push(byte as char);
        } else {
            url.push_str(&format!("%{byte:02X}"));
        }
    }
    url
}

/// Converts a `file://` URL (or a plain path) back to a path.
pub fn file_url_to_path(value: &str) -> PathBuf {
    let Some(rest) = value.strip_prefix(FILE_SCHEME) else {
        return PathBuf::from(value);
    };
    // file://localhost/path
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    PathBuf::from(percent_decode(rest))
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(b) = u8::from_str_radix(hex, 16)
        {
            out.push(b);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(pairs: &[(&str, &str)]) -> BankMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decodes_equalizer_bank() {
        let kind = decode_bank(&bank(&[
            ("type", "equalizer"),
            ("filter", "3"),
            ("bandwidth", "1.4"),
            ("frequency", "18000.0"),
            ("gain", "0.0"),
            ("bypass", "Off"),
        ]));
        let EffectKind::Equalizer(eq) = kind else {
            panic!("expected equalizer, got {kind:?}");
        };
        let band = eq.band();
        assert_eq!(band.filter_type, EqFilterType::ResonantLowPass);
        assert_eq!(band.bandwidth, 1.4);
        assert_eq!(band.frequency, 18000.0);
        assert_eq!(band.gain, 0.0);
        assert!(!band.bypass);
    }

    #[test]
    fn british_spelling_decodes_as_equalizer() {
        let kind = decode_bank(&bank(&[("type", "equaliser"), ("bypass", "On")]));
        assert_eq!(kind.effect_type(), Some(EffectType::Equalizer));
        assert!(kind.is_bypassed());
    }

    #[test]
    fn unknown_type_is_empty() {
        assert!(decode_bank(&bank(&[("type", "chorus")])).is_empty());
        assert!(decode_bank(&bank(&[("", "")])).is_empty());
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let kind = decode_bank(&bank(&[
            ("type", "delay"),
            ("feedback", "lots"),
            ("delayTime", "0.25"),
            ("wetDryMix", "NaN"),
        ]));
        let EffectKind::Delay(delay) = kind else {
            panic!("expected delay, got {kind:?}");
        };
        let d = DelayParams::default();
        assert_eq!(delay.feedback, d.feedback);
        assert_eq!(delay.delay_time, 0.25);
        assert_eq!(delay.low_pass_cutoff, d.low_pass_cutoff);
        assert_eq!(delay.wet_dry_mix, d.wet_dry_mix);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let kind = decode_bank(&bank(&[
            ("type", "equalizer"),
            ("bandwidth", "99"),
            ("frequency", "96000.0"),
            ("gain", "-500"),
        ]));
        let EffectKind::Equalizer(eq) = kind else {
            panic!("expected equalizer, got {kind:?}");
        };
        let band = eq.band();
        assert_eq!(band.bandwidth, 5.0);
        assert_eq!(band.frequency, 96000.0);
        assert_eq!(band.gain, -96.0);

        let kind = decode_bank(&bank(&[
            ("type", "reverb"),
            ("wetDryMix", "500"),
        ]));
        assert_eq!(kind.param(Param::WetDryMix), Some(100.0));

        let kind = decode_bank(&bank(&[("type", "delay"), ("delayTime", "-3")]));
        assert_eq!(kind.param(Param::DelayTime), Some(0.0));
    }

    #[test]
    fn missing_filter_defaults_to_parametric() {
        let kind = decode_bank(&bank(&[("type", "equalizer"), ("filter", "42")]));
        let EffectKind::Equalizer(eq) = kind else {
            panic!("expected equalizer");
        };
        assert_eq!(eq.band().filter_type, EqFilterType::Parametric);
    }

    #[test]
    fn encodes_floats_like_saved_data() {
        let reverb = encode_bank(&EffectKind::Reverb(ReverbParams {
            preset: ReverbPreset::LargeRoom,
            wet_dry_mix: 23.410406,
            bypass: false,
        }));
        assert_eq!(
            reverb,
            bank(&[
                ("type", "reverb"),
                ("preset", "2"),
                ("wetDryMix", "23.410406"),
                ("bypass", "Off"),
            ])
        );

        let delay = encode_bank(&EffectKind::new(EffectType::Delay));
        assert_eq!(delay["lowPassCutoff"], "15000.0");
        assert_eq!(delay["delayTime"], "1.0");
    }

    #[test]
    fn empty_slot_encodes_type_only() {
        assert_eq!(encode_bank(&EffectKind::Empty), bank(&[("type", "empty")]));
    }

    #[test]
    fn record_round_trip() {
        let parts = ChainParts {
            id: ChainId::from("607B899B-159E-4E54-8287-3E8E6E96F6DB"),
            name: "Example queue 4".into(),
            volume: 0.8,
            source_ref: Some(PathBuf::from("/tmp/my loops/take #1.wav")),
            slots: vec![
                EffectKind::Distortion(DistortionParams {
                    preset: DistortionPreset::MultiDistortedSquared,
                    pre_gain: -6.011566,
                    wet_dry_mix: 60.40462,
                    bypass: true,
                }),
                EffectKind::Empty,
                EffectKind::Delay(DelayParams {
                    feedback: 17.919075,
                    delay_time: 0.13294798135757446,
                    low_pass_cutoff: 1500.0,
                    wet_dry_mix: 50.0,
                    bypass: false,
                }),
            ],
        };
        let record = encode(&parts);
        assert_eq!(
            record.last_opened_file.as_deref(),
            Some("file:///tmp/my%20loops/take%20%231.wav")
        );
        assert_eq!(decode(&record), parts);
    }

    #[test]
    fn plain_paths_are_accepted_as_file_refs() {
        assert_eq!(file_url_to_path("/a/b.wav"), PathBuf::from("/a/b.wav"));
        assert_eq!(
            file_url_to_path("file://localhost/a/b%2Ec.wav"),
            PathBuf::from("/a/b.c.wav")
        );
        assert_eq!(file_url_to_path("file:///a/100%"), PathBuf::from("/a/100%"));
    }
}
