//! Coaching persona types.
//!
//! A [`Persona`] is the fully-resolved set of stylistic attributes that
//! shape a reply. A [`PersonaOverride`] is a partial persona supplied by a
//! conversation or by a single call; layers of overrides are folded onto a
//! default persona by the composer in `coachcraft-core`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Five-way weighting over the phenomenon → reason → essence → principle →
/// trend response structure. Always fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerMix {
    pub phenomenon: f64,
    pub reason: f64,
    pub essence: f64,
    pub principle: f64,
    pub trend: f64,
}

impl LayerMix {
    /// Apply every weight present in `layer`, leaving the others untouched.
    pub fn apply(&mut self, layer: &LayerMixOverride) {
        if let Some(v) = layer.phenomenon {
            self.phenomenon = v;
        }
        if let Some(v) = layer.reason {
            self.reason = v;
        }
        if let Some(v) = layer.essence {
            self.essence = v;
        }
        if let Some(v) = layer.principle {
            self.principle = v;
        }
        if let Some(v) = layer.trend {
            self.trend = v;
        }
    }
}

/// Renders as `现象30%｜原因25%｜本质20%｜原理15%｜趋势10%`.
impl fmt::Display for LayerMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "现象{}%｜原因{}%｜本质{}%｜原理{}%｜趋势{}%",
            self.phenomenon, self.reason, self.essence, self.principle, self.trend
        )
    }
}

/// A partial [`LayerMix`]; absent keys inherit from the previous layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMixOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phenomenon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// The resolved persona used to render a system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub role: String,
    pub coach_type: String,
    pub tone: String,
    pub thinking_framework: String,
    pub layer_mix: LayerMix,
    pub style_guidance: String,
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

impl Persona {
    /// Overwrite every field that `layer` sets.
    pub fn apply(&mut self, layer: &PersonaOverride) {
        if let Some(v) = &layer.role {
            self.role.clone_from(v);
        }
        if let Some(v) = &layer.coach_type {
            self.coach_type.clone_from(v);
        }
        if let Some(v) = &layer.tone {
            self.tone.clone_from(v);
        }
        if let Some(v) = &layer.thinking_framework {
            self.thinking_framework.clone_from(v);
        }
        if let Some(v) = &layer.style_guidance {
            self.style_guidance.clone_from(v);
        }
        if let Some(v) = &layer.goals {
            self.goals.clone_from(v);
        }
        if let Some(v) = &layer.custom_instructions {
            self.custom_instructions = Some(v.clone());
        }
        if let Some(mix) = &layer.layer_mix {
            self.layer_mix.apply(mix);
        }
    }
}

/// A partial persona supplied at conversation or call level.
///
/// Deserializes strictly from camelCase JSON. For stored conversation
/// config of unknown shape use the lenient extractor in `coachcraft-core`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_mix: Option<LayerMixOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_guidance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

impl PersonaOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix() -> LayerMix {
        LayerMix {
            phenomenon: 30.0,
            reason: 25.0,
            essence: 20.0,
            principle: 15.0,
            trend: 10.0,
        }
    }

    #[test]
    fn test_layer_mix_display_drops_trailing_zero() {
        assert_eq!(mix().to_string(), "现象30%｜原因25%｜本质20%｜原理15%｜趋势10%");
    }

    #[test]
    fn test_layer_mix_display_keeps_fraction() {
        let mut m = mix();
        m.reason = 12.5;
        assert!(m.to_string().contains("原因12.5%"));
    }

    #[test]
    fn test_layer_mix_apply_is_per_key() {
        let mut m = mix();
        m.apply(&LayerMixOverride {
            reason: Some(40.0),
            ..Default::default()
        });
        assert_eq!(m.reason, 40.0);
        assert_eq!(m.phenomenon, 30.0);
        assert_eq!(m.trend, 10.0);
    }

    #[test]
    fn test_override_deserializes_camel_case() {
        let json = r#"{"coachType":"韧性重塑教练","layerMix":{"trend":5}}"#;
        let layer: PersonaOverride = serde_json::from_str(json).unwrap();
        assert_eq!(layer.coach_type.as_deref(), Some("韧性重塑教练"));
        assert_eq!(layer.layer_mix.unwrap().trend, Some(5.0));
        assert!(layer.tone.is_none());
    }

    #[test]
    fn test_empty_override() {
        assert!(PersonaOverride::default().is_empty());
        let layer = PersonaOverride {
            tone: Some("沉稳".into()),
            ..Default::default()
        };
        assert!(!layer.is_empty());
    }
}
