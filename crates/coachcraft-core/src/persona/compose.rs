//! Layered persona merge.
//!
//! Layers are folded left to right onto the defaults, so a later layer
//! (runtime) beats an earlier one (conversation), which beats the default.
//! The layer mix merges per key: a layer that only sets `reason` leaves the
//! other four weights at whatever the previous layer resolved.

use serde_json::{Map, Value};

use coachcraft_types::persona::{LayerMixOverride, Persona, PersonaOverride};

/// Merge `layers` onto `defaults` in order.
pub fn compose<'a, I>(defaults: &Persona, layers: I) -> Persona
where
    I: IntoIterator<Item = &'a PersonaOverride>,
{
    layers
        .into_iter()
        .fold(defaults.clone(), |mut persona, layer| {
            persona.apply(layer);
            persona
        })
}

/// Build an override from stored config of unknown shape.
///
/// Only values of the expected JSON type are taken: strings for text
/// fields, an array for `goals` (non-string items dropped), an object for
/// `layerMix` with numeric weights. Everything else is ignored, and a
/// non-object input yields an empty override. Never fails.
pub fn extract_override(value: &Value) -> PersonaOverride {
    let Some(config) = value.as_object() else {
        return PersonaOverride::default();
    };

    PersonaOverride {
        role: text_field(config, "role"),
        coach_type: text_field(config, "coachType"),
        tone: text_field(config, "tone"),
        thinking_framework: text_field(config, "thinkingFramework"),
        style_guidance: text_field(config, "styleGuidance"),
        custom_instructions: text_field(config, "customInstructions"),
        goals: config.get("goals").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        layer_mix: config
            .get("layerMix")
            .and_then(Value::as_object)
            .map(|mix| LayerMixOverride {
                phenomenon: mix.get("phenomenon").and_then(Value::as_f64),
                reason: mix.get("reason").and_then(Value::as_f64),
                essence: mix.get("essence").and_then(Value::as_f64),
                principle: mix.get("principle").and_then(Value::as_f64),
                trend: mix.get("trend").and_then(Value::as_f64),
            }),
    }
}

fn text_field(config: &Map<String, Value>, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}
