//! Dotted-path JSON configuration for the layout engine.
//!
//! Keys are grouped by section (`spring.*`, `shepard.*`, `layout.*`, `trigger.*`). Missing keys
//! fall back to the solver defaults; present keys of the wrong type or out of range are errors.

use narwhal::{
    InitialLayout, LiveParams, ShepardOptions, ShepardParams, SpringOptions, SpringParams,
    Trigger,
};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig(Value);

impl Default for EngineConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl EngineConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::config("<root>", e.to_string()))?;
        if !value.is_object() {
            return Err(Error::config("<root>", "expected a JSON object"));
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    fn lookup(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.lookup(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.lookup(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.lookup(dotted_path)?.as_f64()
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        self.lookup(dotted_path)?.as_u64()
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| Error::config(key, format!("expected a number, got {v}"))),
        }
    }

    fn count(&self, key: &str) -> Result<Option<u64>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                Error::config(key, format!("expected a non-negative integer, got {v}"))
            }),
        }
    }

    fn size(&self, key: &str) -> Result<Option<usize>> {
        self.count(key)?
            .map(|v| usize::try_from(v).map_err(|_| Error::config(key, "value too large")))
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| Error::config(key, format!("expected a boolean, got {v}"))),
        }
    }

    fn text(&self, key: &str) -> Result<Option<&str>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| Error::config(key, format!("expected a string, got {v}"))),
        }
    }

    pub fn seed(&self) -> Result<u64> {
        Ok(self.count("layout.seed")?.unwrap_or(0))
    }

    /// `layout.init`, or `fallback` when unset.
    pub fn initial_layout(&self, fallback: InitialLayout) -> Result<InitialLayout> {
        let seed = self.seed()?;
        match self.text("layout.init")? {
            None => Ok(fallback),
            Some("random") => Ok(InitialLayout::Random { seed }),
            Some("classical") => Ok(InitialLayout::Classical { seed }),
            Some(other) => Err(Error::config(
                "layout.init",
                format!("expected `random` or `classical`, got `{other}`"),
            )),
        }
    }

    pub fn spring_params(&self) -> Result<SpringParams> {
        let defaults = SpringParams::default();
        let params = SpringParams {
            freeness: self.number("spring.freeness")?.unwrap_or(defaults.freeness),
            spring_force: self
                .number("spring.springForce")?
                .unwrap_or(defaults.spring_force),
            damping_factor: self
                .number("spring.dampingFactor")?
                .unwrap_or(defaults.damping_factor),
        };
        params.validate().map_err(|e| invalid("spring", e))
    }

    pub fn shepard_params(&self) -> Result<ShepardParams> {
        let defaults = ShepardParams::default();
        let params = ShepardParams {
            alpha: self.number("shepard.alpha")?.unwrap_or(defaults.alpha),
            beta: self.number("shepard.beta")?.unwrap_or(defaults.beta),
        };
        params.validate().map_err(|e| invalid("shepard", e))
    }

    pub fn spring_options(&self) -> Result<SpringOptions> {
        let defaults = SpringOptions::default();
        let seed = self.seed()?;
        let options = SpringOptions {
            params: self.spring_params()?,
            initial: self.initial_layout(InitialLayout::Random { seed })?,
            delta_time: self
                .number("spring.deltaTime")?
                .unwrap_or(defaults.delta_time),
            neighbour_size: self
                .size("spring.neighbourSize")?
                .unwrap_or(defaults.neighbour_size),
            sample_size: self
                .size("spring.sampleSize")?
                .unwrap_or(defaults.sample_size),
            exhaustive_limit: self
                .size("spring.exhaustiveLimit")?
                .unwrap_or(defaults.exhaustive_limit),
            seed,
        };
        options.validate().map_err(|e| invalid("spring", e))?;
        Ok(options)
    }

    pub fn shepard_options(&self) -> Result<ShepardOptions> {
        let defaults = ShepardOptions::default();
        let seed = self.seed()?;
        Ok(ShepardOptions {
            params: self.shepard_params()?,
            initial: self.initial_layout(InitialLayout::Classical { seed })?,
            local_stage: self
                .flag("shepard.localStage")?
                .unwrap_or(defaults.local_stage),
            neighbour_size: self
                .size("spring.neighbourSize")?
                .unwrap_or(defaults.neighbour_size),
            sample_size: self
                .size("spring.sampleSize")?
                .unwrap_or(defaults.sample_size),
            seed,
        })
    }

    /// `trigger.kind` and `trigger.threshold`; `fallback` when no kind is set.
    ///
    /// An iteration trigger without a threshold keeps the fallback's count when it has one.
    pub fn trigger(&self, fallback: Trigger) -> Result<Trigger> {
        let kind = self.text("trigger.kind")?;
        let trigger = match kind {
            None => return Ok(fallback),
            Some("disabled") => Trigger::Disabled,
            Some("iterations") => match self.count("trigger.threshold")? {
                Some(n) => Trigger::Iterations(n),
                None => match fallback {
                    Trigger::Iterations(n) => Trigger::Iterations(n),
                    _ => return Err(Error::config("trigger.threshold", "missing")),
                },
            },
            Some("quantity") => match self.number("trigger.threshold")? {
                Some(q) => Trigger::Quantity(q),
                None => return Err(Error::config("trigger.threshold", "missing")),
            },
            Some(other) => {
                return Err(Error::config(
                    "trigger.kind",
                    format!("expected `iterations`, `quantity` or `disabled`, got `{other}`"),
                ));
            }
        };
        trigger
            .validate()
            .map_err(|e| Error::config("trigger.threshold", e.to_string()))
    }

    /// Everything a [`narwhal::ParameterChannel`] carries.
    pub fn live_params(&self, fallback_trigger: Trigger) -> Result<LiveParams> {
        Ok(LiveParams {
            spring: self.spring_params()?,
            shepard: self.shepard_params()?,
            trigger: self.trigger(fallback_trigger)?,
        })
    }
}

fn invalid(section: &str, err: narwhal::Error) -> Error {
    match &err {
        narwhal::Error::InvalidParameter { name, .. } => {
            Error::config(format!("{section}.{name}"), err.to_string())
        }
        _ => Error::config(section, err.to_string()),
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
