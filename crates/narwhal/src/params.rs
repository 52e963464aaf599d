//! Live-tunable solver parameters shared between a running worker and its controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::convergence::Trigger;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringParams {
    /// Fraction of velocity kept from one iteration to the next.
    pub freeness: f64,
    pub spring_force: f64,
    pub damping_factor: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            freeness: 0.85,
            spring_force: 0.7,
            damping_factor: 0.3,
        }
    }
}

impl SpringParams {
    pub fn validate(self) -> Result<Self> {
        unit("freeness", self.freeness)?;
        unit("springForce", self.spring_force)?;
        unit("dampingFactor", self.damping_factor)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShepardParams {
    /// Step size; 0.2 is one full majorisation step.
    pub alpha: f64,
    /// Momentum carried over from the previous step.
    pub beta: f64,
}

impl Default for ShepardParams {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.0,
        }
    }
}

impl ShepardParams {
    pub fn validate(self) -> Result<Self> {
        unit("alpha", self.alpha)?;
        unit("beta", self.beta)?;
        Ok(self)
    }
}

/// Everything a controller may change while a solver runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveParams {
    pub spring: SpringParams,
    pub shepard: ShepardParams,
    pub trigger: Trigger,
}

impl LiveParams {
    pub fn validate(self) -> Result<Self> {
        self.spring.validate()?;
        self.shepard.validate()?;
        self.trigger.validate()?;
        Ok(self)
    }
}

fn unit(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

/// Thread-safe conduit for [`LiveParams`].
///
/// Writers replace the whole configuration under a lock and bump a generation counter; the
/// worker polls the counter once per iteration and copies the configuration only when it moved,
/// so readers never see a half-applied update.
#[derive(Debug, Clone)]
pub struct ParameterChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug)]
struct ChannelInner {
    params: Mutex<LiveParams>,
    defaults: LiveParams,
    generation: AtomicU64,
}

impl Default for ParameterChannel {
    fn default() -> Self {
        Self::new(LiveParams::default())
    }
}

impl ParameterChannel {
    /// `params` also become the values restored by [`ParameterChannel::restore_defaults`].
    pub fn new(params: LiveParams) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                params: Mutex::new(params),
                defaults: params,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn snapshot(&self) -> LiveParams {
        *self.lock()
    }

    /// Number of updates published so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Applies `f` to a copy of the current configuration and publishes it if it validates.
    pub fn update(&self, f: impl FnOnce(&mut LiveParams)) -> Result<()> {
        let mut guard = self.lock();
        let mut next = *guard;
        f(&mut next);
        *guard = next.validate()?;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn set_freeness(&self, value: f64) -> Result<()> {
        self.update(|p| p.spring.freeness = value)
    }

    pub fn set_spring_force(&self, value: f64) -> Result<()> {
        self.update(|p| p.spring.spring_force = value)
    }

    pub fn set_damping_factor(&self, value: f64) -> Result<()> {
        self.update(|p| p.spring.damping_factor = value)
    }

    pub fn set_alpha(&self, value: f64) -> Result<()> {
        self.update(|p| p.shepard.alpha = value)
    }

    pub fn set_beta(&self, value: f64) -> Result<()> {
        self.update(|p| p.shepard.beta = value)
    }

    pub fn set_trigger(&self, trigger: Trigger) -> Result<()> {
        self.update(|p| p.trigger = trigger)
    }

    /// Resets every parameter and the trigger in one write.
    pub fn restore_defaults(&self) {
        let mut guard = self.lock();
        *guard = self.inner.defaults;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the configuration if it changed since generation `seen`, advancing `seen`.
    pub(crate) fn drain(&self, seen: &mut u64) -> Option<LiveParams> {
        if self.generation() == *seen {
            return None;
        }
        let guard = self.lock();
        *seen = self.inner.generation.load(Ordering::Acquire);
        Some(*guard)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LiveParams> {
        self.inner.params.lock().unwrap_or_else(|e| e.into_inner())
    }
}
