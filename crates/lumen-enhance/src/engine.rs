//! The enhancer capability and the closed set of engines.

use crate::agcwd::{Agcwd, AgcwdParams};
use crate::bimef::{Bimef, BimefParams};
use lumen_core::{PixelBuffer, Result};
use serde::{Deserialize, Serialize};

/// An image enhancement engine.
///
/// Engines are immutable parameter holders: `enhance` derives everything it
/// needs per call, so one engine may serve many threads at once.
pub trait Enhancer: Send + Sync {
    /// Short lowercase name for logs.
    fn name(&self) -> &'static str;

    /// Enhances `buffer`, returning a new buffer of the same shape and
    /// sample type.
    fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer>;

    /// Largest side this engine should be run at; see
    /// [`ResolutionAdapter::for_engine`](crate::ResolutionAdapter::for_engine).
    fn max_working_dimension(&self) -> u32;
}

/// Engine selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Adaptive gamma correction.
    #[default]
    Agcwd,
    /// Multi-exposure fusion.
    Bimef,
}

/// One of the available engines.
#[derive(Debug, Clone, PartialEq)]
pub enum Engine {
    /// AGCWD.
    Agcwd(Agcwd),
    /// BIMEF.
    Bimef(Bimef),
}

impl Engine {
    /// AGCWD with the given parameters.
    pub fn agcwd(params: AgcwdParams) -> Self {
        Engine::Agcwd(Agcwd::new(params))
    }

    /// BIMEF with the given parameters.
    pub fn bimef(params: BimefParams) -> Self {
        Engine::Bimef(Bimef::new(params))
    }

    /// Which engine this is.
    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Agcwd(_) => EngineKind::Agcwd,
            Engine::Bimef(_) => EngineKind::Bimef,
        }
    }

    fn inner(&self) -> &dyn Enhancer {
        match self {
            Engine::Agcwd(e) => e,
            Engine::Bimef(e) => e,
        }
    }
}

impl From<Agcwd> for Engine {
    fn from(engine: Agcwd) -> Self {
        Engine::Agcwd(engine)
    }
}

impl From<Bimef> for Engine {
    fn from(engine: Bimef) -> Self {
        Engine::Bimef(engine)
    }
}

impl Enhancer for Engine {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn enhance(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        self.inner().enhance(buffer)
    }

    fn max_working_dimension(&self) -> u32 {
        self.inner().max_working_dimension()
    }
}
