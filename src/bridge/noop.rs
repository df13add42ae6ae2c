use tracing::debug;

use crate::error::BridgeError;
use crate::platform::Platform;

use super::{Completion, CompletionChannel, NativeBridge, PatternFormat};

/// Bridge for desktop, editor and test builds where no native player exists.
///
/// The gateway short-circuits on [`Platform::Unsupported`] before reaching
/// these methods; they only log in case something calls them directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBridge;

impl NativeBridge for NoopBridge {
    fn platform(&self) -> Platform {
        Platform::Unsupported
    }

    fn completion_channel(&self) -> CompletionChannel {
        CompletionChannel::Proxy
    }

    fn play(
        &self,
        format: PatternFormat,
        path: &str,
        _completion: Completion,
    ) -> Result<(), BridgeError> {
        debug!("[Bridge] {}('{}') ignored: no native player", format.play_method(), path);
        Ok(())
    }

    fn play_built_in(&self, effect_name: &str) -> Result<(), BridgeError> {
        debug!("[Bridge] playBuiltIn('{}') ignored: no native player", effect_name);
        Ok(())
    }

    fn preload(&self, _format: PatternFormat, _path: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    fn unload(&self, _format: PatternFormat, _path_or_dir: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    fn unload_all(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}
