use crate::error::Result;

/// The hook installation library the modules build on.
///
/// It is initialized before any module activates and uninitialized after the
/// shutdown procedures ran.
pub trait HookSubsystem {
    fn initialize(&mut self) -> Result<()>;
    fn uninitialize(&mut self);
}

/// For hosts that install no hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl HookSubsystem for NoHooks {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn uninitialize(&mut self) {}
}
