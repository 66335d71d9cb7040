/// Work IO
///
/// Communicate between `work()` and the caller driving the stage.
#[derive(Clone, Debug, Default)]
pub struct WorkIo {
    /// Call block immediately again
    pub call_again: bool,
    /// Mark block as finished
    pub finished: bool,
}
