/// Errors returned by [`CountDownLatch`](crate::CountDownLatch) decrements.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum LatchError {
    /// A decrement was attempted after the count down already reached zero.
    #[error("latch count down already complete")]
    AlreadyCompleted,
}

pub type Result<T, E = LatchError> = std::result::Result<T, E>;
