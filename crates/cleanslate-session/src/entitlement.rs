//! Scan authorization gate.

/// Decides whether this session may start a scan.
pub trait Entitlement: Send + Sync {
    fn is_entitled(&self) -> bool;
}

/// Grants every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEntitled;

impl Entitlement for AlwaysEntitled {
    fn is_entitled(&self) -> bool {
        true
    }
}

impl<F> Entitlement for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_entitled(&self) -> bool {
        self()
    }
}
