use launchpad_backend::FailureKind;

/// Where a generated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Produced by the generative backend and validated.
    Backend,
    /// No backend configured; deterministic content.
    Fallback,
    /// A backend is configured but the call failed; substitute content.
    Degraded(FailureKind),
}

/// A stage result tagged with its [`Origin`].
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Generated<T> {
    pub(crate) fn backend(value: T) -> Self {
        Self {
            value,
            origin: Origin::Backend,
        }
    }

    pub(crate) fn fallback(value: T) -> Self {
        Self {
            value,
            origin: Origin::Fallback,
        }
    }

    pub(crate) fn degraded(value: T, kind: FailureKind) -> Self {
        Self {
            value,
            origin: Origin::Degraded(kind),
        }
    }

    /// The failure class when a configured backend could not be used.
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        match self.origin {
            Origin::Degraded(kind) => Some(kind),
            Origin::Backend | Origin::Fallback => None,
        }
    }
}
