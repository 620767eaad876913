//! Errors raised by the reference models.

use crate::inputs::Mode;

/// Errors that can occur while advancing a model.
///
/// The register-level behavior itself never fails; these flag inputs the
/// model does not describe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The scanner reached CAPTURE with a mode that has no modeled RUN
    /// sequence. The hardware stalls in CAPTURE in this case.
    #[error("unsupported scan mode '{mode}' (code {code})", code = .mode.code())]
    UnsupportedMode {
        /// The latched mode.
        mode: Mode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_mode_display() {
        let e = ModelError::UnsupportedMode {
            mode: Mode::PingPong,
        };
        assert_eq!(e.to_string(), "unsupported scan mode 'pingpong' (code 1)");
    }
}
