/// Errors raised by domain-level checks in `intake-core`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown field '{field}' for sheet '{sheet}'")]
    UnknownField { sheet: String, field: String },
}
