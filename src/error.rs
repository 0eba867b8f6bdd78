use crate::fit::ForecastError;

/// Fatal error: terminates the run with `exit_code`.
///
/// Exit codes:
/// - `2` input/configuration problems (CSV open/parse, invalid flags)
/// - `3` no usable data
/// - `4` computation, rendering or terminal failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let exit_code = match err {
            ForecastError::InvalidParameter(_) => 2,
            _ => 4,
        };
        AppError::new(exit_code, format!("Forecasting failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_errors_map_to_exit_codes() {
        let err: AppError = ForecastError::InvalidParameter("interval_width".to_string()).into();
        assert_eq!(err.exit_code(), 2);

        let err: AppError = ForecastError::Computation("singular system".to_string()).into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("singular system"));
    }
}
