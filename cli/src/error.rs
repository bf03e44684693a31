/// Global error message shown to the user, with an optional hint
#[derive(Debug)]
pub struct Error(String, Option<String>);

impl Error {
    pub fn new(message: &str, details: Option<&str>) -> Self {
        Error(message.to_string(), details.map(|d| d.to_string()))
    }
}

/// Display the message and details, as sort of a hint
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.1 {
            Some(details) => write!(f, "{}\n\n{}", self.0, console::style(details).dim()),
            None => write!(f, "{}", self.0),
        }
    }
}

impl std::error::Error for Error {}

/// Keep user-facing errors raised deeper in the stack, wrap anything else
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        log::error!("{error:?}");

        error
            .downcast::<Error>()
            .unwrap_or_else(|err| Error::new(&err.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_error_survives_report() {
        let report = eyre::Report::new(Error::new("Stack not found", Some("Deploy it first.")));
        let error: Error = report.into();

        assert_eq!(error.0, "Stack not found");
        assert_eq!(error.1.as_deref(), Some("Deploy it first."));
    }

    #[test]
    fn test_other_errors_keep_their_message() {
        let error: Error = eyre::eyre!("Failed to describe stack").into();

        assert_eq!(error.0, "Failed to describe stack");
        assert!(error.1.is_none());
    }
}
