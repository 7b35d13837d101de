//! Per-double configuration.

use crate::domain::kind::DefaultAnswer;

/// Default number of grouped calls listed in a verification failure.
pub const DEFAULT_REPORT_LIMIT: usize = 20;

/// Error returned when building [`DoubleSettings`] or creating a double fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Name must not be empty
    EmptyName,
    /// Report limit must be greater than zero
    ZeroReportLimit,
    /// Calling real methods requires a real instance
    RealMethodsWithoutInstance,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::EmptyName => write!(f, "double name must not be empty"),
            BuildError::ZeroReportLimit => {
                write!(f, "report_limit must be greater than 0")
            }
            BuildError::RealMethodsWithoutInstance => {
                write!(f, "CallRealMethods requires a spy; a mock has no real instance")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Validated settings for a double.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoubleSettings {
    name: Option<String>,
    default_answer: Option<DefaultAnswer>,
    stub_only: bool,
    report_limit: Option<usize>,
}

impl DoubleSettings {
    /// Start building settings.
    pub fn builder() -> DoubleSettingsBuilder {
        DoubleSettingsBuilder::default()
    }

    /// Configured name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Configured answer for unstubbed calls, if any.
    pub fn default_answer(&self) -> Option<DefaultAnswer> {
        self.default_answer
    }

    /// Whether calls are left unrecorded.
    pub fn stub_only(&self) -> bool {
        self.stub_only
    }

    /// Maximum grouped calls listed in failure reports.
    pub fn report_limit(&self) -> usize {
        self.report_limit.unwrap_or(DEFAULT_REPORT_LIMIT)
    }

    /// Fill in the name when none was configured.
    pub(crate) fn or_named(mut self, name: &str) -> Self {
        if self.name.is_none() {
            self.name = Some(name.to_string());
        }
        self
    }
}

/// Builder for constructing [`DoubleSettings`].
///
/// # Example
/// ```
/// use test_doubles::{DefaultAnswer, DoubleSettings};
///
/// let settings = DoubleSettings::builder()
///     .with_name("inventory")
///     .with_default_answer(DefaultAnswer::Strict)
///     .with_report_limit(5)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.name(), Some("inventory"));
/// assert_eq!(settings.report_limit(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DoubleSettingsBuilder {
    name: Option<String>,
    default_answer: Option<DefaultAnswer>,
    stub_only: bool,
    report_limit: Option<usize>,
}

impl DoubleSettingsBuilder {
    /// Name shown in diagnostics instead of the mocked trait's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override what unstubbed calls do.
    pub fn with_default_answer(mut self, answer: DefaultAnswer) -> Self {
        self.default_answer = Some(answer);
        self
    }

    /// Stop recording calls. Stubs keep working; verification is refused.
    pub fn with_stub_only(mut self, stub_only: bool) -> Self {
        self.stub_only = stub_only;
        self
    }

    /// Maximum grouped calls listed in a verification failure.
    pub fn with_report_limit(mut self, limit: usize) -> Self {
        self.report_limit = Some(limit);
        self
    }

    /// Validate and build the settings.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if the name is empty or the report limit is zero.
    pub fn build(self) -> Result<DoubleSettings, BuildError> {
        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(BuildError::EmptyName);
        }
        if self.report_limit == Some(0) {
            return Err(BuildError::ZeroReportLimit);
        }

        Ok(DoubleSettings {
            name: self.name,
            default_answer: self.default_answer,
            stub_only: self.stub_only,
            report_limit: self.report_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DoubleSettings::builder().build().unwrap();

        assert_eq!(settings.name(), None);
        assert_eq!(settings.default_answer(), None);
        assert!(!settings.stub_only());
        assert_eq!(settings.report_limit(), DEFAULT_REPORT_LIMIT);
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = DoubleSettings::builder().with_name("").build();
        assert_eq!(result, Err(BuildError::EmptyName));
    }

    #[test]
    fn test_zero_report_limit_rejected() {
        let result = DoubleSettings::builder().with_report_limit(0).build();
        assert_eq!(result, Err(BuildError::ZeroReportLimit));
    }

    #[test]
    fn test_or_named_keeps_explicit_name() {
        let explicit = DoubleSettings::builder()
            .with_name("mockedList")
            .build()
            .unwrap()
            .or_named("List");
        assert_eq!(explicit.name(), Some("mockedList"));

        let fallback = DoubleSettings::default().or_named("List");
        assert_eq!(fallback.name(), Some("List"));
    }

    #[test]
    fn test_build_error_display() {
        assert_eq!(
            BuildError::ZeroReportLimit.to_string(),
            "report_limit must be greater than 0"
        );
        assert!(BuildError::RealMethodsWithoutInstance
            .to_string()
            .contains("requires a spy"));
    }
}
