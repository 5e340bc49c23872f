//! Result type alias for Vigil

use super::errors::VigilError;

/// Result type alias for Vigil operations
///
/// # Examples
///
/// ```
/// use vigil::domain::result::Result;
/// use vigil::domain::errors::VigilError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(VigilError::InvalidInput("blank name".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
