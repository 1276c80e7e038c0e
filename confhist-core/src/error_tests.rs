/*!
Tests for error handling and error types.
*/

#[cfg(test)]
mod tests {
    use crate::error::HistoryError;

    #[test]
    fn test_history_error_display() {
        let error = HistoryError::validation("empty root");
        assert_eq!(error.to_string(), "Validation error: empty root");

        let error = HistoryError::storage("disk full");
        assert_eq!(error.to_string(), "Storage error: disk full");

        let error = HistoryError::store_unavailable("/missing");
        assert_eq!(error.to_string(), "History store unavailable: /missing");

        let error = HistoryError::malformed_identifier("too short");
        assert_eq!(error.to_string(), "Malformed identifier: too short");

        let error = HistoryError::malformed_position("not hex");
        assert_eq!(error.to_string(), "Malformed position: not hex");
    }

    #[test]
    fn test_history_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let history_error = HistoryError::from(json_error);

        match history_error {
            HistoryError::Serialization(_) => {}
            _ => panic!("Expected Serialization error variant"),
        }
    }

    #[test]
    fn test_identifier_error_classification() {
        assert!(HistoryError::malformed_identifier("x").is_identifier_error());
        assert!(HistoryError::malformed_position("x").is_identifier_error());
        assert!(!HistoryError::storage("x").is_identifier_error());
        assert!(!HistoryError::store_unavailable("x").is_identifier_error());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<HistoryError>();
        assert_sync::<HistoryError>();
    }
}
