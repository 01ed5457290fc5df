use checkin_qr_core::{base_filename, sanitize, Payload};
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitized_names_use_only_safe_characters(raw in any::<String>()) {
        let clean = sanitize(&raw);
        prop_assert!(clean
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        prop_assert!(!clean.contains('/') && !clean.contains('\\'));
    }

    #[test]
    fn sanitize_keeps_safe_input_intact(raw in "[A-Za-z0-9_-]{0,40}") {
        prop_assert_eq!(sanitize(&raw), raw);
    }

    #[test]
    fn participant_file_names_never_escape_directory(
        uuid in any::<String>(),
        name in any::<String>(),
    ) {
        let payload = Payload::Participant { uuid, name, team: String::new() };
        if let Ok(base) = base_filename(&payload) {
            prop_assert!(!base.contains('/') && !base.contains('\\') && !base.contains(".."));
            prop_assert!(base.contains('_'));
        }
    }
}
