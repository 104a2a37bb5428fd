//! Property-based tests for the CLI configuration and output layers.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::config::{CliOverrides, Config};
    use crate::output::{ChallengeOutput, OutputFormat, OutputFormatter};
    use crate::parse_hex_array;

    fn any_format() -> impl Strategy<Value = OutputFormat> {
        prop_oneof![Just(OutputFormat::Table), Just(OutputFormat::Json), Just(OutputFormat::Quiet)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // CLI flags always win over file values, and an absent flag never changes a value.
        #[test]
        fn test_overrides_take_precedence(
            format in any_format(),
            encoding in prop_oneof![Just("base58"), Just("base32")],
            max_version in 0u8..=1,
            debug in any::<bool>(),
        ) {
            let overrides = CliOverrides {
                output_format: Some(format.to_string()),
                verbose: None,
                debug: Some(debug),
                encoding: Some(encoding.to_string()),
                max_version: Some(max_version),
            };
            let config = Config::default().with_overrides(&overrides);
            let expected_format = format.to_string();
            prop_assert_eq!(config.output.format.as_str(), expected_format.as_str());
            prop_assert_eq!(config.protocol.encoding.as_str(), encoding);
            prop_assert_eq!(config.protocol.max_version, max_version);
            prop_assert_eq!(config.logging.level == "debug", debug);
            prop_assert!(!config.output.verbose);
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn test_output_format_display_round_trip(format in any_format()) {
            prop_assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }

        #[test]
        fn test_json_output_always_parses(challenge in "[1-9A-HJ-NP-Za-km-z]{1,120}", version in 0u8..=1) {
            let output = ChallengeOutput::new(challenge.clone(), version, "recipient", None);
            let rendered = OutputFormatter::new(OutputFormat::Json, false).render(&output, "challenge create");
            let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
            prop_assert_eq!(value["data"]["challenge"].as_str(), Some(challenge.as_str()));
        }

        #[test]
        fn test_hex_key_round_trip(key in any::<[u8; 32]>()) {
            let parsed: [u8; 32] = parse_hex_array(&hex::encode(key), "key").unwrap();
            prop_assert_eq!(parsed, key);
        }
    }
}
