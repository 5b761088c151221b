//! Boot Argument Unit Tests
//!
//! Tests for capturing the argument vector and deriving override views
//! without ever altering the original input.

#[cfg(test)]
mod tests {
    use crate::args::BootArgs;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    /// The captured vector is exactly the input, order and content untouched.
    #[test]
    fn test_raw_vector_is_verbatim() {
        let input = argv(&["--server.port=9090", "migrate", "--debug", "--log.format=json"]);
        let args = BootArgs::capture(input.clone());

        assert_eq!(args.raw(), input.as_slice());
    }

    #[test]
    fn test_empty_capture() {
        let args = BootArgs::capture(Vec::new());

        assert!(args.raw().is_empty());
        assert!(args.overrides().is_empty());
        assert!(args.non_options().is_empty());
        assert_eq!(args.override_of("server.port"), None);
    }

    /// `--key=value` splits on the first equals sign only.
    #[test]
    fn test_override_extraction() {
        let args = BootArgs::capture(argv(&[
            "--server.port=9090",
            "--log.filter=info,hexboot=debug",
            "--token=a=b=c",
            "--motd=héllo wörld ☃",
        ]));

        assert_eq!(
            args.overrides(),
            &[
                ("server.port".to_string(), "9090".to_string()),
                ("log.filter".to_string(), "info,hexboot=debug".to_string()),
                ("token".to_string(), "a=b=c".to_string()),
                ("motd".to_string(), "héllo wörld ☃".to_string()),
            ]
        );
    }

    /// A bare `--flag` is an override with an empty value.
    #[test]
    fn test_bare_flag_has_empty_value() {
        let args = BootArgs::capture(argv(&["--debug"]));

        assert_eq!(args.override_of("debug"), Some(""));
    }

    /// `--` alone is an override with an empty key; it matches no known
    /// setting and stays visible in the raw vector.
    #[test]
    fn test_double_dash_alone() {
        let args = BootArgs::capture(argv(&["--", ""]));

        assert_eq!(args.raw(), argv(&["--", ""]).as_slice());
        assert_eq!(args.overrides(), &[(String::new(), String::new())]);
        assert_eq!(args.non_options(), argv(&[""]).as_slice());
    }

    #[test]
    fn test_non_options_are_collected_in_order() {
        let args = BootArgs::capture(argv(&["migrate", "--server.port=1", "seed"]));

        assert_eq!(args.non_options(), argv(&["migrate", "seed"]).as_slice());
    }

    /// When a key repeats, the last occurrence wins.
    #[test]
    fn test_last_override_wins() {
        let args = BootArgs::capture(argv(&["--server.port=7000", "--server.port=9090"]));

        assert_eq!(args.override_of("server.port"), Some("9090"));
        // Earlier occurrences are still visible in the ordered view.
        assert_eq!(args.overrides().len(), 2);
    }

    #[test]
    fn test_override_of_unknown_key() {
        let args = BootArgs::capture(argv(&["--server.port=9090"]));

        assert_eq!(args.override_of("server.host"), None);
    }
}
