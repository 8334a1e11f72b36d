use squeeze_core::{
    update, AppState, Config, Effect, Header, Msg, RedirectCapability, Statistics,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn fresh_state() -> AppState {
    let config = Config {
        proxy_url: "https://proxy.example/compress".to_string(),
        ..Config::default()
    };
    AppState::new(config, RedirectCapability::Immediate)
}

fn savings_headers() -> Vec<Header> {
    vec![
        Header::new("x-bytes-saved", "500"),
        Header::new("x-original-size", "1500"),
    ]
}

#[test]
fn uncached_response_with_both_headers_updates_counters() {
    init_logging();
    let (state, effects) = update(
        fresh_state(),
        Msg::ResponseCompleted {
            headers: savings_headers(),
            from_cache: false,
        },
    );

    let expected = Statistics {
        files_processed: 1,
        bytes_processed: 1500,
        bytes_saved: 500,
    };
    assert_eq!(state.config().statistics, expected);
    assert_eq!(effects, vec![Effect::PersistStatistics(expected)]);
}

#[test]
fn cached_response_is_not_double_counted() {
    init_logging();
    let (state, effects) = update(
        fresh_state(),
        Msg::ResponseCompleted {
            headers: savings_headers(),
            from_cache: true,
        },
    );

    assert_eq!(state.config().statistics, Statistics::default());
    assert!(effects.is_empty());
}

#[test]
fn missing_header_skips_the_update() {
    init_logging();
    let (state, effects) = update(
        fresh_state(),
        Msg::ResponseCompleted {
            headers: vec![Header::new("x-bytes-saved", "500")],
            from_cache: false,
        },
    );

    assert_eq!(state.config().statistics, Statistics::default());
    assert!(effects.is_empty());
}

#[test]
fn non_numeric_header_skips_the_update() {
    init_logging();
    let (state, effects) = update(
        fresh_state(),
        Msg::ResponseCompleted {
            headers: vec![
                Header::new("x-bytes-saved", "lots"),
                Header::new("x-original-size", "1500"),
            ],
            from_cache: false,
        },
    );

    assert_eq!(state.config().statistics, Statistics::default());
    assert!(effects.is_empty());
}

#[test]
fn counters_accumulate_across_responses() {
    init_logging();
    let completed = Msg::ResponseCompleted {
        headers: savings_headers(),
        from_cache: false,
    };

    let (state, _) = update(fresh_state(), completed.clone());
    let (state, _) = update(state, completed);

    assert_eq!(
        state.config().statistics,
        Statistics {
            files_processed: 2,
            bytes_processed: 3000,
            bytes_saved: 1000,
        }
    );
}
