pub fn about() -> Vec<String> {
    vec![
        "Starts and stops the game servers hosted on the home server and \
        shows who is playing on them.".to_string(),
        "\n".to_string(),
        "Each service is controlled through its /<service>/start, \
        /<service>/stop and /<service>/get_status endpoints.".to_string(),
        format!("Version: {}", env!("CARGO_PKG_VERSION")),
    ]
}
