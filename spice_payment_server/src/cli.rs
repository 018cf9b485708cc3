use std::env;

/// The environment variables echoed by `--help`. Secrets (API keys, webhook secrets) are deliberately absent.
const PUBLIC_ENVS: [&str; 18] = [
    "RUST_LOG",
    "SPG_HOST",
    "SPG_PORT",
    "SPG_DATABASE_URL",
    "SPG_VERIFICATION_INTERVAL_MINUTES",
    "SPG_STALE_ORDER_HOURS",
    "SPG_MATCH_TOLERANCE_CENTS",
    "SPG_MIN_CONFIDENCE",
    "SPG_INFINITEPAY_WEBHOOK_AUTH",
    "SPG_INFINITEPAY_WEBHOOK_HEADER",
    "SPG_PAGSEGURO_WEBHOOK_AUTH",
    "SPG_PAGSEGURO_WEBHOOK_HEADER",
    "SPG_ASAAS_WEBHOOK_AUTH",
    "SPG_ASAAS_WEBHOOK_HEADER",
    "SPG_EMAIL_NOTIFY_URL",
    "SPG_WHATSAPP_NOTIFY_URL",
    "SPG_NOTIFY_MAX_ATTEMPTS",
    "SPG_NOTIFY_TIMEOUT_SECS",
];

/// The server takes no arguments. Passing any prints the help text and the current configuration instead, and the
/// caller should exit.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{}\n", include_str!("./cli-help.txt"));
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for (name, value) in public_env_values() {
        println!("  {name:<35} {value:<15}");
    }
    true
}

fn public_env_values() -> Vec<(&'static str, String)> {
    PUBLIC_ENVS
        .iter()
        .map(|&name| {
            let value = match env::var_os(name) {
                None => "Not set".to_string(),
                Some(v) => v.into_string().unwrap_or_else(|v| format!("Invalid value: {}", v.to_string_lossy())),
            };
            (name, value)
        })
        .collect()
}
