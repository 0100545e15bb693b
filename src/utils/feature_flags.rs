pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn is_truthy_any_env(keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| std::env::var(key).ok().map(is_truthy).unwrap_or(false))
}

/// Strict mode validates host/user/identity before spawning ssh.
pub fn is_strict_mode_enabled() -> bool {
    is_truthy_any_env(&["SSH_NODE_STRICT"])
}
