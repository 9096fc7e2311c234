use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `RECORDSTORE_QUIET=1` silences the human-readable terminal lines
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("RECORDSTORE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
