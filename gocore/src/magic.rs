/// Name of the module whose activation runs the entry function.
pub const DEFAULT_ENTRY_MODULE: &str = "main";

/// Name of the function invoked when the entry module is activated.
pub const DEFAULT_ENTRY_FUNCTION: &str = "main";

/// Methods with this name also become the representation hook of their receiver.
pub const DEFAULT_STRINGER_METHOD: &str = "String";

/// Name of the environment variable containing the path to the gocore configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/gocore/config.toml` or `$HOME/.config/gocore/config.toml`
///  (2) on Windows: `%APPDATA%\gocore\config.toml`
pub const ENV_CONFIG_PATH: &str = "GOCORE_CONFIG_PATH";
