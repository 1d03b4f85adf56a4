use std::path::Path;

use confique::Config as DeriveConfig;

#[derive(Debug, Clone, PartialEq, Eq, DeriveConfig)]
pub struct Config {
    /// Deepest object/array nesting a document may reach, whether built from a value or assembled
    /// with `append_child`. The default is the deepest nesting `serde_json` decodes, so anything
    /// built under it can be parsed back.
    #[config(default = 127)]
    pub max_depth: usize,

    /// Parse paths leniently: a malformed `[index]` ends index collection for that step and the
    /// rest of the step is ignored, instead of failing with `MalformedPath`. Only enable this for
    /// compatibility with existing path strings.
    #[config(default = false)]
    pub lenient_paths: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 127,
            lenient_paths: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file, filling unset keys with defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, confique::Error> {
        Config::builder().file(path.as_ref()).load()
    }
}
