/// What to do when key/value data or face data runs past the end of the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Keep going: drop the remaining key/value entries, zero-fill missing face bytes
    /// and report a [`crate::Warning`].
    #[default]
    Lenient,
    /// Abort the conversion with the matching [`crate::ConvertError`].
    Strict,
}

/// Key under which the spherical harmonics coefficients are stored.
pub const SPHERICAL_HARMONICS_KEY: &str = "sh";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    pub strictness: Strictness,
    /// Key/value entries carried into the KTX1 output. Everything else is dropped.
    pub retained_keys: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            strictness: Strictness::Lenient,
            retained_keys: vec![SPHERICAL_HARMONICS_KEY.to_string()],
        }
    }
}

impl ConvertOptions {
    pub fn strict() -> Self {
        ConvertOptions::default().with_strictness(Strictness::Strict)
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn retain_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.retained_keys.contains(&key) {
            self.retained_keys.push(key);
        }
        self
    }

    pub fn is_retained(&self, key: &str) -> bool {
        self.retained_keys.iter().any(|k| k == key)
    }
}
