// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Options for [crate::stage::BufferSave], as they arrive from a host and as the stage uses them.

Hosts and presets supply [BufferSaveOptions], which are plain strings.  They are parsed
once, into a [BufferSaveConfig], before anything about the stage changes.

```
use save_and_restore::stage::config::BufferSaveOptions;
use save_and_restore::stage::mode::Mode;
use save_and_restore::blend::BlendMode;

let options = BufferSaveOptions {
    action: "SAVERESTORE".to_string(),
    blend_mode: "additive".to_string(),
    ..Default::default()
};
let config = options.parse().unwrap();
assert_eq!(config.mode, Mode::SaveThenRestore);
assert_eq!(config.blend_mode, BlendMode::Additive);
assert_eq!(config.buffer_id.as_str(), "buffer1");
```
*/

use crate::blend::BlendMode;
use crate::buffers::BufferId;
use crate::stage::mode::Mode;

/**
Unparsed options, keyed the way presets spell them.
*/
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BufferSaveOptions {
    pub action: String,
    pub buffer_id: String,
    pub blend_mode: String,
}

impl Default for BufferSaveOptions {
    fn default() -> Self {
        BufferSaveOptions {
            action: Mode::default().name().to_string(),
            buffer_id: BufferId::DEFAULT.to_string(),
            blend_mode: BlendMode::default().name().to_string(),
        }
    }
}

impl BufferSaveOptions {
    /**
    Validates every option.

    The first invalid option is reported; nothing is partially applied.
    */
    pub fn parse(&self) -> Result<BufferSaveConfig, ConfigError> {
        Ok(BufferSaveConfig {
            mode: self.action.parse()?,
            buffer_id: BufferId::new(self.buffer_id.as_str())?,
            blend_mode: self.blend_mode.parse()?,
        })
    }
}

/**
Validated stage configuration.
*/
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferSaveConfig {
    pub mode: Mode,
    pub buffer_id: BufferId,
    pub blend_mode: BlendMode,
}

impl TryFrom<&BufferSaveOptions> for BufferSaveConfig {
    type Error = ConfigError;
    fn try_from(options: &BufferSaveOptions) -> Result<Self, Self::Error> {
        options.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Unknown action {value:?}; expected one of {}", Mode::valid_names())]
    UnknownAction { value: String },
    #[error("Unknown blend mode {value:?}; expected one of {}", BlendMode::valid_names())]
    UnknownBlendMode { value: String },
    #[error("Buffer id must not be empty")]
    EmptyBufferId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BufferSaveOptions::default().parse().unwrap();
        assert_eq!(config, BufferSaveConfig::default());
        assert_eq!(config.mode, Mode::Save);
        assert_eq!(config.blend_mode, BlendMode::Replace);
        assert_eq!(config.buffer_id.as_str(), "buffer1");
    }

    #[test]
    fn deserializes_preset_keys() {
        let options: BufferSaveOptions = serde_json::from_str(
            r#"{"action": "RESTORESAVE", "bufferId": "feedback", "blendMode": "ALPHA"}"#,
        )
        .unwrap();
        let config = options.parse().unwrap();
        assert_eq!(config.mode, Mode::RestoreThenSave);
        assert_eq!(config.buffer_id.as_str(), "feedback");
        assert_eq!(config.blend_mode, BlendMode::Alpha);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let options: BufferSaveOptions = serde_json::from_str(r#"{"action": "Restore"}"#).unwrap();
        assert_eq!(options.buffer_id, "buffer1");
        assert_eq!(options.blend_mode, "Replace");
    }

    #[test]
    fn invalid_options_are_rejected() {
        let bad_action = BufferSaveOptions {
            action: "FOO".to_string(),
            ..Default::default()
        };
        assert_eq!(
            bad_action.parse(),
            Err(ConfigError::UnknownAction {
                value: "FOO".to_string()
            })
        );

        let bad_blend = BufferSaveOptions {
            blend_mode: "Screen".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_blend.parse(),
            Err(ConfigError::UnknownBlendMode { .. })
        ));

        let empty_id = BufferSaveOptions {
            buffer_id: String::new(),
            ..Default::default()
        };
        assert_eq!(empty_id.parse(), Err(ConfigError::EmptyBufferId));
    }
}
