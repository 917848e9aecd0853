use std::env;
use std::fmt::Debug;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("Env var {key} is not set")]
    Missing { key: &'static str },
    #[error("Failed to parse env var {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy)]
pub struct EnvVarSpec {
    pub key: &'static str,
    pub sensitive: bool,
}

#[derive(Clone, Copy)]
pub struct EnvVarValue<TVal> {
    pub spec: &'static EnvVarSpec,
    pub value: TVal,
}

impl EnvVarSpec {
    fn parse<TVal: FromStr>(&'static self, raw: String) -> Result<TVal, EnvError> {
        raw.trim().parse().map_err(|_e| EnvError::Invalid {
            key: self.key,
            // sensitive values stay masked in errors too
            value: if self.sensitive { "***".to_owned() } else { raw },
        })
    }

    pub fn default<TVal: FromStr>(&'static self, default: TVal) -> Result<EnvVarValue<TVal>, EnvError> {
        let as_optional = self.optional()?;
        Ok(EnvVarValue {
            spec: as_optional.spec,
            value: as_optional.value.unwrap_or(default),
        })
    }

    pub fn optional<TVal: FromStr>(&'static self) -> Result<EnvVarValue<Option<TVal>>, EnvError> {
        let value = match env::var(self.key) {
            Ok(val) if !val.trim().is_empty() => Some(self.parse(val)?),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Failed reading env var {}: {e:?}", self.key);
                None
            }
        };
        Ok(EnvVarValue { spec: self, value })
    }

    pub fn required<TVal: FromStr>(&'static self) -> Result<EnvVarValue<TVal>, EnvError> {
        let raw_value = env::var(self.key).map_err(|_e| EnvError::Missing { key: self.key })?;
        Ok(EnvVarValue {
            spec: self,
            value: self.parse(raw_value)?,
        })
    }
}

impl<TVal: Debug> Debug for EnvVarValue<TVal> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.spec.sensitive {
            f.write_str("***")
        } else {
            f.write_fmt(format_args!("{:?}", self.value))
        }
    }
}

pub const LOG_FORMAT: EnvVarSpec = EnvVarSpec {
    key: "LOG_FORMAT",
    sensitive: false,
};
pub const EXECUTION_LAYER_RPC: EnvVarSpec = EnvVarSpec {
    key: "EXECUTION_LAYER_RPC",
    sensitive: true,
};
pub const PRIVATE_KEY: EnvVarSpec = EnvVarSpec {
    key: "PRIVATE_KEY",
    sensitive: true,
};
pub const DEPLOYMENT_MANIFEST: EnvVarSpec = EnvVarSpec {
    key: "DEPLOYMENT_MANIFEST",
    sensitive: false,
};
pub const ABI_DIR: EnvVarSpec = EnvVarSpec {
    key: "ABI_DIR",
    sensitive: false,
};
pub const GAS_LIMIT: EnvVarSpec = EnvVarSpec {
    key: "GAS_LIMIT",
    sensitive: false,
};
pub const GAS_PRICE: EnvVarSpec = EnvVarSpec {
    key: "GAS_PRICE",
    sensitive: false,
};
pub const DEPLOYER: EnvVarSpec = EnvVarSpec {
    key: "DEPLOYER",
    sensitive: false,
};
pub const SHARES_IMAGE_DIR: EnvVarSpec = EnvVarSpec {
    key: "SHARES_IMAGE_DIR",
    sensitive: false,
};

pub const SERVICE_BIND_TO_ADDR: EnvVarSpec = EnvVarSpec {
    key: "SERVICE_BIND_TO_ADDR",
    sensitive: false,
};
pub const INTERNAL_SCHEDULER: EnvVarSpec = EnvVarSpec {
    key: "INTERNAL_SCHEDULER",
    sensitive: false,
};
pub const INTERNAL_SCHEDULER_CRON: EnvVarSpec = EnvVarSpec {
    key: "INTERNAL_SCHEDULER_CRON",
    sensitive: false,
};
pub const INTERNAL_SCHEDULER_TZ: EnvVarSpec = EnvVarSpec {
    key: "INTERNAL_SCHEDULER_TZ",
    sensitive: false,
};
pub const PROMETHEUS_NAMESPACE: EnvVarSpec = EnvVarSpec {
    key: "PROMETHEUS_NAMESPACE",
    sensitive: false,
};

pub const DEFAULT_MANIFEST: &str = "deployed-ace_mainnet.json";
pub const DEFAULT_ABI_DIR: &str = "lib/abi";
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
pub const DEFAULT_GAS_PRICE: u128 = 100_000;
pub const DEFAULT_SHARES_IMAGE_DIR: &str = "shares-image-logs";

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable; the process environment is shared between test threads.
    const TEST_NUMBER: EnvVarSpec = EnvVarSpec {
        key: "CATALIST_OPS_TEST_NUMBER",
        sensitive: false,
    };
    const TEST_SECRET: EnvVarSpec = EnvVarSpec {
        key: "CATALIST_OPS_TEST_SECRET",
        sensitive: true,
    };
    const TEST_UNSET: EnvVarSpec = EnvVarSpec {
        key: "CATALIST_OPS_TEST_UNSET",
        sensitive: false,
    };

    #[test]
    fn parses_and_defaults() {
        env::set_var(TEST_NUMBER.key, "42");
        assert_eq!(TEST_NUMBER.required::<u64>().unwrap().value, 42);
        assert_eq!(TEST_UNSET.default::<u64>(7).unwrap().value, 7);
        assert_eq!(TEST_UNSET.optional::<u64>().unwrap().value, None);
    }

    #[test]
    fn missing_required_is_an_error() {
        assert_eq!(
            TEST_UNSET.required::<String>().unwrap_err(),
            EnvError::Missing {
                key: "CATALIST_OPS_TEST_UNSET"
            }
        );
    }

    #[test]
    fn sensitive_values_are_masked() {
        env::set_var(TEST_SECRET.key, "not-a-number");
        let err = TEST_SECRET.required::<u64>().unwrap_err();
        assert_eq!(
            err,
            EnvError::Invalid {
                key: "CATALIST_OPS_TEST_SECRET",
                value: "***".to_owned()
            }
        );
        let value = EnvVarValue {
            spec: &TEST_SECRET,
            value: "secret",
        };
        assert_eq!(format!("{value:?}"), "***");
    }
}
