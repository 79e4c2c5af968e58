// SPDX-License-Identifier: AGPL-3.0

//! Per-address and run-level results

use serde::Serialize;
use solmap_exceptions::SolmapResult;
use solmap_mapper::MapperResult;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exitcode {
    Mapped = 0,
    MappingFailed = 1,
    ConfigError = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
}

/// Outcome of mapping one address, as printed.
#[derive(Debug, Clone, Serialize)]
pub struct AddressReport {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MapperResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl AddressReport {
    pub fn new(address: &str, outcome: SolmapResult<MapperResult>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(err) => (
                None,
                Some(ErrorReport {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            ),
        };
        Self {
            address: address.to_string(),
            result,
            error,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.result.is_some()
    }

    /// `file:line:code`, or the failure with its kind.
    pub fn render(&self) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) => result.to_string(),
            (None, Some(error)) => format!("{}: {} [{}]", self.address, error.message, error.kind),
            (None, None) => format!("{}: not mapped", self.address),
        }
    }
}

/// Main execution result
#[derive(Debug, Clone, Default)]
pub struct MainResult {
    pub exitcode: i32,
    pub total_mapped: usize,
    pub total_failed: usize,
}

impl MainResult {
    pub fn record(&mut self, report: &AddressReport) {
        if report.is_mapped() {
            self.total_mapped += 1;
        } else {
            self.total_failed += 1;
        }
        self.exitcode = if self.has_failures() {
            Exitcode::MappingFailed as i32
        } else {
            Exitcode::Mapped as i32
        };
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmap_exceptions::MapperError;
    use solmap_mapper::SourceMap;

    fn mapped() -> AddressReport {
        let entry = SourceMap::parse("41:5:0:i").resolve(0).unwrap();
        AddressReport::new(
            "0x2",
            Ok(MapperResult {
                file: "src/A.sol".to_string(),
                code: "x = 1".to_string(),
                line: 3,
                pc: 2,
                instruction_index: 1,
                entry,
                reconstructed: false,
            }),
        )
    }

    fn failed() -> AddressReport {
        AddressReport::new("0x99", Err(MapperError::NoAssociatedSource { index: 7 }))
    }

    #[test]
    fn test_exitcode_values() {
        assert_eq!(Exitcode::Mapped as i32, 0);
        assert_eq!(Exitcode::MappingFailed as i32, 1);
        assert_eq!(Exitcode::ConfigError as i32, 2);
    }

    #[test]
    fn test_render() {
        assert_eq!(mapped().render(), "src/A.sol:3:x = 1");
        assert_eq!(
            failed().render(),
            "0x99: Instruction 7 has no associated source file (compiler-generated code) [no-associated-source]"
        );
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(mapped()).unwrap();
        assert_eq!(value["address"], "0x2");
        assert_eq!(value["result"]["line"], 3);
        assert!(value.get("error").is_none());

        let value = serde_json::to_value(failed()).unwrap();
        assert_eq!(value["error"]["kind"], "no-associated-source");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_main_result() {
        let mut result = MainResult::default();
        result.record(&mapped());
        assert_eq!(result.exitcode, 0);
        assert!(!result.has_failures());

        result.record(&failed());
        result.record(&mapped());
        assert_eq!(result.exitcode, 1);
        assert_eq!((result.total_mapped, result.total_failed), (2, 1));
    }
}
