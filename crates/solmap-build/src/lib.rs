// SPDX-License-Identifier: AGPL-3.0

//! Compiler output loading
//!
//! Reads the JSON solc writes for `--standard-json` or `--combined-json` and
//! extracts what mapping needs for one contract: runtime bytecode, runtime
//! source map, the source-unit ASTs and, where available, the source texts.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use solmap_exceptions::LoadError;
use solmap_logs::{warn_code, ErrorCode};
use solmap_mapper::{SourceFile, SourceSet};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Layout of the `contracts` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `contracts.<file>.<name>.evm.deployedBytecode.{object,sourceMap}`
    StandardJson,
    /// `contracts["<file>:<name>"].{bin-runtime,srcmap-runtime}`
    CombinedJson,
}

/// Contract metadata. solc embeds it as a JSON string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub compiler: Compiler,
    /// Source files by path, in the compiler's (sorted) order.
    #[serde(default)]
    pub sources: IndexMap<String, MetadataSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compiler {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSource {
    /// Present when compiled with `useLiteralContent`.
    pub content: Option<String>,
}

impl Metadata {
    /// Parse metadata given either as a JSON string or an inline object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(text) => {
                serde_json::from_str(text).context("Failed to parse contract metadata string")
            }
            other => serde_json::from_value(other.clone()).context("Failed to parse contract metadata"),
        }
    }

    pub fn compiler_version(&self) -> Option<&str> {
        Some(self.compiler.version.as_str()).filter(|version| !version.is_empty())
    }
}

/// Everything needed to map addresses of one contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// Key of the contract in the `contracts` object.
    pub key: String,
    pub name: String,
    /// Runtime bytecode as hex.
    pub bytecode: String,
    /// Runtime source map.
    pub source_map: String,
    pub compiler_version: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Parsed solc JSON output.
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    format: OutputFormat,
    contracts: Map<String, JsonValue>,
    sources: Map<String, JsonValue>,
    source_list: Vec<String>,
    version: Option<String>,
}

impl CompilerOutput {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read compiler output: {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to load compiler output: {}", path.display()))
    }

    pub fn from_json(json: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut root) = json else {
            return Err(LoadError::UnknownFormat("top level is not an object".to_string()).into());
        };

        let contracts = match root.remove("contracts") {
            Some(JsonValue::Object(contracts)) if !contracts.is_empty() => contracts,
            Some(JsonValue::Object(_)) => {
                return Err(LoadError::UnknownFormat("contracts object is empty".to_string()).into())
            }
            _ => {
                return Err(
                    LoadError::UnknownFormat("missing contracts object".to_string()).into(),
                )
            }
        };

        let combined = root.contains_key("sourceList")
            || contracts.values().any(|contract| {
                contract.get("bin-runtime").is_some() || contract.get("srcmap-runtime").is_some()
            });
        let format = if combined {
            OutputFormat::CombinedJson
        } else {
            OutputFormat::StandardJson
        };

        let sources = match root.remove("sources") {
            Some(JsonValue::Object(sources)) => sources,
            _ => Map::new(),
        };
        let source_list = root
            .get("sourceList")
            .and_then(JsonValue::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|path| path.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let version = root
            .get("version")
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        debug!(
            "loaded {:?} compiler output with {} contract entries and {} sources",
            format,
            contracts.len(),
            sources.len()
        );

        Ok(Self {
            format,
            contracts,
            sources,
            source_list,
            version,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Keys of the `contracts` object: file paths, or `file:Name` for combined JSON.
    pub fn contract_keys(&self) -> Vec<&str> {
        self.contracts.keys().map(String::as_str).collect()
    }

    /// Find the single contract key matching `name`.
    ///
    /// A key matches when `name` occurs at its start or right after a path
    /// separator, ignoring case.
    pub fn contract_key_for_name(&self, name: &str) -> Result<String> {
        let pattern = format!(r"(^|[\\/]){}.*", regex::escape(name));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid contract name pattern: {}", pattern))?;

        let mut candidates: Vec<String> = self
            .contracts
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();

        if candidates.len() > 1 {
            return Err(LoadError::AmbiguousContract {
                name: name.to_string(),
                candidates,
            }
            .into());
        }

        let Some(key) = candidates.pop() else {
            return Err(LoadError::ContractNotFound {
                name: name.to_string(),
                available: self.contracts.keys().cloned().collect(),
            }
            .into());
        };

        if key == name {
            warn_code(
                ErrorCode::ContractNameIsFileName,
                "contract file name is equal to contract name, likely the Solidity file name was used as contract name",
                false,
            );
        }
        Ok(key)
    }

    /// Load the runtime artifact of contract `name`.
    pub fn artifact(&self, name: &str) -> Result<ContractArtifact> {
        let key = self.contract_key_for_name(name)?;
        let Some(entry) = self.contracts.get(&key) else {
            return Err(LoadError::ContractNotFound {
                name: name.to_string(),
                available: self.contracts.keys().cloned().collect(),
            }
            .into());
        };

        let empty = Map::new();
        let (contract_name, contract, bytecode_path, source_map_path) = match self.format {
            OutputFormat::StandardJson => {
                let contracts = entry.as_object().unwrap_or(&empty);
                let contract_name = select_contract(contracts, name, &key)?;
                (
                    contract_name.to_string(),
                    &contracts[contract_name],
                    "/evm/deployedBytecode/object",
                    "/evm/deployedBytecode/sourceMap",
                )
            }
            OutputFormat::CombinedJson => (
                key.rsplit(':').next().unwrap_or(&key).to_string(),
                entry,
                "/bin-runtime",
                "/srcmap-runtime",
            ),
        };

        let string_at = |pointer: &str, field: &'static str| -> Result<String> {
            contract
                .pointer(pointer)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    LoadError::MissingArtifactField {
                        key: key.clone(),
                        field,
                    }
                    .into()
                })
        };
        let bytecode = string_at(bytecode_path, "runtime bytecode")?;
        let source_map = string_at(source_map_path, "runtime source map")?;

        // broken metadata only loses the embedded source texts
        let metadata = match contract.get("metadata").map(Metadata::from_json).transpose() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn_code(
                    ErrorCode::ParsingError,
                    &format!("ignoring metadata of {}: {:#}", key, err),
                    false,
                );
                None
            }
        };

        let compiler_version = metadata
            .as_ref()
            .and_then(Metadata::compiler_version)
            .map(str::to_string)
            .or_else(|| self.version.clone());

        info!(
            "loaded {} from {}: {} hex digits of runtime bytecode",
            contract_name,
            key,
            bytecode.len()
        );

        Ok(ContractArtifact {
            key,
            name: contract_name,
            bytecode,
            source_map,
            compiler_version,
            metadata,
        })
    }

    /// Source files by id for `artifact`.
    ///
    /// Content comes from the metadata when embedded, else from
    /// `sources_dir`, else stays `None`.
    pub fn source_set(&self, artifact: &ContractArtifact, sources_dir: Option<&Path>) -> SourceSet {
        let metadata = artifact.metadata.as_ref();
        let mut set = SourceSet::new();

        for (id, path) in self.source_ids(metadata) {
            let content = metadata
                .and_then(|metadata| metadata.sources.get(&path))
                .and_then(|source| source.content.clone())
                .or_else(|| sources_dir.and_then(|dir| read_source(dir, &path)));

            if content.is_none() {
                debug!("no source text for file {} ({})", id, path);
            }
            set.insert(id, SourceFile::new(path, content));
        }
        set
    }

    /// `(id, path)` of every source file.
    fn source_ids(&self, metadata: Option<&Metadata>) -> Vec<(i64, String)> {
        let metadata_position = |path: &str| {
            metadata
                .and_then(|metadata| metadata.sources.get_index_of(path))
                .map(|position| position as i64)
        };
        let list_position = |path: &str| {
            self.source_list
                .iter()
                .position(|listed| listed == path)
                .map(|position| position as i64)
        };

        if !self.sources.is_empty() {
            return self
                .sources
                .iter()
                .enumerate()
                .map(|(position, (path, info))| {
                    let id = info
                        .get("id")
                        .and_then(JsonValue::as_i64)
                        .or_else(|| list_position(path))
                        .or_else(|| metadata_position(path))
                        .unwrap_or(position as i64);
                    (id, path.clone())
                })
                .collect();
        }

        if !self.source_list.is_empty() {
            return self
                .source_list
                .iter()
                .enumerate()
                .map(|(id, path)| (id as i64, path.clone()))
                .collect();
        }

        metadata
            .map(|metadata| {
                metadata
                    .sources
                    .keys()
                    .enumerate()
                    .map(|(id, path)| (id as i64, path.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All source-unit ASTs as one JSON array.
    pub fn ast_forest(&self) -> JsonValue {
        JsonValue::Array(
            self.sources
                .values()
                .filter_map(|source| source.get("ast").or_else(|| source.get("AST")))
                .cloned()
                .collect(),
        )
    }
}

impl FromStr for CompilerOutput {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let json: JsonValue =
            serde_json::from_str(text).context("Compiler output is not valid JSON")?;
        Self::from_json(json)
    }
}

/// Pick the contract of a standard-JSON file entry.
///
/// Tries `name` itself, then its file stem (`Bar.sol` -> `Bar`), then the only
/// contract of the file.
fn select_contract<'a>(
    contracts: &'a Map<String, JsonValue>,
    name: &str,
    key: &str,
) -> Result<&'a str, LoadError> {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);

    if let Some(found) = contracts
        .keys()
        .find(|contract| *contract == name)
        .or_else(|| contracts.keys().find(|contract| *contract == stem))
    {
        return Ok(found);
    }

    let mut names = contracts.keys();
    if let (Some(only), None) = (names.next(), names.next()) {
        return Ok(only);
    }

    Err(LoadError::ContractNotFound {
        name: name.to_string(),
        available: contracts
            .keys()
            .map(|contract| format!("{}:{}", key, contract))
            .collect(),
    })
}

/// Read `path` below `dir`, falling back to its bare file name.
fn read_source(dir: &Path, path: &str) -> Option<String> {
    let mut candidates = vec![dir.join(path)];
    if let Some(file_name) = Path::new(path).file_name() {
        candidates.push(dir.join(file_name));
    }

    let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) else {
        warn_code(
            ErrorCode::MissingSourceText,
            &format!("{} not found in {}", path, dir.display()),
            false,
        );
        return None;
    };

    read_text_lossy(found)
}

/// Read a file as UTF-8, decoding invalid sequences lossily.
pub fn read_text_lossy(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn_code(
                ErrorCode::MissingSourceText,
                &format!("could not read {}: {}", path.display(), err),
                false,
            );
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(err) => {
            warn_code(
                ErrorCode::SourceEncoding,
                &format!(
                    "{} is not valid UTF-8, invalid sequences were replaced",
                    path.display()
                ),
                false,
            );
            Some(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// `(major, minor, patch)` of a version like `0.8.19+commit.7dd6d404`.
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let core = version
        .trim()
        .trim_start_matches('v')
        .split(['+', '-'])
        .next()?;
    let mut parts = core.split('.').map(|part| part.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next()??;
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Whether `version` is at least `minimum`; warns when it is older.
///
/// Unparsable versions are assumed to be supported.
pub fn check_compiler_version(version: &str, minimum: &str) -> bool {
    match (parse_version(version), parse_version(minimum)) {
        (Some(found), Some(required)) if found < required => {
            warn_code(
                ErrorCode::UntestedCompilerVersion,
                &format!(
                    "The contract has been compiled using compiler version {}. The mapper has not been tested with versions below {}",
                    version, minimum
                ),
                false,
            );
            false
        }
        (None, _) => {
            debug!("could not parse compiler version {:?}", version);
            true
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(version: &str, content: Option<&str>) -> String {
        let mut source = json!({"keccak256": "0x00"});
        if let Some(content) = content {
            source["content"] = json!(content);
        }
        json!({
            "compiler": {"version": version},
            "language": "Solidity",
            "sources": {"contracts/Bar.sol": source, "contracts/lib/Math.sol": {"keccak256": "0x01"}}
        })
        .to_string()
    }

    fn standard_output() -> JsonValue {
        json!({
            "contracts": {
                "contracts/Bar.sol": {
                    "Bar": {
                        "metadata": metadata("0.8.19+commit.7dd6d404", Some("contract Bar {}")),
                        "evm": {"deployedBytecode": {"object": "6080604052", "sourceMap": "0:15:0;;"}}
                    }
                },
                "contracts/lib/Math.sol": {
                    "Math": {"evm": {"deployedBytecode": {"object": "00", "sourceMap": "0:1:1"}}},
                    "MathHelper": {"evm": {"deployedBytecode": {"object": "00"}}}
                }
            },
            "sources": {
                "contracts/Bar.sol": {"id": 0, "ast": {"nodeType": "SourceUnit", "src": "0:15:0"}},
                "contracts/lib/Math.sol": {"id": 1, "ast": {"nodeType": "SourceUnit", "src": "0:40:1"}}
            }
        })
    }

    fn combined_output() -> JsonValue {
        json!({
            "contracts": {
                "contracts/Bar.sol:Bar": {"bin-runtime": "6080604052", "srcmap-runtime": "0:15:0;;"},
                "contracts/Bar.sol:Helper": {"bin-runtime": "00", "srcmap-runtime": "16:5:0"}
            },
            "sourceList": ["contracts/Bar.sol"],
            "sources": {"contracts/Bar.sol": {"AST": {"nodeType": "SourceUnit", "src": "0:21:0"}}},
            "version": "0.4.26+commit.4563c3fc"
        })
    }

    #[test]
    fn test_detects_format() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        assert_eq!(output.format(), OutputFormat::StandardJson);

        let output = CompilerOutput::from_json(combined_output()).unwrap();
        assert_eq!(output.format(), OutputFormat::CombinedJson);
    }

    #[test]
    fn test_rejects_unknown_layout() {
        for json in [json!([]), json!({"sources": {}}), json!({"contracts": {}})] {
            let err = CompilerOutput::from_json(json).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<LoadError>(),
                Some(LoadError::UnknownFormat(_))
            ));
        }
        assert!("not json".parse::<CompilerOutput>().is_err());
    }

    #[test]
    fn test_contract_key_for_name() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        assert_eq!(output.contract_key_for_name("Bar").unwrap(), "contracts/Bar.sol");
        assert_eq!(output.contract_key_for_name("bar").unwrap(), "contracts/Bar.sol");
        assert_eq!(
            output.contract_key_for_name("math.sol").unwrap(),
            "contracts/lib/Math.sol"
        );

        // "ar" does not start a path component
        let err = output.contract_key_for_name("ar").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::ContractNotFound { .. })
        ));
    }

    #[test]
    fn test_ambiguous_contract_name() {
        let output = CompilerOutput::from_json(combined_output()).unwrap();
        let err = output.contract_key_for_name("Bar").unwrap_err();
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::AmbiguousContract { candidates, .. }) => {
                assert_eq!(candidates.len(), 2)
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(
            output.contract_key_for_name("Bar.sol:Helper").unwrap(),
            "contracts/Bar.sol:Helper"
        );
    }

    #[test]
    fn test_standard_artifact() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        let artifact = output.artifact("Bar").unwrap();
        assert_eq!(artifact.key, "contracts/Bar.sol");
        assert_eq!(artifact.name, "Bar");
        assert_eq!(artifact.bytecode, "6080604052");
        assert_eq!(artifact.source_map, "0:15:0;;");
        assert_eq!(
            artifact.compiler_version.as_deref(),
            Some("0.8.19+commit.7dd6d404")
        );
    }

    #[test]
    fn test_file_name_selects_contract() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        assert_eq!(output.artifact("Bar.sol").unwrap().name, "Bar");

        // two contracts in Math.sol, one named like the file
        let artifact = output.artifact("Math.sol").unwrap();
        assert_eq!(artifact.name, "Math");
    }

    #[test]
    fn test_missing_source_map() {
        let mut json = standard_output();
        json["contracts"]["contracts/lib/Math.sol"]
            .as_object_mut()
            .unwrap()
            .remove("Math");
        let output = CompilerOutput::from_json(json).unwrap();
        let err = output.artifact("Math.sol").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingArtifactField {
                field: "runtime source map",
                ..
            })
        ));
    }

    #[test]
    fn test_broken_metadata_is_ignored() {
        let mut json = standard_output();
        json["contracts"]["contracts/Bar.sol"]["Bar"]["metadata"] = json!("{broken");
        let output = CompilerOutput::from_json(json).unwrap();
        let artifact = output.artifact("Bar").unwrap();
        assert!(artifact.metadata.is_none());
        assert_eq!(artifact.compiler_version, None);
    }

    #[test]
    fn test_combined_artifact() {
        let output = CompilerOutput::from_json(combined_output()).unwrap();
        let artifact = output.artifact("Bar.sol:Bar").unwrap();
        assert_eq!(artifact.name, "Bar");
        assert_eq!(artifact.source_map, "0:15:0;;");
        assert_eq!(
            artifact.compiler_version.as_deref(),
            Some("0.4.26+commit.4563c3fc")
        );
        assert!(artifact.metadata.is_none());
    }

    #[test]
    fn test_source_set_from_metadata() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        let artifact = output.artifact("Bar").unwrap();
        let sources = output.source_set(&artifact, None);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources.path(0), Some("contracts/Bar.sol"));
        assert_eq!(sources.content(0), Some("contract Bar {}"));
        assert_eq!(sources.path(1), Some("contracts/lib/Math.sol"));
        assert_eq!(sources.content(1), None);
    }

    #[test]
    fn test_source_ids_fall_back_to_source_list() {
        let output = CompilerOutput::from_json(combined_output()).unwrap();
        let artifact = output.artifact("Bar.sol:Bar").unwrap();
        let sources = output.source_set(&artifact, None);
        assert_eq!(sources.path(0), Some("contracts/Bar.sol"));
    }

    #[test]
    fn test_ast_forest() {
        let output = CompilerOutput::from_json(standard_output()).unwrap();
        let forest = output.ast_forest();
        assert_eq!(forest.as_array().map(Vec::len), Some(2));
        assert_eq!(forest[1]["src"], "0:40:1");

        let output = CompilerOutput::from_json(combined_output()).unwrap();
        assert_eq!(output.ast_forest()[0]["nodeType"], "SourceUnit");
    }

    #[test]
    fn test_metadata_accepts_string_and_object() {
        let from_string = Metadata::from_json(&json!(metadata("0.6.12", None))).unwrap();
        assert_eq!(from_string.compiler_version(), Some("0.6.12"));
        assert_eq!(
            from_string.sources.keys().collect::<Vec<_>>(),
            vec!["contracts/Bar.sol", "contracts/lib/Math.sol"]
        );

        let from_object = Metadata::from_json(&json!({"compiler": {"version": ""}})).unwrap();
        assert_eq!(from_object.compiler_version(), None);

        assert!(Metadata::from_json(&json!("{not json")).is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("0.8.19+commit.7dd6d404"), Some((0, 8, 19)));
        assert_eq!(parse_version("v0.5.17"), Some((0, 5, 17)));
        assert_eq!(parse_version("0.7"), Some((0, 7, 0)));
        assert_eq!(parse_version("0.8.0-nightly.2021.1.1"), Some((0, 8, 0)));
        assert_eq!(parse_version("unknown"), None);
    }

    #[test]
    fn test_check_compiler_version() {
        use solmap_config::DEFAULT_MIN_COMPILER_VERSION;

        assert!(check_compiler_version("0.8.19+commit.7dd6d404", DEFAULT_MIN_COMPILER_VERSION));
        assert!(check_compiler_version("0.5.17", DEFAULT_MIN_COMPILER_VERSION));
        // compared numerically, not as strings
        assert!(check_compiler_version("0.10.0", DEFAULT_MIN_COMPILER_VERSION));
        assert!(!check_compiler_version("0.4.26", DEFAULT_MIN_COMPILER_VERSION));
        assert!(check_compiler_version("garbage", DEFAULT_MIN_COMPILER_VERSION));
    }
}
